use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractError>;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parser setup failed: {0}")]
    ParserSetup(String),

    #[error("Syntax error in {0}")]
    Syntax(String),

    #[error("No variable class in {0}")]
    NoVariableClass(String),

    #[error("Cannot derive an identity from file name: {0}")]
    InvalidFileName(String),

    #[error("Corpus directory not found: {0}")]
    CorpusNotFound(String),
}
