use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Unknown root variable: {0}")]
    UnknownRoot(String),

    #[error("Invalid graph configuration: {0}")]
    InvalidConfig(String),
}
