use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParameterError>;

#[derive(Error, Debug)]
pub enum ParameterError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid parameter path: {0}")]
    InvalidPath(String),

    #[error("Parameter not found: {0}")]
    NotFound(String),
}
