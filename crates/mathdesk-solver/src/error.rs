use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("Could not parse expression: {0}")]
    Parse(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Undefined result: {0}")]
    Undefined(String),

    #[error("Unsupported problem: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, SolveError>;
