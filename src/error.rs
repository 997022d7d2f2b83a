use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Hardware init error: {0}")]
    HardwareInit(String),

    #[error("Hardware write error: {0}")]
    HardwareWrite(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, AppError>;
