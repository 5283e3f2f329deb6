use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuicktransError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QuicktransError {
    pub fn validation(message: impl Into<String>) -> Self {
        QuicktransError::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, QuicktransError>;
