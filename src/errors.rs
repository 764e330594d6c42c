use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("STORAGE_FAILURE: {0}")]
    Storage(String),
    #[error("SERIALIZATION: {0}")]
    Serialization(String),
    #[error("IO_FAILURE: {0}")]
    Io(String),
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),
    #[error("CONFIG_INVALID: {0}")]
    Config(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
