use thiserror::Error;

/// Top-level error type for remindme.
///
/// Subsystem crates define their own error types and convert into or out of
/// `RemindmeError` so that `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemindmeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Reminder not found: {0}")]
    NotFound(String),
}

impl From<toml::de::Error> for RemindmeError {
    fn from(err: toml::de::Error) -> Self {
        RemindmeError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for RemindmeError {
    fn from(err: toml::ser::Error) -> Self {
        RemindmeError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for RemindmeError {
    fn from(err: serde_json::Error) -> Self {
        RemindmeError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for remindme operations.
pub type Result<T> = std::result::Result<T, RemindmeError>;
