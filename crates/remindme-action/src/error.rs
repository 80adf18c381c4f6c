//! Error types for the reminder engine.

use remindme_core::error::RemindmeError;

/// Errors surfaced by command and event handlers.
///
/// Display strings double as the `message` of an error response.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    Validation(String),
    #[error("Reminder not found")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Background process stopped")]
    Unavailable,
}

impl From<RemindmeError> for CommandError {
    fn from(err: RemindmeError) -> Self {
        match err {
            RemindmeError::NotFound(hash) => CommandError::NotFound(hash),
            RemindmeError::Validation(msg) => CommandError::Validation(msg),
            other => CommandError::Storage(other.to_string()),
        }
    }
}

/// Errors from the alarm scheduler.
#[derive(Debug, thiserror::Error)]
pub enum AlarmError {
    #[error("Alarm scheduling failed: {0}")]
    Failed(String),
}

/// Errors from notification display or URL opening.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification failed: {0}")]
    Failed(String),
    #[error("Unsupported URL scheme. Only http:// and https:// are allowed, got: {0}")]
    UnsupportedScheme(String),
}
