//! Notification and URL-opening collaborators.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use remindme_core::url::is_openable;

use crate::error::NotifyError;

/// A desktop notification as handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Reminder hash, or a fixed id for aggregate notifications.
    pub id: String,
    pub title: String,
    pub message: String,
    pub icon: String,
}

/// Host notification capability.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Dismiss a shown notification. Unknown ids are ignored.
    async fn clear(&self, id: &str) -> Result<(), NotifyError>;
}

/// Host capability to open a URL in a new tab or browser window.
#[async_trait]
pub trait TabOpener: Send + Sync {
    async fn open(&self, url: &str) -> Result<(), NotifyError>;
}

/// Notifier that writes notifications to the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn show(&self, notification: &Notification) -> Result<(), NotifyError> {
        if notification.title.is_empty() {
            return Err(NotifyError::Failed(
                "Notification title must not be empty".to_string(),
            ));
        }
        tracing::info!(
            id = %notification.id,
            title = %notification.title,
            message = %notification.message,
            "Notification shown"
        );
        Ok(())
    }

    async fn clear(&self, id: &str) -> Result<(), NotifyError> {
        tracing::debug!(id = %id, "Notification cleared");
        Ok(())
    }
}

/// Opener that validates the scheme and logs the URL.
///
/// Only `http://` and `https://` are accepted.
pub struct LogTabOpener;

#[async_trait]
impl TabOpener for LogTabOpener {
    async fn open(&self, url: &str) -> Result<(), NotifyError> {
        if !is_openable(url) {
            return Err(NotifyError::UnsupportedScheme(url.to_string()));
        }
        tracing::info!(url = %url, "Opened URL");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(title: &str) -> Notification {
        Notification {
            id: "h".to_string(),
            title: title.to_string(),
            message: "body".to_string(),
            icon: "icon48.png".to_string(),
        }
    }

    #[tokio::test]
    async fn test_log_notifier_shows() {
        assert!(LogNotifier.show(&notification("[remindme]")).await.is_ok());
        assert!(LogNotifier.clear("h").await.is_ok());
    }

    #[tokio::test]
    async fn test_log_notifier_rejects_empty_title() {
        let err = LogNotifier.show(&notification("")).await.unwrap_err();
        assert!(matches!(err, NotifyError::Failed(_)));
    }

    #[tokio::test]
    async fn test_tab_opener_accepts_http_schemes() {
        assert!(LogTabOpener.open("https://example.com").await.is_ok());
        assert!(LogTabOpener.open("http://example.com/path?q=1").await.is_ok());
    }

    #[tokio::test]
    async fn test_tab_opener_rejects_other_schemes() {
        for url in ["javascript:alert(1)", "file:///etc/passwd", "ftp://x.io", ""] {
            let err = LogTabOpener.open(url).await.unwrap_err();
            assert!(matches!(err, NotifyError::UnsupportedScheme(_)));
        }
    }
}
