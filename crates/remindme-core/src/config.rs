use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{RemindmeError, Result};
use crate::zone::Zone;

/// Top-level configuration for remindme.
///
/// Loaded from `~/.remindme/config.toml` by default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemindmeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub reminders: ReminderConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl RemindmeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RemindmeConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| RemindmeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the reminder database. `~/` expands to the home directory.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.remindme".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl GeneralConfig {
    /// `data_dir` with a leading `~/` expanded.
    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_home(&self.data_dir)
    }
}

/// Reminder lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// IANA zone for repeat arithmetic and notification times. Empty = host zone.
    pub timezone: String,
    /// Reject set/update requests whose time is not in the future.
    pub require_future_time: bool,
    /// Show the aggregate notification after the startup catch-up pass.
    pub notify_missed: bool,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            timezone: String::new(),
            require_future_time: false,
            notify_missed: true,
        }
    }
}

impl ReminderConfig {
    pub fn zone(&self) -> Result<Zone> {
        Zone::parse(&self.timezone)
    }
}

/// Notification presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Prefix of every notification title.
    pub title_prefix: String,
    /// Icon path handed to the notifier.
    pub icon: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title_prefix: "[remindme]".to_string(),
            icon: "icon48.png".to_string(),
        }
    }
}

/// Expand a leading `~/` (or `~\`) to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(path)
    }
}
