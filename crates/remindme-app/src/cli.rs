//! CLI argument definitions for the remindme binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use remindme_core::config::{expand_home, RemindmeConfig};
use remindme_core::error::RemindmeError;

/// remindme: timed reminders for URLs and notes, with desktop notifications.
#[derive(Parser, Debug)]
#[command(name = "remindme", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Data directory holding the reminder database.
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the background process, reading JSON requests from stdin (default).
    Serve,
    /// Print upcoming and past reminders.
    List,
    /// Apply a single JSON request and print the response.
    Send {
        /// Request, e.g. '{"action":"setReminder","url":"example.com","time":1767225600000}'.
        request: String,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > REMINDME_CONFIG env var > ~/.remindme/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("REMINDME_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory.
    ///
    /// Priority: --data-dir flag > config file value.
    pub fn resolve_data_dir(&self, config: &RemindmeConfig) -> PathBuf {
        match self.data_dir {
            Some(ref p) => expand_home(&p.to_string_lossy()),
            None => config.general.resolved_data_dir(),
        }
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config: &RemindmeConfig) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config.general.log_level.clone())
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

/// Load the config file before logging is up.
///
/// A missing file means defaults. Any other failure also yields defaults,
/// and the error is handed back so it can be logged once tracing is ready.
pub fn load_config(path: &Path) -> (RemindmeConfig, Option<RemindmeError>) {
    if !path.exists() {
        return (RemindmeConfig::default(), None);
    }
    match RemindmeConfig::load(path) {
        Ok(config) => (config, None),
        Err(e) => (RemindmeConfig::default(), Some(e)),
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".remindme").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".remindme").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let args = CliArgs::try_parse_from(["remindme"]).unwrap();
        assert_eq!(args.command(), Command::Serve);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args =
            CliArgs::try_parse_from(["remindme", "list", "--data-dir", "/tmp/r", "-l", "debug"])
                .unwrap();
        assert_eq!(args.command(), Command::List);
        let config = RemindmeConfig::default();
        assert_eq!(args.resolve_data_dir(&config), PathBuf::from("/tmp/r"));
        assert_eq!(args.resolve_log_level(&config), "debug");
    }

    #[test]
    fn test_send_takes_request() {
        let args = CliArgs::try_parse_from(["remindme", "send", r#"{"action":"nuke"}"#]).unwrap();
        assert_eq!(
            args.command(),
            Command::Send {
                request: r#"{"action":"nuke"}"#.to_string()
            }
        );
    }

    #[test]
    fn test_config_flag_wins() {
        let args = CliArgs::try_parse_from(["remindme", "-c", "/etc/remindme.toml"]).unwrap();
        assert_eq!(
            args.resolve_config_path(),
            PathBuf::from("/etc/remindme.toml")
        );
    }

    #[test]
    fn test_load_config_missing_file_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let (config, err) = load_config(&dir.path().join("absent.toml"));
        assert!(err.is_none());
        assert_eq!(config.general.log_level, RemindmeConfig::default().general.log_level);
    }

    #[test]
    fn test_load_config_reports_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general\nlog_level = ").unwrap();

        let (config, err) = load_config(&path);

        assert!(err.is_some());
        assert_eq!(config.general.log_level, RemindmeConfig::default().general.log_level);
    }

    #[test]
    fn test_load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut written = RemindmeConfig::default();
        written.general.log_level = "trace".to_string();
        written.save(&path).unwrap();

        let (config, err) = load_config(&path);

        assert!(err.is_none());
        assert_eq!(config.general.log_level, "trace");
    }

    #[test]
    fn test_log_level_falls_back_to_config() {
        let args = CliArgs::try_parse_from(["remindme"]).unwrap();
        let mut config = RemindmeConfig::default();
        config.general.log_level = "warn".to_string();
        assert_eq!(args.resolve_log_level(&config), "warn");
    }
}
