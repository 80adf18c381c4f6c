//! SQLite-backed key-value persistence.
//!
//! Wraps a single rusqlite Connection in a Mutex for thread-safe access.
//! Configures WAL mode on initialization and runs migrations.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use remindme_core::error::RemindmeError;
use remindme_core::types::Timestamp;

use crate::backend::KeyValueBackend;
use crate::migrations;

/// Thread-safe SQLite database wrapper.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database at the given path.
    pub fn new(path: &Path) -> Result<Self, RemindmeError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| RemindmeError::Storage(format!("Failed to open database: {}", e)))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| RemindmeError::Storage(format!("Failed to set pragmas: {}", e)))?;

        info!("Database opened at {}", path.display());

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, RemindmeError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RemindmeError::Storage(format!("Failed to open in-memory db: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Execute a closure with a reference to the underlying connection.
    ///
    /// The mutex is held for the duration of the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, RemindmeError>
    where
        F: FnOnce(&Connection) -> Result<T, RemindmeError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RemindmeError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

impl KeyValueBackend for Database {
    fn get(&self, key: &str) -> Result<Option<String>, RemindmeError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| RemindmeError::Storage(format!("Failed to read '{}': {}", key, e)))
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), RemindmeError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                updated_at = excluded.updated_at",
                params![key, value, Timestamp::now().0],
            )
            .map_err(|e| RemindmeError::Storage(format!("Failed to write '{}': {}", key, e)))?;
            Ok(())
        })
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_get_missing_key() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.get("reminders").unwrap(), None);
    }

    #[test]
    fn test_set_then_get() {
        let db = Database::in_memory().unwrap();
        db.set("reminders", r#"{"url-reminders":{}}"#).unwrap();
        assert_eq!(
            db.get("reminders").unwrap().as_deref(),
            Some(r#"{"url-reminders":{}}"#)
        );
    }

    #[test]
    fn test_set_upserts_single_row() {
        let db = Database::in_memory().unwrap();
        db.set("k", "1").unwrap();
        db.set("k", "2").unwrap();
        assert_eq!(db.get("k").unwrap().as_deref(), Some("2"));
        let rows: i64 = db
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
                    .map_err(|e| RemindmeError::Storage(e.to_string()))
            })
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_file_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("remindme.db");
        {
            let db = Database::new(&path).unwrap();
            db.set("sectionStates", r#"{"activeTab":"notes","subTab":"pastNote"}"#)
                .unwrap();
        }
        assert!(path.exists());
        let db = Database::new(&path).unwrap();
        assert_eq!(
            db.get("sectionStates").unwrap().as_deref(),
            Some(r#"{"activeTab":"notes","subTab":"pastNote"}"#)
        );
    }

    #[test]
    fn test_wal_mode_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("wal.db")).unwrap();
        let mode: String = db
            .with_conn(|conn| {
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
                    .map_err(|e| RemindmeError::Storage(e.to_string()))
            })
            .unwrap();
        assert_eq!(mode, "wal");
    }
}
