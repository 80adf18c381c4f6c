//! Database schema migrations.
//!
//! Applies the key-value schema and the schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use remindme_core::error::RemindmeError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), RemindmeError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| RemindmeError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| RemindmeError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: kv_store");
    }

    Ok(())
}

/// Version 1: one row per persisted key, value is a JSON document.
fn apply_v1(conn: &Connection) -> Result<(), RemindmeError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS kv_store (
            key         TEXT PRIMARY KEY NOT NULL,
            value       TEXT NOT NULL,
            updated_at  INTEGER NOT NULL
        );

        INSERT INTO schema_migrations (version, name) VALUES (1, 'kv_store');
        ",
    )
    .map_err(|e| RemindmeError::Storage(format!("Migration v1 failed: {}", e)))?;
    Ok(())
}

/// Current schema version recorded in the database.
pub fn schema_version(conn: &Connection) -> Result<i64, RemindmeError> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )
    .map_err(|e| RemindmeError::Storage(format!("Failed to query migration version: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_create_kv_table() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(schema_version(&conn).unwrap(), 1);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
