//! SQLite Key-Value Storage
//!
//! Information Hiding:
//! - Connection handling and SQL statements hidden from users
//! - One logical table per store, rows keyed by record id
//! - Schema created on open

use super::KeyValueStore;
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite storage - each key is a row in `table`
///
/// Statements run synchronously on the calling task while the connection
/// lock is held. Records are small and written once per exchange.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    table: String,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure `table` exists
    pub fn open(path: impl AsRef<Path>, table: &str) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::with_connection(conn, table)
    }

    /// Open a private in-memory database
    pub fn open_in_memory(table: &str) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: &str) -> Result<Self> {
        // Table names cannot be bound as parameters
        let valid = !table.is_empty()
            && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(ChatError::StorageUnavailable(format!(
                "invalid table name '{}'",
                table
            )));
        }

        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
                table
            ),
            [],
        )?;

        tracing::debug!("[SqliteStore] Opened table '{}'", table);
        Ok(Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ChatError::StorageUnavailable("sqlite connection poisoned".to_string()))
    }
}

// blocking: rusqlite calls are not offloaded to the blocking pool
#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                &format!("SELECT value FROM {} WHERE key = ?1", self.table),
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        tracing::debug!(
            "[SqliteStore] Read '{}' from '{}' (found: {})",
            key,
            self.table,
            value.is_some()
        );
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO {} (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                self.table
            ),
            params![key, value],
        )?;
        tracing::debug!(
            "[SqliteStore] Wrote '{}' to '{}' ({} bytes)",
            key,
            self.table,
            value.len()
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!("DELETE FROM {} WHERE key = ?1", self.table),
            params![key],
        )?;
        tracing::debug!("[SqliteStore] Deleted '{}' from '{}'", key, self.table);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT key FROM {} ORDER BY key", self.table))?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}
