//! Implements a SQLite backed key-value storage.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use rusqlite::{Connection, OptionalExtension};

use crate::{error::CacheError, storage::KeyValueStorage};

/// Stores values in a `local_storage` table of a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Create a storage with a SQLite database, creating the table if needed.
    ///
    /// # Errors
    ///
    /// Returns a [CacheError::Storage] if the table cannot be created.
    pub fn new(connection: Connection) -> Result<Self, CacheError> {
        create_local_storage_table(&connection)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [CacheError::Storage] if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        Self::new(Connection::open(path)?)
    }

    /// Create a storage backed by a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns a [CacheError::Storage] if the database cannot be opened.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        Self::new(Connection::open_in_memory()?)
    }
}

/// Create the `local_storage` table.
///
/// # Errors
/// Returns an error if there is an SQL error.
fn create_local_storage_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS local_storage (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

impl KeyValueStorage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let connection = self.connection.lock().map_err(|_| CacheError::LockError)?;

        connection
            .prepare("SELECT value FROM local_storage WHERE key = :key")?
            .query_row(&[(":key", &key)], |row| row.get(0))
            .optional()
            .map_err(|error| error.into())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let connection = self.connection.lock().map_err(|_| CacheError::LockError)?;

        connection.execute(
            "INSERT INTO local_storage (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key, value),
        )?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let connection = self.connection.lock().map_err(|_| CacheError::LockError)?;

        connection.execute("DELETE FROM local_storage WHERE key = ?1", (key,))?;

        Ok(())
    }
}
