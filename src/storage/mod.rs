//! The local key-value cache that stores collection snapshots between runs.
//!
//! [KeyValueStorage] is the raw string store (the role `localStorage` plays
//! in a browser) and [LocalCache] layers typed JSON snapshots on top of it.

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};

use crate::error::CacheError;

/// A persistent store of string values indexed by string keys.
pub trait KeyValueStorage: Send + Sync {
    /// Get the value stored under `key`, or `None` if there is none.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, replacing any existing value.
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Remove the value stored under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

/// Reads and writes JSON snapshots through a [KeyValueStorage].
#[derive(Clone)]
pub struct LocalCache {
    storage: Arc<dyn KeyValueStorage>,
}

impl LocalCache {
    /// Create a cache that writes to `storage`.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// The storage the cache writes to.
    pub fn storage(&self) -> &Arc<dyn KeyValueStorage> {
        &self.storage
    }

    /// Read the collection snapshot stored under `key`.
    ///
    /// Returns `None` if nothing is stored, the storage fails or the snapshot
    /// is not a valid JSON array of `E`. A bad snapshot is treated as a cache
    /// miss so the caller falls through to the remote gateway.
    pub fn read<E: DeserializeOwned>(&self, key: &str) -> Option<Vec<E>> {
        self.read_value(key)
    }

    /// Store `entities` as the collection snapshot under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [CacheError] if the snapshot cannot be serialized or stored.
    pub fn write<E: Serialize>(&self, key: &str, entities: &[E]) -> Result<(), CacheError> {
        self.write_value(key, entities)
    }

    /// Read a single JSON value stored under `key`. Never fails, see [LocalCache::read].
    pub fn read_value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(error) => {
                tracing::warn!("Could not read \"{key}\" from local storage: {error}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!("Ignoring unparseable snapshot for \"{key}\": {error}");
                None
            }
        }
    }

    /// Store `value` as JSON under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [CacheError] if the value cannot be serialized or stored.
    pub fn write_value<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value).map_err(|error| CacheError::Serialization {
            key: key.to_owned(),
            reason: error.to_string(),
        })?;

        self.storage.set(key, &raw)?;
        tracing::debug!("Wrote {} bytes to \"{key}\"", raw.len());

        Ok(())
    }

    /// Remove whatever is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [CacheError] if the storage backend fails.
    pub fn clear(&self, key: &str) -> Result<(), CacheError> {
        self.storage.remove(key)
    }
}

impl std::fmt::Debug for LocalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache").finish_non_exhaustive()
    }
}
