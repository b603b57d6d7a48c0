//! Implements an in-memory key-value storage with an optional size quota.

use std::{collections::HashMap, sync::Mutex};

use crate::{error::CacheError, storage::KeyValueStorage};

/// Stores values in a `HashMap`.
///
/// When a quota is set, writes that would make the total size of all keys
/// and values exceed the quota fail with [CacheError::QuotaExceeded], the
/// same way a browser's `localStorage` rejects writes once it is full.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Create an empty storage without a quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty storage that holds at most `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            quota: Some(quota),
        }
    }

    /// The number of stored keys.
    pub fn len(&self) -> usize {
        self.values.lock().map(|values| values.len()).unwrap_or(0)
    }

    /// Whether the storage holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let values = self.values.lock().map_err(|_| CacheError::LockError)?;

        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut values = self.values.lock().map_err(|_| CacheError::LockError)?;

        if let Some(quota) = self.quota {
            let others: usize = values
                .iter()
                .filter(|(existing_key, _)| existing_key.as_str() != key)
                .map(|(existing_key, existing_value)| existing_key.len() + existing_value.len())
                .sum();
            let required = others + key.len() + value.len();

            if required > quota {
                return Err(CacheError::QuotaExceeded {
                    key: key.to_owned(),
                    required,
                    quota,
                });
            }
        }

        values.insert(key.to_owned(), value.to_owned());

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut values = self.values.lock().map_err(|_| CacheError::LockError)?;
        values.remove(key);

        Ok(())
    }
}
