//! The settings the console is started with.

use std::{path::PathBuf, sync::Arc, time::Duration};

use crate::{
    error::CacheError,
    pagination::PaginationConfig,
    storage::{KeyValueStorage, MemoryStorage, SqliteStorage},
    store::IdStrategy,
};

/// The API the console talks to when no other is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:3000";

/// How long an HTTP request may take before it fails.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the app's data comes from and how it is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// The base URL of the REST API, e.g. "http://127.0.0.1:3000".
    pub api_base_url: String,

    /// The SQLite database the local cache is kept in. `None` keeps the
    /// cache in memory, so nothing survives the process.
    pub storage_path: Option<PathBuf>,

    /// The config that controls how to display pages of data.
    pub pagination: PaginationConfig,

    /// The timeout for each HTTP request.
    pub request_timeout: Duration,

    /// How new entities are given IDs.
    pub id_strategy: IdStrategy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            storage_path: None,
            pagination: PaginationConfig::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            id_strategy: IdStrategy::default(),
        }
    }
}

impl AppConfig {
    /// Open the storage backend named by [AppConfig::storage_path].
    ///
    /// # Errors
    ///
    /// Returns a [CacheError] if the SQLite database cannot be opened.
    pub fn open_storage(&self) -> Result<Arc<dyn KeyValueStorage>, CacheError> {
        match &self.storage_path {
            Some(path) => {
                tracing::debug!("Opening local storage at {}", path.display());
                Ok(Arc::new(SqliteStorage::open(path)?))
            }
            None => Ok(Arc::new(MemoryStorage::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::AppConfig;
    use crate::store::IdStrategy;

    #[test]
    fn default_config() {
        let config = AppConfig::default();

        assert_eq!(config.api_base_url, "http://127.0.0.1:3000");
        assert_eq!(config.storage_path, None);
        assert_eq!(config.pagination.default_page_size, NonZeroUsize::new(10).unwrap());
        assert_eq!(config.id_strategy, IdStrategy::Timestamp);
    }

    #[test]
    fn in_memory_storage_without_path() {
        let storage = AppConfig::default().open_storage().unwrap();

        storage.set("theme", "dark").unwrap();

        assert_eq!(storage.get("theme").unwrap(), Some("dark".to_owned()));
    }
}
