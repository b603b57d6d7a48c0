//! A client-side data-store layer for an administrative console.
//!
//! Each managed entity type gets a [Store]: an observable in-memory
//! collection that is loaded from a local cache or a REST API, persisted
//! back to the cache after every change and viewed through search, sort and
//! pagination state. An [AuthStore] holds the logged in user's session and
//! [Preferences] holds the display settings.
//!
//! [AppState] builds all of these from an [AppConfig]. The [mock_api] module
//! provides an axum server with fixture data to run the console against.

#![warn(missing_docs)]

mod app_state;
mod auth;
mod config;
pub mod endpoints;
mod entity;
mod error;
mod gateway;
mod list_state;
mod logging;
pub mod mock_api;
pub mod models;
mod pagination;
mod preferences;
pub mod storage;
mod store;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{AuthGateway, AuthState, AuthStore, HttpAuthGateway, SESSION_KEY};
pub use config::{AppConfig, DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
pub use entity::{Entity, EntityId, FieldValue};
pub use error::{CacheError, Error, NetworkError, StoreAction, StoreError, ValidationError};
pub use gateway::{Gateway, HttpGateway, build_client};
pub use list_state::{ListState, Sort, SortDirection, filter, sort};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::{
    PaginationConfig, PaginationIndicator, create_pagination_indicators, paginate, total_pages,
};
pub use preferences::{LANGUAGE_KEY, Language, Preferences, THEME_KEY, Theme};
pub use store::{IdStrategy, LoadStatus, Store, StoreState};
