//! Defines the error types for the store layer.
//!
//! Lower layers report [NetworkError], [CacheError] and [ValidationError].
//! The stores wrap whichever of these caused a failed action in a
//! [StoreError] that also carries the fixed message shown to the user.

use std::fmt::Display;

/// Errors raised by a remote gateway while fetching or posting data.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum NetworkError {
    /// The request could not be sent or the connection failed.
    #[error("request to {url} failed: {reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// The transport error as text.
        reason: String,
    },

    /// The server responded with a non-success status code.
    #[error("request to {url} returned status {status}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body could not be parsed into the expected shape.
    #[error("could not decode response from {url}: {reason}")]
    Decode {
        /// The URL that was requested.
        url: String,
        /// The parse error as text.
        reason: String,
    },
}

impl NetworkError {
    /// Classify a reqwest error raised while requesting `url`.
    pub(crate) fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            NetworkError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            }
        } else if error.is_decode() {
            NetworkError::Decode {
                url: url.to_owned(),
                reason: error.to_string(),
            }
        } else {
            NetworkError::Transport {
                url: url.to_owned(),
                reason: error.to_string(),
            }
        }
    }
}

/// Errors raised by the local key-value cache.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CacheError {
    /// A value could not be serialized to JSON.
    #[error("could not serialize the value for \"{key}\": {reason}")]
    Serialization {
        /// The storage key being written.
        key: String,
        /// The serde error as text.
        reason: String,
    },

    /// Writing the value would exceed the storage quota.
    #[error("storing \"{key}\" needs {required} bytes but the quota is {quota} bytes")]
    QuotaExceeded {
        /// The storage key being written.
        key: String,
        /// The total number of bytes the storage would hold after the write.
        required: usize,
        /// The maximum number of bytes the storage may hold.
        quota: usize,
    },

    /// The underlying storage backend failed.
    #[error("storage backend error: {0}")]
    Storage(String),

    /// Could not acquire the storage lock.
    #[error("could not acquire the storage lock")]
    LockError,
}

impl From<rusqlite::Error> for CacheError {
    fn from(error: rusqlite::Error) -> Self {
        CacheError::Storage(error.to_string())
    }
}

/// A caller-supplied value failed a required-field check.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty or only whitespace.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// A pincode must be exactly six digits.
    #[error("\"{0}\" is not a valid six digit pincode")]
    InvalidPincode(String),

    /// The email address is not of the form `name@domain`.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The password is shorter than the minimum length.
    #[error("password must be at least {0} characters long")]
    PasswordTooShort(usize),

    /// A subcategory must reference the category it belongs to.
    #[error("a subcategory must belong to a category")]
    MissingCategory,

    /// An entity with the same ID is already in the collection.
    #[error("an entity with ID {0} already exists")]
    DuplicateId(String),
}

/// The errors that may occur in the store layer.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The remote gateway failed.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The local cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// The store action that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreAction {
    /// Loading a collection from the cache or the remote gateway.
    Load,
    /// Adding an entity.
    Add,
    /// Updating an entity.
    Update,
    /// Deleting an entity.
    Delete,
    /// Logging in.
    LogIn,
    /// Creating an account.
    SignUp,
}

impl StoreAction {
    /// The message shown to the user when this action fails for `subject`,
    /// e.g. "Failed to load pincodes".
    pub fn failure_message(self, subject: &str) -> String {
        match self {
            StoreAction::LogIn => "Failed to log in".to_owned(),
            StoreAction::SignUp => "Failed to sign up".to_owned(),
            action => format!("Failed to {action} {subject}"),
        }
    }
}

impl Display for StoreAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = match self {
            StoreAction::Load => "load",
            StoreAction::Add => "add",
            StoreAction::Update => "update",
            StoreAction::Delete => "delete",
            StoreAction::LogIn => "log in",
            StoreAction::SignUp => "sign up",
        };

        write!(f, "{verb}")
    }
}

/// A failed store action.
///
/// `message` is the same text the store puts in its `error` cell, and
/// `source` is the lower-layer error that caused the failure.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{message}: {source}")]
pub struct StoreError {
    /// The action that failed.
    pub action: StoreAction,
    /// The user-facing message.
    pub message: String,
    /// The original error.
    #[source]
    pub source: Error,
}

impl StoreError {
    /// Create a store error for `action` on `subject` caused by `source`.
    pub fn new(action: StoreAction, subject: &str, source: impl Into<Error>) -> Self {
        Self {
            action,
            message: action.failure_message(subject),
            source: source.into(),
        }
    }

    /// Whether the action was rejected by validation before touching any state.
    pub fn is_validation(&self) -> bool {
        matches!(self.source, Error::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{CacheError, Error, NetworkError, StoreAction, StoreError, ValidationError};

    #[test]
    fn failure_messages_name_the_collection() {
        assert_eq!(
            StoreAction::Load.failure_message("pincodes"),
            "Failed to load pincodes"
        );
        assert_eq!(
            StoreAction::Add.failure_message("users"),
            "Failed to add users"
        );
        assert_eq!(
            StoreAction::Update.failure_message("categories"),
            "Failed to update categories"
        );
        assert_eq!(
            StoreAction::Delete.failure_message("service providers"),
            "Failed to delete service providers"
        );
        assert_eq!(StoreAction::LogIn.failure_message("auth"), "Failed to log in");
    }

    #[test]
    fn store_error_keeps_original_error() {
        let network_error = NetworkError::Status {
            url: "http://localhost/pincodes".to_owned(),
            status: 500,
        };

        let error = StoreError::new(StoreAction::Load, "pincodes", network_error.clone());

        assert_eq!(error.message, "Failed to load pincodes");
        assert_eq!(error.source, Error::Network(network_error));
        assert!(error.to_string().starts_with("Failed to load pincodes: "));
        assert!(!error.is_validation());
    }

    #[test]
    fn validation_errors_are_flagged() {
        let error = StoreError::new(
            StoreAction::Add,
            "pincodes",
            ValidationError::EmptyField("office name"),
        );

        assert!(error.is_validation());
    }

    #[test]
    fn sqlite_errors_become_storage_errors() {
        let error: CacheError = rusqlite::Error::QueryReturnedNoRows.into();

        assert!(matches!(error, CacheError::Storage(_)));
    }
}
