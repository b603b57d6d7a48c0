//! This module defines the domain data types managed by the stores.

mod auth;
mod category;
mod pincode;
mod service_provider;
mod user;

pub use auth::{AccessToken, AuthSession, AuthUser, Credentials, SignUp};
pub use category::{Category, Subcategory};
pub use pincode::Pincode;
pub use service_provider::ServiceProvider;
pub use user::{UpstreamCompany, UpstreamUser, User};

/// Return [crate::ValidationError::InvalidEmail] unless `email` looks like `name@domain`.
pub(crate) fn validate_email(email: &str) -> Result<(), crate::ValidationError> {
    let email = email.trim();

    match email.split_once('@') {
        Some((name, domain)) if !name.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(crate::ValidationError::InvalidEmail(email.to_owned())),
    }
}
