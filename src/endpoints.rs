//! The REST API endpoint paths, relative to the API base URL.
//!
//! Use [url] to join a path onto a base URL.

/// The users collection. `POST` creates an account.
pub const USERS: &str = "/users";
/// The pincodes collection.
pub const PINCODES: &str = "/pincodes";
/// The categories collection.
pub const CATEGORIES: &str = "/categories";
/// The subcategories collection.
pub const SUBCATEGORIES: &str = "/subcategories";
/// The service providers collection.
pub const SERVICE_PROVIDERS: &str = "/service-providers";
/// The route for exchanging credentials for an access token.
pub const LOG_IN: &str = "/auth/login";
/// The route for fetching the logged in user's profile.
pub const PROFILE: &str = "/auth/profile";

/// Join `path` onto `base_url`, ignoring a trailing slash on the base.
pub fn url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::{PINCODES, url};

    #[test]
    fn joins_without_double_slash() {
        assert_eq!(
            url("http://localhost:3000/", PINCODES),
            "http://localhost:3000/pincodes"
        );
        assert_eq!(
            url("http://localhost:3000/api", PINCODES),
            "http://localhost:3000/api/pincodes"
        );
    }
}
