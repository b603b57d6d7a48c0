//! Defines the types exchanged when logging in and signing up.

use serde::{Deserialize, Serialize};

use crate::{
    entity::{EntityId, require},
    error::ValidationError,
    models::validate_email,
};

/// The shortest password accepted when signing up.
pub const MIN_PASSWORD_LENGTH: usize = 4;

/// The logged in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// The user's ID on the auth server.
    pub id: EntityId,
    /// The email address the user logs in with.
    pub email: String,
    /// The user's display name.
    #[serde(default)]
    pub name: String,
}

/// A logged in user and the bearer token for their session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// The logged in user.
    pub user: AuthUser,
    /// The bearer token sent with authenticated requests.
    pub token: String,
}

impl AuthSession {
    /// Whether the session can be used to make authenticated requests.
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }
}

/// An email and password pair used to log in.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// The email address.
    pub email: String,
    /// The plain text password.
    pub password: String,
}

impl Credentials {
    /// Check that both fields are filled in and the email is well formed.
    ///
    /// # Errors
    ///
    /// Returns a [ValidationError] for the first field that failed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("email", &self.email)?;
        validate_email(&self.email)?;
        require("password", &self.password)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"********")
            .finish()
    }
}

/// The details needed to create an account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUp {
    /// The display name.
    pub name: String,
    /// The email address.
    pub email: String,
    /// The plain text password.
    pub password: String,
    /// A URL for the user's avatar image.
    #[serde(default)]
    pub avatar: String,
}

impl SignUp {
    /// Check the required fields and the minimum password length.
    ///
    /// # Errors
    ///
    /// Returns a [ValidationError] for the first field that failed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        validate_email(&self.email)?;

        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LENGTH));
        }

        Ok(())
    }
}

impl std::fmt::Debug for SignUp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUp")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"********")
            .field("avatar", &self.avatar)
            .finish()
    }
}

/// The response to a successful log in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// The bearer token.
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::{AuthSession, AuthUser, Credentials, SignUp};
    use crate::{entity::EntityId, error::ValidationError};

    #[test]
    fn credentials_require_password() {
        let credentials = Credentials {
            email: "john@mail.com".to_owned(),
            password: String::new(),
        };

        assert_eq!(
            credentials.validate(),
            Err(ValidationError::EmptyField("password"))
        );
    }

    #[test]
    fn debug_output_hides_password() {
        let credentials = Credentials {
            email: "john@mail.com".to_owned(),
            password: "changeme".to_owned(),
        };

        let text = format!("{credentials:?}");

        assert!(!text.contains("changeme"));
        assert!(text.contains("john@mail.com"));
    }

    #[test]
    fn sign_up_requires_minimum_password_length() {
        let sign_up = SignUp {
            name: "John".to_owned(),
            email: "john@mail.com".to_owned(),
            password: "abc".to_owned(),
            avatar: String::new(),
        };

        assert_eq!(sign_up.validate(), Err(ValidationError::PasswordTooShort(4)));
    }

    #[test]
    fn session_round_trips_through_json() {
        let session = AuthSession {
            user: AuthUser {
                id: EntityId::Int(1),
                email: "john@mail.com".to_owned(),
                name: "Jhon".to_owned(),
            },
            token: "abc.def.ghi".to_owned(),
        };

        let json = serde_json::to_string(&session).unwrap();
        let got: AuthSession = serde_json::from_str(&json).unwrap();

        assert_eq!(got, session);
        assert!(got.is_authenticated());
    }
}
