/*! This module defines the auth gateway and the store that holds the logged in user's session. */

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::{
    endpoints,
    error::{NetworkError, StoreAction, StoreError},
    models::{AccessToken, AuthSession, AuthUser, Credentials, SignUp},
    storage::LocalCache,
};

/// The storage key the session is persisted under.
pub const SESSION_KEY: &str = "auth";

/// Talks to the auth endpoints of the REST API.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchange `credentials` for an access token.
    async fn log_in(&self, credentials: &Credentials) -> Result<AccessToken, NetworkError>;

    /// Fetch the profile of the user that owns `token`.
    async fn profile(&self, token: &str) -> Result<AuthUser, NetworkError>;

    /// Create an account.
    async fn sign_up(&self, sign_up: &SignUp) -> Result<AuthUser, NetworkError>;
}

/// An [AuthGateway] that makes HTTP requests with reqwest.
pub struct HttpAuthGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthGateway {
    /// Create a gateway for the API at `base_url`.
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_owned(),
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, NetworkError> {
        request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|error| NetworkError::from_reqwest(url, error))?
            .json()
            .await
            .map_err(|error| NetworkError::from_reqwest(url, error))
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn log_in(&self, credentials: &Credentials) -> Result<AccessToken, NetworkError> {
        let url = endpoints::url(&self.base_url, endpoints::LOG_IN);

        self.send(&url, self.client.post(&url).json(credentials))
            .await
    }

    async fn profile(&self, token: &str) -> Result<AuthUser, NetworkError> {
        let url = endpoints::url(&self.base_url, endpoints::PROFILE);

        self.send(&url, self.client.get(&url).bearer_auth(token))
            .await
    }

    async fn sign_up(&self, sign_up: &SignUp) -> Result<AuthUser, NetworkError> {
        let url = endpoints::url(&self.base_url, endpoints::USERS);

        self.send(&url, self.client.post(&url).json(sign_up)).await
    }
}

/// A snapshot of the auth state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    /// The current session, if a user is logged in.
    pub session: Option<AuthSession>,
    /// Whether a log in or sign up request is in flight.
    pub is_loading: bool,
    /// The message for the last failed action.
    pub error: Option<String>,
}

/// Holds the logged in user's session and persists it between runs.
pub struct AuthStore {
    gateway: Arc<dyn AuthGateway>,
    cache: LocalCache,
    state: watch::Sender<AuthState>,
}

impl AuthStore {
    /// Create a logged out store. Call [AuthStore::restore] to pick up a
    /// persisted session.
    pub fn new(gateway: Arc<dyn AuthGateway>, cache: LocalCache) -> Self {
        Self {
            gateway,
            cache,
            state: watch::Sender::new(AuthState::default()),
        }
    }

    /// Load the session persisted by an earlier run.
    ///
    /// Returns whether a session was found.
    pub fn restore(&self) -> bool {
        let Some(session) = self.cache.read_value::<AuthSession>(SESSION_KEY) else {
            return false;
        };

        tracing::debug!("Restored the session for {}", session.user.email);
        self.state.send_modify(|state| state.session = Some(session));

        true
    }

    /// Subscribe to changes to the auth state.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// The current session.
    pub fn session(&self) -> Option<AuthSession> {
        self.state.borrow().session.clone()
    }

    /// The logged in user.
    pub fn user(&self) -> Option<AuthUser> {
        self.state
            .borrow()
            .session
            .as_ref()
            .map(|session| session.user.clone())
    }

    /// The bearer token of the current session.
    pub fn token(&self) -> Option<String> {
        self.state
            .borrow()
            .session
            .as_ref()
            .map(|session| session.token.clone())
    }

    /// Whether a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.state
            .borrow()
            .session
            .as_ref()
            .is_some_and(AuthSession::is_authenticated)
    }

    /// Whether a request is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// The message for the last failed action.
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Log in with `credentials` and fetch the user's profile.
    ///
    /// The new session replaces any existing one and is persisted. If it
    /// cannot be persisted the user is still logged in for this run.
    ///
    /// # Errors
    ///
    /// Returns a [StoreError] with the message "Failed to log in" if the
    /// credentials are malformed or either request fails. Malformed
    /// credentials do not change any state.
    pub async fn log_in(&self, credentials: &Credentials) -> Result<AuthSession, StoreError> {
        credentials
            .validate()
            .map_err(|error| StoreError::new(StoreAction::LogIn, "", error))?;

        self.start_request();

        let result = async {
            let token = self.gateway.log_in(credentials).await?;
            let user = self.gateway.profile(&token.access_token).await?;

            Ok::<_, NetworkError>(AuthSession {
                user,
                token: token.access_token,
            })
        }
        .await;

        match result {
            Ok(session) => {
                tracing::info!("Logged in as {}", session.user.email);

                if let Err(error) = self.cache.write_value(SESSION_KEY, &session) {
                    tracing::warn!("Could not persist the session: {error}");
                }

                self.state.send_modify(|state| {
                    state.session = Some(session.clone());
                    state.is_loading = false;
                    state.error = None;
                });

                Ok(session)
            }
            Err(error) => Err(self.fail_request(StoreAction::LogIn, error)),
        }
    }

    /// Create an account. Does not log the new user in.
    ///
    /// # Errors
    ///
    /// Returns a [StoreError] with the message "Failed to sign up" if the
    /// details fail validation or the request fails. Invalid details do not
    /// change any state.
    pub async fn sign_up(&self, sign_up: &SignUp) -> Result<AuthUser, StoreError> {
        sign_up
            .validate()
            .map_err(|error| StoreError::new(StoreAction::SignUp, "", error))?;

        self.start_request();

        match self.gateway.sign_up(sign_up).await {
            Ok(user) => {
                tracing::info!("Created an account for {}", user.email);

                self.state.send_modify(|state| {
                    state.is_loading = false;
                    state.error = None;
                });

                Ok(user)
            }
            Err(error) => Err(self.fail_request(StoreAction::SignUp, error)),
        }
    }

    /// End the session and forget the persisted copy.
    pub fn log_out(&self) {
        if let Err(error) = self.cache.clear(SESSION_KEY) {
            tracing::warn!("Could not remove the persisted session: {error}");
        }

        self.state.send_modify(|state| {
            if let Some(session) = state.session.take() {
                tracing::info!("Logged out {}", session.user.email);
            }
            state.error = None;
        });
    }

    fn start_request(&self) {
        self.state.send_modify(|state| state.is_loading = true);
    }

    fn fail_request(&self, action: StoreAction, error: NetworkError) -> StoreError {
        let error = StoreError::new(action, "", error);
        tracing::error!("{error}");

        self.state.send_modify(|state| {
            state.is_loading = false;
            state.error = Some(error.message.clone());
        });

        error
    }
}
