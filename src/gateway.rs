//! The remote gateway that fetches entity collections from the REST API.

use std::{marker::PhantomData, time::Duration};

use async_trait::async_trait;

use crate::{endpoints, entity::Entity, error::NetworkError};

/// Fetches the collection of `E` from a remote source. Owns no data.
#[async_trait]
pub trait Gateway<E>: Send + Sync {
    /// Fetch every record in the collection.
    ///
    /// # Errors
    ///
    /// Returns a [NetworkError] if the request fails or the response cannot be parsed.
    async fn fetch_all(&self) -> Result<Vec<E>, NetworkError>;
}

/// Create the HTTP client shared by the gateways.
///
/// # Errors
///
/// Returns a [NetworkError::Transport] if the client cannot be built, e.g.
/// when the TLS backend fails to initialise.
pub fn build_client(request_timeout: Duration) -> Result<reqwest::Client, NetworkError> {
    reqwest::Client::builder()
        .timeout(request_timeout)
        .build()
        .map_err(|error| NetworkError::Transport {
            url: String::new(),
            reason: error.to_string(),
        })
}

/// Fetches a collection with a `GET` request to a fixed endpoint.
pub struct HttpGateway<E> {
    client: reqwest::Client,
    url: String,
    entity: PhantomData<fn() -> E>,
}

impl<E: Entity> HttpGateway<E> {
    /// Create a gateway for the collection at `path` under `base_url`.
    pub fn new(client: reqwest::Client, base_url: &str, path: &str) -> Self {
        Self {
            client,
            url: endpoints::url(base_url, path),
            entity: PhantomData,
        }
    }

    /// The URL the gateway fetches from.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl<E: Entity> Gateway<E> for HttpGateway<E> {
    async fn fetch_all(&self) -> Result<Vec<E>, NetworkError> {
        tracing::info!("Fetching {} from {}", E::PLURAL_NAME, self.url);

        let upstream: Vec<E::Upstream> = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|error| NetworkError::from_reqwest(&self.url, error))?
            .json()
            .await
            .map_err(|error| NetworkError::from_reqwest(&self.url, error))?;

        tracing::debug!("Fetched {} {}", upstream.len(), E::PLURAL_NAME);

        Ok(upstream.into_iter().map(E::from_upstream).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{Router, http::StatusCode, routing::get};

    use super::{Gateway, HttpGateway, build_client};
    use crate::{
        endpoints,
        entity::EntityId,
        error::NetworkError,
        mock_api::{MockApi, build_mock_router},
        models::{Pincode, User},
        test_utils::serve,
    };

    fn client() -> reqwest::Client {
        build_client(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetches_collection() {
        let base_url = serve(build_mock_router(MockApi::with_fixtures())).await;
        let gateway: HttpGateway<Pincode> =
            HttpGateway::new(client(), &base_url, endpoints::PINCODES);

        let pincodes = gateway.fetch_all().await.unwrap();

        assert_eq!(pincodes, MockApi::with_fixtures().pincodes);
    }

    #[tokio::test]
    async fn maps_upstream_users() {
        let base_url = serve(build_mock_router(MockApi::with_fixtures())).await;
        let gateway: HttpGateway<User> = HttpGateway::new(client(), &base_url, endpoints::USERS);

        let users = gateway.fetch_all().await.unwrap();

        assert_eq!(users.len(), 3);
        assert_eq!(users[0].id, Some(EntityId::Int(1)));
        assert_eq!(users[0].company, "Romaguera-Crona");
        assert_eq!(users[0].bs, "harness real-time e-markets");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let app = Router::new().route(
            endpoints::PINCODES,
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let base_url = serve(app).await;
        let gateway: HttpGateway<Pincode> =
            HttpGateway::new(client(), &base_url, endpoints::PINCODES);

        let result = gateway.fetch_all().await;

        assert_eq!(
            result,
            Err(NetworkError::Status {
                url: gateway.url().to_owned(),
                status: 503,
            })
        );
    }

    #[tokio::test]
    async fn unparseable_body_is_a_decode_error() {
        let app = Router::new().route(endpoints::PINCODES, get(|| async { "not json" }));
        let base_url = serve(app).await;
        let gateway: HttpGateway<Pincode> =
            HttpGateway::new(client(), &base_url, endpoints::PINCODES);

        let result = gateway.fetch_all().await;

        assert!(
            matches!(result, Err(NetworkError::Decode { .. })),
            "want decode error, got {result:?}"
        );
    }

    #[tokio::test]
    async fn connection_failure_is_a_transport_error() {
        // Nothing listens on the discard port.
        let gateway: HttpGateway<Pincode> =
            HttpGateway::new(client(), "http://127.0.0.1:9", endpoints::PINCODES);

        let result = gateway.fetch_all().await;

        assert!(
            matches!(result, Err(NetworkError::Transport { .. })),
            "want transport error, got {result:?}"
        );
    }
}
