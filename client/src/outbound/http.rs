//! HTTP transport adapter over the remote REST API.
//!
//! Purpose: keep the domain free of wire concerns. Screens call the typed
//! JSON helpers here; every failure (connectivity, non-success status,
//! undecodable body) comes back as a classified [`ApiError`], so call
//! sites only ever deal with the domain taxonomy.

use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::domain::classify::{ErrorEnvelope, RawFailure, TransportFailure, classify};
use crate::domain::error::{ApiError, ErrorCategory};
use crate::domain::session::SessionToken;

/// Raised while constructing the underlying HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum TransportBuildError {
    /// The TLS/runtime setup of the HTTP client failed.
    #[error("failed to build the HTTP client: {source}")]
    Client {
        /// Underlying client construction failure.
        #[source]
        source: reqwest::Error,
    },
}

/// Thin typed-JSON seam over the backend.
///
/// Request timeouts come from [`ClientConfig`]; no per-call cancellation is
/// threaded through.
#[derive(Debug, Clone)]
pub struct ApiTransport {
    http: Client,
    base_url: Url,
}

impl ApiTransport {
    /// Build a transport from validated configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportBuildError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|source| TransportBuildError::Client { source })?;
        Ok(Self {
            http,
            base_url: config.base_url().clone(),
        })
    }

    /// GET a JSON resource.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<&SessionToken>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        self.execute(self.authorized(self.http.get(url), bearer)).await
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&SessionToken>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        self.execute(self.authorized(self.http.post(url).json(body), bearer))
            .await
    }

    /// PUT a JSON body and decode the JSON response.
    pub async fn put_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&SessionToken>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        self.execute(self.authorized(self.http.put(url).json(body), bearer))
            .await
    }

    /// DELETE a resource and decode the JSON response.
    pub async fn delete_json<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<&SessionToken>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        self.execute(self.authorized(self.http.delete(url), bearer))
            .await
    }

    fn authorized(&self, request: RequestBuilder, bearer: Option<&SessionToken>) -> RequestBuilder {
        match bearer {
            Some(token) => request.bearer_auth(token.reveal()),
            None => request,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|error| {
                debug!(path, error = %error, "endpoint path did not join onto the base URL");
                ApiError::new(
                    ErrorCategory::Server,
                    format!("invalid endpoint path: {path}"),
                )
            })
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|error| classify(RawFailure::from(error)))?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|error| {
                debug!(error = %error, "response body did not decode");
                classify(RawFailure::from(error))
            });
        }

        // Parse the error envelope tolerantly; a malformed body still
        // classifies by status alone.
        let envelope = response.json::<ErrorEnvelope>().await.ok();
        Err(classify(RawFailure::Transport(TransportFailure::Response {
            status: status.as_u16(),
            envelope,
        })))
    }
}
