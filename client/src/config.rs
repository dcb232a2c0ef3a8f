//! Environment-driven client configuration.
//!
//! Centralises the handful of settings the client core needs so they are
//! validated consistently and testable without mutating process state
//! (environment access goes through `mockable::Env`).

use std::time::Duration;

use mockable::Env;
use url::Url;

/// Required: absolute http(s) base URL of the backend API.
pub const API_BASE_URL_ENV: &str = "RECON_API_BASE_URL";
/// Optional: per-request timeout in milliseconds.
pub const REQUEST_TIMEOUT_ENV: &str = "RECON_REQUEST_TIMEOUT_MS";
/// Optional: namespace prefix for secure-storage keys.
pub const STORAGE_NAMESPACE_ENV: &str = "RECON_STORAGE_NAMESPACE";

const DEFAULT_TIMEOUT_MS: u64 = 15_000;
const MIN_TIMEOUT_MS: u64 = 1;
const MAX_TIMEOUT_MS: u64 = 120_000;
const DEFAULT_NAMESPACE: &str = "recon";

const BASE_URL_EXPECTED: &str = "an absolute http(s) URL with a host";
const TIMEOUT_EXPECTED: &str = "an integer between 1 and 120000 (milliseconds)";
const NAMESPACE_EXPECTED: &str = "lowercase letters, digits, '-' or '_'";

/// Errors raised while validating client configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv {
        /// Variable name.
        name: &'static str,
    },
    /// A variable is present but holds an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
        /// Description of what would have been accepted.
        expected: &'static str,
    },
}

/// Validated settings for the client core.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
    request_timeout: Duration,
    storage_namespace: String,
}

impl ClientConfig {
    /// Build configuration from explicit parts.
    ///
    /// The base URL is normalised to end with `/` so endpoint paths join
    /// under it rather than replacing its final segment.
    pub fn new(
        base_url: Url,
        request_timeout: Duration,
        storage_namespace: impl Into<String>,
    ) -> Result<Self, ClientConfigError> {
        let base_url = validate_base_url(base_url.as_str())?;
        let storage_namespace = storage_namespace.into();
        if !is_valid_namespace(&storage_namespace) {
            return Err(ClientConfigError::InvalidEnv {
                name: STORAGE_NAMESPACE_ENV,
                value: storage_namespace,
                expected: NAMESPACE_EXPECTED,
            });
        }
        Ok(Self {
            base_url,
            request_timeout,
            storage_namespace,
        })
    }

    /// Build configuration from the environment.
    pub fn from_env<E: Env>(env: &E) -> Result<Self, ClientConfigError> {
        let base_url = match env.string(API_BASE_URL_ENV) {
            Some(raw) => validate_base_url(&raw)?,
            None => {
                return Err(ClientConfigError::MissingEnv {
                    name: API_BASE_URL_ENV,
                });
            }
        };

        let request_timeout = match env.string(REQUEST_TIMEOUT_ENV) {
            Some(raw) => parse_timeout(&raw)?,
            None => Duration::from_millis(DEFAULT_TIMEOUT_MS),
        };

        let storage_namespace = match env.string(STORAGE_NAMESPACE_ENV) {
            Some(raw) if is_valid_namespace(&raw) => raw,
            Some(raw) => {
                return Err(ClientConfigError::InvalidEnv {
                    name: STORAGE_NAMESPACE_ENV,
                    value: raw,
                    expected: NAMESPACE_EXPECTED,
                });
            }
            None => DEFAULT_NAMESPACE.to_owned(),
        };

        Ok(Self {
            base_url,
            request_timeout,
            storage_namespace,
        })
    }

    /// Normalised backend base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Per-request timeout for the HTTP client.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Namespace for secure-storage keys.
    pub fn storage_namespace(&self) -> &str {
        &self.storage_namespace
    }

    /// Storage key set under the configured namespace.
    #[must_use]
    pub fn credential_keys(&self) -> crate::domain::ports::CredentialKeys {
        crate::domain::ports::CredentialKeys::namespaced(&self.storage_namespace)
    }

    #[cfg(test)]
    pub(crate) fn for_tests(base: &str) -> Self {
        Self {
            base_url: validate_base_url(base).expect("test base URL is valid"),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            storage_namespace: DEFAULT_NAMESPACE.to_owned(),
        }
    }
}

fn validate_base_url(raw: &str) -> Result<Url, ClientConfigError> {
    let invalid = || ClientConfigError::InvalidEnv {
        name: API_BASE_URL_ENV,
        value: raw.to_owned(),
        expected: BASE_URL_EXPECTED,
    };

    let mut url = Url::parse(raw).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    Ok(url)
}

fn parse_timeout(raw: &str) -> Result<Duration, ClientConfigError> {
    raw.parse::<u64>()
        .ok()
        .filter(|ms| (MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(ms))
        .map(Duration::from_millis)
        .ok_or(ClientConfigError::InvalidEnv {
            name: REQUEST_TIMEOUT_ENV,
            value: raw.to_owned(),
            expected: TIMEOUT_EXPECTED,
        })
}

fn is_valid_namespace(raw: &str) -> bool {
    !raw.is_empty()
        && raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}
