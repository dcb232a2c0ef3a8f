//! Total classification of raw failures into [`ApiError`] values.
//!
//! Classification is pure and local: no network round-trip is needed to
//! decide what a failure means. The function accepts anything a call site
//! can plausibly hold after a failed request (an already-classified error,
//! a transport failure, loose JSON, a bare string) and always returns a
//! well-formed error with a category, never panicking.

use serde::Deserialize;
use tracing::debug;

use crate::domain::error::{ApiError, ErrorCategory, ValidationErrors};

/// Wire shape of backend failure payloads.
///
/// `{ success: false, message, error_code?, errors? }`, parsed tolerantly
/// so a malformed body still classifies by status code alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorEnvelope {
    /// Always `false` on error payloads; kept for wire fidelity.
    #[serde(default)]
    pub success: bool,
    /// Human-readable diagnostic supplied by the backend.
    #[serde(default)]
    pub message: Option<String>,
    /// Machine-readable failure code such as `VEHICLE_ALREADY_SOLD`.
    #[serde(default)]
    pub error_code: Option<String>,
    /// Per-field validation messages.
    #[serde(default)]
    pub errors: Option<ValidationErrors>,
}

/// Transport-level failure as observed by the HTTP adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportFailure {
    /// Nothing reached the server: connectivity lost, DNS failure, timeout.
    NoResponse {
        /// Low-level detail kept for logs; never shown to the user.
        detail: String,
    },
    /// A response arrived with a non-success status.
    Response {
        /// HTTP status code of the response.
        status: u16,
        /// Parsed error payload, when the body was well-formed.
        envelope: Option<ErrorEnvelope>,
    },
}

/// Any failure value a call site may hand to the classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFailure {
    /// Already classified; passes through unchanged.
    Classified(ApiError),
    /// Failure observed at the transport layer.
    Transport(TransportFailure),
    /// Arbitrary JSON-ish value (null, string, object, ...).
    Value(serde_json::Value),
    /// Plain error string.
    Message(String),
    /// Anything else; nothing useful could be extracted.
    Opaque,
}

impl From<ApiError> for RawFailure {
    fn from(error: ApiError) -> Self {
        Self::Classified(error)
    }
}

impl From<serde_json::Value> for RawFailure {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

impl From<String> for RawFailure {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for RawFailure {
    fn from(message: &str) -> Self {
        Self::Message(message.to_owned())
    }
}

impl From<reqwest::Error> for RawFailure {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            return Self::Transport(TransportFailure::Response {
                status: status.as_u16(),
                envelope: None,
            });
        }
        if error.is_connect() || error.is_timeout() {
            return Self::Transport(TransportFailure::NoResponse {
                detail: error.to_string(),
            });
        }
        Self::Message(error.to_string())
    }
}

/// Classify a raw failure into a well-formed [`ApiError`].
///
/// Total and idempotent: already-classified errors return unchanged, and no
/// input shape produces a panic or an error without a category.
#[must_use]
pub fn classify(raw: RawFailure) -> ApiError {
    match raw {
        RawFailure::Classified(error) => error,
        RawFailure::Transport(TransportFailure::NoResponse { detail }) => {
            debug!(detail = %detail, "request failed before reaching the server");
            ApiError::from_category(ErrorCategory::Network)
        }
        RawFailure::Transport(TransportFailure::Response { status, envelope }) => {
            classify_response(status, envelope)
        }
        RawFailure::Message(message) => ApiError::new(ErrorCategory::Server, message),
        RawFailure::Value(value) => {
            debug!(value = %value, "unrecognised failure value");
            ApiError::from_category(ErrorCategory::Server)
        }
        RawFailure::Opaque => ApiError::from_category(ErrorCategory::Server),
    }
}

fn classify_response(status: u16, envelope: Option<ErrorEnvelope>) -> ApiError {
    let envelope = envelope.unwrap_or_default();
    let category = envelope
        .error_code
        .as_deref()
        .map_or_else(|| category_for_status(status), category_for_code);

    let message = envelope
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| category.default_message().to_owned());

    let mut error = ApiError::new(category, message).with_status(status);
    if let Some(code) = envelope.error_code {
        error = error.with_code(code);
    }
    if let Some(fields) = envelope.errors {
        error = error.with_validation_errors(fields);
    }
    error
}

/// Backend code mapping; checked before the status fallback.
fn category_for_code(code: &str) -> ErrorCategory {
    if code.starts_with("AUTH_") {
        return ErrorCategory::Auth;
    }
    if code.starts_with("AUTHZ_") {
        return ErrorCategory::Permission;
    }
    match code {
        "VALIDATION_FAILED" => return ErrorCategory::Validation,
        "RESOURCE_NOT_FOUND" => return ErrorCategory::NotFound,
        "BUSINESS_RULE_VIOLATION" | "VEHICLE_ALREADY_SOLD" | "STOCK_INSUFFICIENT" => {
            return ErrorCategory::Business;
        }
        "VIN_DECODE_FAILED" => return ErrorCategory::Server,
        _ => {}
    }
    if code.starts_with("RESOURCE_") {
        return ErrorCategory::Business;
    }
    // EXTERNAL_* and anything unrecognised fall through to the safe default.
    ErrorCategory::Server
}

fn category_for_status(status: u16) -> ErrorCategory {
    match status {
        401 => ErrorCategory::Auth,
        403 => ErrorCategory::Permission,
        404 => ErrorCategory::NotFound,
        422 => ErrorCategory::Validation,
        s if s >= 500 => ErrorCategory::Server,
        _ => ErrorCategory::Server,
    }
}
