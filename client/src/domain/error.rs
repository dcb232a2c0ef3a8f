//! Normalized representation of failed backend/network interactions.
//!
//! Every failed API call in the app eventually becomes an [`ApiError`]. The
//! category drives both user-visible behaviour (blocking alert, inline form
//! errors, forced logout) and telemetry; the optional machine code, status,
//! and per-field validation map carry the backend detail forward for call
//! sites that need it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-field validation messages as supplied by the backend.
pub type ValidationErrors = BTreeMap<String, Vec<String>>;

/// Coarse classification of an [`ApiError`].
///
/// `Server` is the safe default: anything unrecognised lands there rather
/// than surfacing raw backend detail to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// No response reached the server (connectivity lost, timeout).
    Network,
    /// Session invalid or expired (401 or `AUTH_*` codes).
    Auth,
    /// Malformed input with field-level detail (422 or `VALIDATION_FAILED`).
    Validation,
    /// Authenticated but forbidden (403 or `AUTHZ_*` codes).
    Permission,
    /// The addressed resource does not exist (404 or `RESOURCE_NOT_FOUND`).
    NotFound,
    /// Domain rule violation such as selling an already-sold vehicle.
    Business,
    /// Everything else, including unexpected and unclassified failures.
    Server,
}

impl ErrorCategory {
    /// Default diagnostic message used when the backend supplies none.
    pub(crate) fn default_message(self) -> &'static str {
        match self {
            Self::Network => "No internet connection. Check your network and try again.",
            Self::Auth => "Authentication failed.",
            Self::Validation => "Some fields contain invalid values.",
            Self::Permission => "You do not have permission to perform this action.",
            Self::NotFound => "The requested resource was not found.",
            Self::Business => "The operation violates a business rule.",
            Self::Server => "Unexpected error. Please try again later.",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::Validation => "validation",
            Self::Permission => "permission",
            Self::NotFound => "not_found",
            Self::Business => "business",
            Self::Server => "server",
        };
        f.write_str(label)
    }
}

/// Categorized failure produced by the classifier.
///
/// ## Invariants
/// - `category` is always set, even when classification fell back to the
///   generic default.
/// - `validation_errors` carries the backend's per-field map verbatim; it is
///   only expected for [`ErrorCategory::Validation`] responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<String>,
    category: ErrorCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation_errors: Option<ValidationErrors>,
}

impl ApiError {
    /// Build an error from a category and diagnostic message.
    ///
    /// Blank messages fall back to the category default so downstream code
    /// never renders an empty string.
    #[must_use]
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            category.default_message().to_owned()
        } else {
            message
        };
        Self {
            message,
            error_code: None,
            category,
            status_code: None,
            validation_errors: None,
        }
    }

    /// Build an error carrying only the category's default message.
    #[must_use]
    pub fn from_category(category: ErrorCategory) -> Self {
        Self::new(category, category.default_message())
    }

    /// Attach the backend's machine-readable code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    /// Attach the transport status code.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Attach the backend's per-field validation messages.
    #[must_use]
    pub fn with_validation_errors(mut self, errors: ValidationErrors) -> Self {
        self.validation_errors = Some(errors);
        self
    }

    /// Diagnostic message (server-supplied or category default).
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Backend machine-readable code, if one was supplied.
    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    /// Mandatory failure classification.
    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    /// Transport status, if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Per-field validation messages, if the backend supplied any.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        self.validation_errors.as_ref()
    }

    /// Copy shown to the user.
    ///
    /// Network, auth, and server failures get fixed copy regardless of the
    /// diagnostic message; validation and business text from the backend is
    /// assumed to already be human-readable and surfaces verbatim.
    pub fn user_message(&self) -> &str {
        match self.category {
            ErrorCategory::Network => {
                "No internet connection. Check your network and try again."
            }
            ErrorCategory::Auth => "Your session has expired. Please sign in again.",
            ErrorCategory::Server => "Something went wrong on our side. Please try again later.",
            _ => self.message.as_str(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_code {
            Some(code) => write!(f, "[{}/{code}] {}", self.category, self.message),
            None => write!(f, "[{}] {}", self.category, self.message),
        }
    }
}

impl std::error::Error for ApiError {}
