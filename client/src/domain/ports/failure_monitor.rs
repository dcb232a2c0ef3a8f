//! Port abstraction for the external telemetry collaborator.
//!
//! Only server-class failures are reported. Delivery is best-effort: a
//! failed report is logged and never alters the outcome of the call that
//! produced it.

use async_trait::async_trait;

use crate::domain::error::{ApiError, ErrorCategory};

use super::define_port_error;

define_port_error! {
    /// Failures raised while forwarding a report.
    pub enum FailureMonitorError {
        /// The collector could not be reached or rejected the payload.
        Delivery { message: String } => "failure report not delivered: {message}",
    }
}

/// Snapshot of a classified failure forwarded to telemetry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    context: String,
    category: ErrorCategory,
    error_code: Option<String>,
    status_code: Option<u16>,
    message: String,
}

impl FailureReport {
    /// Capture the reportable parts of a classified error.
    #[must_use]
    pub fn from_error(error: &ApiError, context: &str) -> Self {
        Self {
            context: context.to_owned(),
            category: error.category(),
            error_code: error.error_code().map(str::to_owned),
            status_code: error.status_code(),
            message: error.message().to_owned(),
        }
    }

    /// Free-text label identifying the failed call site.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Classification of the reported failure.
    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    /// Backend machine-readable code, if any.
    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    /// Transport status, if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Diagnostic message attached to the failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Telemetry sink for server-class failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FailureMonitor: Send + Sync {
    /// Forward a failure report to the collector.
    async fn report(&self, report: FailureReport) -> Result<(), FailureMonitorError>;
}

/// Monitor that drops every report; default for builds without telemetry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpFailureMonitor;

#[async_trait]
impl FailureMonitor for NoOpFailureMonitor {
    async fn report(&self, _report: FailureReport) -> Result<(), FailureMonitorError> {
        Ok(())
    }
}
