//! Per-call failure orchestration.
//!
//! Screens hand every failed API call to [`FailureHandler::handle`] with a
//! context label. The handler classifies unconditionally, reports
//! server-class failures to telemetry, and decides whether a blocking alert
//! is shown. Auth failures are returned for the app-level logout
//! interceptor; validation failures are returned for form field state. No
//! category is ever silently dropped: the classified error always comes
//! back to the caller.

use std::sync::Arc;

use tracing::warn;

use crate::domain::classify::{RawFailure, classify};
use crate::domain::error::{ApiError, ErrorCategory};
use crate::domain::ports::{AlertKind, AlertPresenter, FailureMonitor, FailureReport};

/// Caller-selected behaviour for one handled failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleOptions {
    /// Suppress the blocking alert regardless of category (inline rendering).
    pub silent: bool,
}

impl HandleOptions {
    /// Options with the blocking alert suppressed.
    #[must_use]
    pub fn silent() -> Self {
        Self { silent: true }
    }
}

/// Orchestrates classification, telemetry, and alert presentation.
pub struct FailureHandler<M, A> {
    monitor: Arc<M>,
    alerts: Arc<A>,
}

impl<M, A> FailureHandler<M, A> {
    /// Create a handler over the given telemetry and alert collaborators.
    pub fn new(monitor: Arc<M>, alerts: Arc<A>) -> Self {
        Self { monitor, alerts }
    }
}

impl<M: FailureMonitor, A: AlertPresenter> FailureHandler<M, A> {
    /// Classify a raw failure and apply the category's observable behaviour.
    ///
    /// Always returns the classified error; telemetry trouble is logged and
    /// never propagates.
    pub async fn handle(
        &self,
        raw: impl Into<RawFailure>,
        context: &str,
        options: HandleOptions,
    ) -> ApiError {
        let error = classify(raw.into());

        if error.category() == ErrorCategory::Server {
            let report = FailureReport::from_error(&error, context);
            if let Err(delivery) = self.monitor.report(report).await {
                warn!(context, error = %delivery, "failure report not delivered");
            }
        }

        match error.category() {
            // Handled inline: auth triggers the app-level logout
            // interceptor, validation feeds form field errors.
            ErrorCategory::Auth | ErrorCategory::Validation => return error,
            _ => {}
        }

        if options.silent {
            return error;
        }

        let kind = if error.category() == ErrorCategory::Network {
            AlertKind::Connectivity
        } else {
            AlertKind::Generic
        };
        self.alerts.show(kind, error.user_message().to_owned()).await;
        error
    }
}
