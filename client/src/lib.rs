//! Client core for the vehicle reconditioning and resale app.
//!
//! This crate hosts the pieces every screen depends on: the session and
//! authorization state machine (login, hydration, secure token persistence,
//! role/permission derivation, route guarding) and the error classification
//! pipeline that turns raw transport or backend failures into categorized,
//! user-facing outcomes. The remote REST API, the platform's secure
//! key-value storage, telemetry, alert presentation, and navigation are all
//! external collaborators behind the ports in [`domain::ports`].

pub mod config;
pub mod domain;
pub mod outbound;

pub use domain::classify::{RawFailure, TransportFailure, classify};
pub use domain::error::{ApiError, ErrorCategory};
pub use domain::failure_handler::{FailureHandler, HandleOptions};
pub use domain::route::{GuardDecision, RouteGuard, ScreenPath};
pub use domain::session::{SessionSnapshot, SessionToken};
pub use domain::session_service::{SessionError, SessionService};
pub use domain::user::UserType;

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the JSON tracing subscriber used by the app shell.
///
/// Safe to call more than once; a second initialisation logs a warning and
/// leaves the first subscriber in place.
pub fn init_tracing() {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}
