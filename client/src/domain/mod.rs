//! Domain types and services for the client core.
//!
//! Purpose: define the session/authorization state machine and the error
//! taxonomy in transport-agnostic terms. Outbound adapters translate wire
//! failures into [`classify::RawFailure`] values; ports in [`ports`] describe
//! the external collaborators (secure storage, telemetry, alerts,
//! navigation) the services drive.

pub mod access;
pub mod classify;
pub mod error;
pub mod failure_handler;
pub mod ports;
pub mod route;
pub mod session;
pub mod session_service;
pub mod user;

pub use self::access::AccessProfile;
pub use self::classify::{RawFailure, TransportFailure, classify};
pub use self::error::{ApiError, ErrorCategory, ValidationErrors};
pub use self::failure_handler::{FailureHandler, HandleOptions};
pub use self::route::{GuardDecision, RouteGuard, ScreenPath, ScreenPathError};
pub use self::session::{InvalidSessionTokenError, SessionSnapshot, SessionToken};
pub use self::session_service::{SessionError, SessionService};
pub use self::user::{UnknownUserTypeError, UserType};
