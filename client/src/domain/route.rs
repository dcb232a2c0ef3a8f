//! Route guarding and role-based home routing.
//!
//! The guard is a side-effecting observer: it watches session snapshots and
//! sends unauthenticated traffic back to the login flow. It never redirects
//! authenticated users; picking the role-appropriate home screen is the
//! entry screen's job, expressed here as the [`home_path`] switch with a
//! safe fallback to login.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::domain::ports::Navigator;
use crate::domain::session::SessionSnapshot;
use crate::domain::user::UserType;

const LOGIN_PATH: &str = "/login";

/// Raised for screen paths that are empty, unanchored, or contain whitespace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("screen path must be non-empty, start with '/', and contain no whitespace: {raw}")]
pub struct ScreenPathError {
    raw: String,
}

/// Normalized location within the app's navigation tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScreenPath(String);

impl ScreenPath {
    /// Validate and construct a path.
    pub fn new(raw: impl Into<String>) -> Result<Self, ScreenPathError> {
        let raw = raw.into();
        if raw.is_empty() || !raw.starts_with('/') || raw.chars().any(char::is_whitespace) {
            return Err(ScreenPathError { raw });
        }
        Ok(Self(raw))
    }

    /// Entry point of the login flow.
    #[must_use]
    pub fn login() -> Self {
        Self(LOGIN_PATH.to_owned())
    }

    /// Whether the path is reachable without authentication.
    ///
    /// The login flow lives under `/login` and `/auth/` (password reset,
    /// verification deep links).
    pub fn is_public(&self) -> bool {
        self.0 == LOGIN_PATH
            || self.0.starts_with("/login/")
            || self.0.starts_with("/auth/")
    }
}

impl AsRef<str> for ScreenPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScreenPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of evaluating the guard for one snapshot/location pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Not hydrated yet: render a loading state, do not redirect.
    Hold,
    /// Traffic may stay where it is.
    Allow,
    /// Unauthenticated traffic on a protected screen: go to login.
    RedirectToLogin,
}

/// Evaluate the guard for the given session state and location.
#[must_use]
pub fn evaluate(snapshot: &SessionSnapshot, location: &ScreenPath) -> GuardDecision {
    if !snapshot.is_hydrated() {
        return GuardDecision::Hold;
    }
    if !snapshot.is_authenticated() && !location.is_public() {
        return GuardDecision::RedirectToLogin;
    }
    GuardDecision::Allow
}

/// Role-appropriate home screen, falling back to login for a missing or
/// unrecognised role.
#[must_use]
pub fn home_path(user_type: Option<UserType>) -> ScreenPath {
    let path = match user_type {
        Some(UserType::Admin) => "/admin/dashboard",
        Some(UserType::Seller) => "/seller/dashboard",
        Some(UserType::Mechanic) => "/mechanic/dashboard",
        Some(UserType::Investor) => "/investor/dashboard",
        None => LOGIN_PATH,
    };
    ScreenPath(path.to_owned())
}

/// Observer that applies [`evaluate`] on every session change.
pub struct RouteGuard<N> {
    navigator: Arc<N>,
}

impl<N: Navigator> RouteGuard<N> {
    /// Create a guard driving the given navigator.
    pub fn new(navigator: Arc<N>) -> Self {
        Self { navigator }
    }

    /// Watch session snapshots until the session service is dropped.
    ///
    /// Each change (including the initial state) re-evaluates the guard
    /// against the navigator's current location and redirects to login when
    /// required.
    pub async fn run(&self, mut sessions: watch::Receiver<SessionSnapshot>) {
        loop {
            let snapshot = sessions.borrow_and_update().clone();
            let location = self.navigator.current_location().await;
            if evaluate(&snapshot, &location) == GuardDecision::RedirectToLogin {
                debug!(from = %location, "unauthenticated traffic redirected to login");
                self.navigator.redirect(ScreenPath::login()).await;
            }
            if sessions.changed().await.is_err() {
                break;
            }
        }
    }
}
