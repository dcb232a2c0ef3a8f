//! Session state primitives.
//!
//! [`SessionToken`] keeps the bearer credential zeroized in memory and never
//! exposes it through `Debug` or logs; operational visibility comes from a
//! truncated SHA-256 fingerprint instead. [`SessionSnapshot`] is the
//! read-only view of session state handed to observers; authentication is a
//! derived accessor, so no snapshot can hold a token without a role or vice
//! versa being misreported.

use std::fmt;

use serde_json::Value;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::access::AccessProfile;
use crate::domain::user::UserType;

/// Length of the token fingerprint in bytes before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

/// Raised when a bearer token is empty or padded with whitespace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("session token must be a non-empty, untrimmed string")]
pub struct InvalidSessionTokenError;

/// Opaque bearer credential for the authenticated session.
#[derive(Clone)]
pub struct SessionToken(Zeroizing<String>);

impl SessionToken {
    /// Validate and wrap a raw bearer string.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidSessionTokenError> {
        let raw = raw.into();
        if raw.is_empty() || raw.trim() != raw {
            return Err(InvalidSessionTokenError);
        }
        Ok(Self(Zeroizing::new(raw)))
    }

    /// The raw credential, for `Authorization` headers and persistence only.
    pub fn reveal(&self) -> &str {
        self.0.as_str()
    }

    /// Truncated SHA-256 fingerprint for logs and diagnostics.
    ///
    /// First 8 bytes of the hash as a 16-character hex string: enough for
    /// visual distinction without being security-sensitive.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        let digest = hasher.finalize();
        hex::encode(digest.iter().take(FINGERPRINT_BYTES).copied().collect::<Vec<u8>>())
    }
}

impl PartialEq for SessionToken {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl Eq for SessionToken {}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken")
            .field(&self.fingerprint())
            .finish()
    }
}

/// Read-only view of the session published to observers.
///
/// Snapshots are cheap clones; the session service is the single writer and
/// everything else consumes these copies.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub(crate) token: Option<SessionToken>,
    pub(crate) user_type: Option<UserType>,
    pub(crate) user: Option<Value>,
    pub(crate) access: AccessProfile,
    pub(crate) hydrated: bool,
    pub(crate) loading: bool,
}

impl SessionSnapshot {
    /// Initial state before the one-time restore from secure storage.
    pub(crate) fn unhydrated() -> Self {
        Self {
            token: None,
            user_type: None,
            user: None,
            access: AccessProfile::empty(),
            hydrated: false,
            loading: false,
        }
    }

    /// Bearer credential, present iff authenticated.
    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    /// Active role selecting the navigation tree and API surface.
    pub fn user_type(&self) -> Option<UserType> {
        self.user_type
    }

    /// Server-provided profile; shape varies per role.
    pub fn user(&self) -> Option<&Value> {
        self.user.as_ref()
    }

    /// Derived roles and permissions (admin only, empty otherwise).
    pub fn access(&self) -> &AccessProfile {
        &self.access
    }

    /// True iff token, role, and profile are all present.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user_type.is_some() && self.user.is_some()
    }

    /// Whether the one-time restore from storage has completed.
    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Whether an auth operation is currently in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub(crate) fn clear_authentication(&mut self) {
        self.token = None;
        self.user_type = None;
        self.user = None;
        self.access = AccessProfile::empty();
    }
}
