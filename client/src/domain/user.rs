//! User role primitives.
//!
//! The active role selects the navigation tree and API surface for the whole
//! app. Profiles arrive as loosely-shaped JSON from the backend and are kept
//! as [`serde_json::Value`]; only the role tag itself is strongly typed, and
//! it is validated at the storage boundary (hydrate/login) rather than
//! trusted downstream.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Raised when a persisted or wire role tag is not one of the known roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown user type: {raw}")]
pub struct UnknownUserTypeError {
    raw: String,
}

/// Role under which a user operates the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// Back-office administrator; the only role with derived roles/permissions.
    Admin,
    /// Sales staff.
    Seller,
    /// Workshop mechanic.
    Mechanic,
    /// Capital partner with read-mostly dashboards.
    Investor,
}

impl UserType {
    /// Stable string tag used in persistence and on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Seller => "seller",
            Self::Mechanic => "mechanic",
            Self::Investor => "investor",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = UnknownUserTypeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "admin" => Ok(Self::Admin),
            "seller" => Ok(Self::Seller),
            "mechanic" => Ok(Self::Mechanic),
            "investor" => Ok(Self::Investor),
            _ => Err(UnknownUserTypeError { raw: raw.to_owned() }),
        }
    }
}
