//! Role and permission derivation from the server-supplied profile.
//!
//! Applies only to admins; every other role gets empty collections. The
//! backend is inconsistent about entry shapes: role and permission lists
//! may hold plain strings or objects with a `name` field, so derivation
//! tolerates both and ignores anything else.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::domain::user::UserType;

/// Derived authorization data for the active session.
///
/// `roles` preserves the server's order; `permissions` is a deduplicated,
/// case-sensitive set merging direct permissions with those nested inside
/// each role object. Recomputed wholesale whenever the user record or role
/// changes, never mutated incrementally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessProfile {
    roles: Vec<String>,
    permissions: BTreeSet<String>,
}

impl AccessProfile {
    /// Empty profile used for non-admin roles and signed-out sessions.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Role names in server order.
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Deduplicated permission strings.
    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    /// Whether the session carries the given atomic capability.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// Derive roles and permissions for the given role and profile.
///
/// Non-admin roles and absent profiles always yield empty collections,
/// never an absent value.
#[must_use]
pub fn derive_access(user_type: Option<UserType>, user: Option<&Value>) -> AccessProfile {
    let (Some(UserType::Admin), Some(user)) = (user_type, user) else {
        return AccessProfile::empty();
    };

    let mut roles = Vec::new();
    let mut permissions = BTreeSet::new();

    if let Some(entries) = user.get("roles").and_then(Value::as_array) {
        for entry in entries {
            if let Some(name) = entry_name(entry) {
                roles.push(name.to_owned());
            }
            if let Some(nested) = entry.get("permissions").and_then(Value::as_array) {
                permissions.extend(nested.iter().filter_map(entry_name).map(str::to_owned));
            }
        }
    }

    if let Some(entries) = user.get("permissions").and_then(Value::as_array) {
        permissions.extend(entries.iter().filter_map(entry_name).map(str::to_owned));
    }

    AccessProfile { roles, permissions }
}

/// Entries may be plain strings or objects carrying a `name` field.
fn entry_name(entry: &Value) -> Option<&str> {
    entry
        .as_str()
        .or_else(|| entry.get("name").and_then(Value::as_str))
}
