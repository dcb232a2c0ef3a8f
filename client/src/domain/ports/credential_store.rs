//! Port abstraction for the platform's secure key-value storage.
//!
//! The host platform provides encrypted-at-rest storage for credentials
//! (keychain/keystore). The session service is the only writer of the keys
//! it manages; each key's accessors are independently atomic and no ordering
//! is guaranteed across keys.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::define_port_error;

define_port_error! {
    /// Failures raised by secure storage adapters.
    pub enum CredentialStoreError {
        /// The platform keystore rejected or failed the operation.
        Backend { message: String } => "credential store backend failed: {message}",
    }
}

/// Storage keys managed by the session service, namespaced per install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialKeys {
    auth_token: String,
    refresh_token: String,
    user_type: String,
    user_data: String,
}

impl CredentialKeys {
    /// Build the key set under the given namespace.
    #[must_use]
    pub fn namespaced(namespace: &str) -> Self {
        Self {
            auth_token: format!("{namespace}.auth_token"),
            refresh_token: format!("{namespace}.refresh_token"),
            user_type: format!("{namespace}.user_type"),
            user_data: format!("{namespace}.user_data"),
        }
    }

    /// Key holding the opaque bearer token.
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// Key holding the optional refresh token.
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// Key holding the role tag.
    pub fn user_type(&self) -> &str {
        &self.user_type
    }

    /// Key holding the JSON-serialized user record.
    pub fn user_data(&self) -> &str {
        &self.user_data
    }

    /// Every managed key, for bulk clearing on logout.
    pub fn all(&self) -> [&str; 4] {
        [
            &self.auth_token,
            &self.refresh_token,
            &self.user_type,
            &self.user_data,
        ]
    }
}

impl Default for CredentialKeys {
    fn default() -> Self {
        Self::namespaced("recon")
    }
}

/// Secure key-value storage for opaque credential strings.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch a value by key; absent keys are `Ok(None)`, not errors.
    async fn get(&self, key: &str) -> Result<Option<String>, CredentialStoreError>;

    /// Persist a value under a key, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), CredentialStoreError>;

    /// Remove a key; removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), CredentialStoreError>;

    /// Remove every listed key. Missing keys are not errors.
    async fn delete_all(&self, keys: &[&str]) -> Result<(), CredentialStoreError> {
        for key in keys {
            self.delete(key).await?;
        }
        Ok(())
    }
}

/// In-memory store used by tests and development builds.
///
/// Provides the port contract without platform encryption; never ship real
/// credentials through it.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot a stored value for assertions.
    pub async fn value(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CredentialStoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CredentialStoreError> {
        self.entries
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CredentialStoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
