//! Session and authorization state machine.
//!
//! Single writer of session state for the whole process. State moves
//! `Unhydrated` → `Hydrated/Unauthenticated` ⇄ `Hydrated/Authenticated`;
//! observers consume [`SessionSnapshot`] clones over a watch channel and
//! never mutate. Persistence happens strictly before the in-memory commit
//! on login, so a crash mid-login can leave storage populated but never
//! memory authenticated against empty storage.
//!
//! Concurrent auth operations are ordered by a monotonic operation id: a
//! mutation only commits when no newer operation has been issued, so a
//! stale login response can never resurrect a session the user already
//! logged out of. The storage phases themselves are serialized behind a
//! mutex, so a stale operation's writes (or its rollback) can never
//! interleave with a newer operation's writes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tokio::sync::{Mutex, OnceCell, watch};
use tracing::{debug, info, warn};

use crate::domain::access::{AccessProfile, derive_access};
use crate::domain::ports::{CredentialKeys, CredentialStore, CredentialStoreError};
use crate::domain::session::{SessionSnapshot, SessionToken};
use crate::domain::user::UserType;

/// Failures surfaced by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Secure storage rejected a read or write.
    #[error(transparent)]
    Store(#[from] CredentialStoreError),
    /// The user record could not be serialized for persistence.
    #[error("user record could not be serialized: {source}")]
    UserSerialization {
        /// Underlying serialization failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Fully restored persisted session.
struct Restored {
    token: SessionToken,
    user_type: UserType,
    user: Value,
}

/// Process-wide session store backed by a secure credential store.
///
/// Construct one per process (or per test) and share it via `Arc`; there is
/// no module-level global.
pub struct SessionService<S> {
    store: Arc<S>,
    keys: CredentialKeys,
    publisher: watch::Sender<SessionSnapshot>,
    hydration: OnceCell<()>,
    operations: AtomicU64,
    // Serializes the storage phase of restore/login/logout. The operation
    // id orders commits; this orders the writes themselves.
    storage_phase: Mutex<()>,
}

impl<S> SessionService<S> {
    /// Create an unhydrated session store over the given credential store.
    pub fn new(store: Arc<S>, keys: CredentialKeys) -> Self {
        let (publisher, _) = watch::channel(SessionSnapshot::unhydrated());
        Self {
            store,
            keys,
            publisher,
            hydration: OnceCell::new(),
            operations: AtomicU64::new(0),
            storage_phase: Mutex::new(()),
        }
    }

    /// Current state as a read-only snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.publisher.borrow().clone()
    }

    /// Subscribe to state changes (route guard, screens).
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.publisher.subscribe()
    }

    fn next_operation(&self) -> u64 {
        self.operations.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, operation: u64) -> bool {
        self.operations.load(Ordering::SeqCst) == operation
    }

    /// Apply a mutation unless a newer operation has been issued meanwhile.
    fn commit_if_current(
        &self,
        operation: u64,
        apply: impl FnOnce(&mut SessionSnapshot),
    ) -> bool {
        let mut applied = false;
        self.publisher.send_modify(|snapshot| {
            if self.is_current(operation) {
                apply(snapshot);
                applied = true;
            }
        });
        if !applied {
            debug!(operation, "stale session mutation dropped");
        }
        applied
    }

    fn set_loading(&self, operation: u64, loading: bool) {
        self.commit_if_current(operation, |snapshot| snapshot.loading = loading);
    }

    /// Derived access for the current snapshot; empty when signed out.
    pub fn access(&self) -> AccessProfile {
        self.publisher.borrow().access.clone()
    }
}

impl<S: CredentialStore> SessionService<S> {
    /// Restore persisted state exactly once per process lifetime.
    ///
    /// Repeat and concurrent calls collapse onto the first execution. The
    /// store always ends hydrated: storage failures and malformed values
    /// are logged and fall back to the unauthenticated state rather than
    /// leaving dependent navigation stuck.
    pub async fn hydrate(&self) {
        self.hydration.get_or_init(|| self.restore()).await;
    }

    /// Establish a session: persist first, then commit in memory.
    pub async fn login(
        &self,
        token: SessionToken,
        user_type: UserType,
        user: Value,
    ) -> Result<(), SessionError> {
        let operation = self.next_operation();
        self.set_loading(operation, true);

        let serialized_user = match serde_json::to_string(&user) {
            Ok(serialized) => serialized,
            Err(source) => {
                self.set_loading(operation, false);
                return Err(SessionError::UserSerialization { source });
            }
        };

        let _storage = self.storage_phase.lock().await;
        if !self.is_current(operation) {
            debug!(operation, "stale login dropped before persisting");
            return Ok(());
        }

        let persisted = self.persist_login(&token, user_type, &serialized_user).await;
        if let Err(error) = persisted {
            self.set_loading(operation, false);
            return Err(error.into());
        }

        let fingerprint = token.fingerprint();
        let access = derive_access(Some(user_type), Some(&user));
        let committed = self.commit_if_current(operation, |snapshot| {
            snapshot.token = Some(token);
            snapshot.user_type = Some(user_type);
            snapshot.user = Some(user);
            snapshot.access = access;
            snapshot.loading = false;
        });

        if committed {
            info!(
                token_fingerprint = %fingerprint,
                user_type = %user_type,
                "session established"
            );
        } else {
            // A newer logout/login won the race while we were persisting;
            // remove what we just wrote before releasing the storage phase,
            // so the winner's writes land on a clean slate.
            self.clear_persisted_best_effort().await;
        }
        Ok(())
    }

    /// Clear persisted and in-memory state. Idempotent.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let operation = self.next_operation();
        self.set_loading(operation, true);

        let _storage = self.storage_phase.lock().await;
        let cleared = self.store.delete_all(&self.keys.all()).await;

        self.commit_if_current(operation, |snapshot| {
            snapshot.clear_authentication();
            snapshot.loading = false;
        });

        match cleared {
            Ok(()) => {
                info!("session cleared");
                Ok(())
            }
            Err(error) => {
                warn!(error = %error, "persisted credentials could not be cleared");
                Err(error.into())
            }
        }
    }

    /// Replace the in-memory user record (profile refresh).
    ///
    /// Recomputes roles/permissions for the current role; token and
    /// persisted state are untouched.
    pub fn set_user(&self, user: Value) {
        self.publisher.send_modify(|snapshot| {
            snapshot.access = derive_access(snapshot.user_type, Some(&user));
            snapshot.user = Some(user);
        });
    }

    async fn persist_login(
        &self,
        token: &SessionToken,
        user_type: UserType,
        serialized_user: &str,
    ) -> Result<(), CredentialStoreError> {
        self.store.set(self.keys.auth_token(), token.reveal()).await?;
        self.store
            .set(self.keys.user_type(), user_type.as_str())
            .await?;
        self.store.set(self.keys.user_data(), serialized_user).await?;
        Ok(())
    }

    async fn clear_persisted_best_effort(&self) {
        if let Err(error) = self.store.delete_all(&self.keys.all()).await {
            warn!(error = %error, "stale login cleanup failed");
        }
    }

    async fn restore(&self) {
        let operation = self.next_operation();
        let _storage = self.storage_phase.lock().await;
        let restored = match self.read_persisted().await {
            Ok(restored) => restored,
            Err(error) => {
                warn!(error = %error, "session restore failed; starting signed out");
                None
            }
        };

        self.publisher.send_modify(|snapshot| {
            if self.is_current(operation)
                && let Some(restored) = restored
            {
                let access = derive_access(Some(restored.user_type), Some(&restored.user));
                info!(
                    token_fingerprint = %restored.token.fingerprint(),
                    user_type = %restored.user_type,
                    "session restored"
                );
                snapshot.token = Some(restored.token);
                snapshot.user_type = Some(restored.user_type);
                snapshot.user = Some(restored.user);
                snapshot.access = access;
            }
            // Hydration must complete even when restore found nothing or a
            // login raced ahead of it.
            snapshot.hydrated = true;
        });
    }

    async fn read_persisted(&self) -> Result<Option<Restored>, CredentialStoreError> {
        let Some(raw_token) = self.store.get(self.keys.auth_token()).await? else {
            return Ok(None);
        };
        let Some(raw_type) = self.store.get(self.keys.user_type()).await? else {
            return Ok(None);
        };
        let Some(raw_user) = self.store.get(self.keys.user_data()).await? else {
            return Ok(None);
        };

        let Ok(token) = SessionToken::new(raw_token) else {
            warn!("persisted token is malformed; discarding session");
            return Ok(None);
        };
        let user_type = match raw_type.parse::<UserType>() {
            Ok(user_type) => user_type,
            Err(error) => {
                warn!(error = %error, "persisted user type is malformed; discarding session");
                return Ok(None);
            }
        };
        let user = match serde_json::from_str::<Value>(&raw_user) {
            Ok(user) => user,
            Err(error) => {
                warn!(error = %error, "persisted user record is malformed; discarding session");
                return Ok(None);
            }
        };

        Ok(Some(Restored {
            token,
            user_type,
            user,
        }))
    }
}

#[cfg(test)]
mod tests {
    //! Unit coverage; lifecycle and race behaviour live in the integration
    //! suite.
    use super::*;
    use crate::domain::ports::InMemoryCredentialStore;
    use rstest::rstest;
    use serde_json::json;

    fn service() -> SessionService<InMemoryCredentialStore> {
        SessionService::new(
            Arc::new(InMemoryCredentialStore::new()),
            CredentialKeys::default(),
        )
    }

    fn token(raw: &str) -> SessionToken {
        SessionToken::new(raw).expect("valid token")
    }

    #[rstest]
    #[tokio::test]
    async fn login_persists_before_committing() {
        let svc = service();
        svc.login(token("tok123"), UserType::Admin, json!({"name": "A"}))
            .await
            .expect("login succeeds");

        let snapshot = svc.snapshot();
        assert!(snapshot.is_authenticated());
        assert_eq!(snapshot.user_type(), Some(UserType::Admin));
        assert!(!snapshot.is_loading());

        let stored = svc
            .store
            .value(svc.keys.auth_token())
            .await
            .expect("token persisted");
        assert_eq!(stored, "tok123");
    }

    #[rstest]
    #[tokio::test]
    async fn logout_is_idempotent() {
        let svc = service();
        svc.logout().await.expect("first logout succeeds");
        svc.logout().await.expect("repeat logout succeeds");
        assert!(!svc.snapshot().is_authenticated());
    }

    #[rstest]
    #[tokio::test]
    async fn set_user_recomputes_access_without_touching_storage() {
        let svc = service();
        svc.login(token("tok"), UserType::Admin, json!({"permissions": ["a.b"]}))
            .await
            .expect("login succeeds");
        assert!(svc.access().has_permission("a.b"));

        svc.set_user(json!({"permissions": ["c.d"]}));

        assert!(svc.access().has_permission("c.d"));
        assert!(!svc.access().has_permission("a.b"));
        let stored = svc
            .store
            .value(svc.keys.user_data())
            .await
            .expect("persisted user untouched");
        assert!(stored.contains("a.b"));
    }

    #[rstest]
    #[tokio::test]
    async fn repeated_hydrate_calls_are_noops() {
        let svc = service();
        svc.hydrate().await;
        assert!(svc.snapshot().is_hydrated());

        // A login after hydration must survive a second hydrate call.
        svc.login(token("tok"), UserType::Seller, json!({}))
            .await
            .expect("login succeeds");
        svc.hydrate().await;
        assert!(svc.snapshot().is_authenticated());
    }
}
