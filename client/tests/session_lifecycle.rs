//! Behavioural tests for the session state machine.
//!
//! Covers the full lifecycle (hydrate, login, logout, profile refresh)
//! including storage failures and the login/logout race, using in-test
//! store doubles instead of platform keystores.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use client::domain::ports::{
    CredentialKeys, CredentialStore, CredentialStoreError, InMemoryCredentialStore,
};
use client::domain::{SessionService, SessionToken, UserType};
use rstest::{fixture, rstest};
use serde_json::json;
use tokio::sync::Notify;

#[fixture]
fn keys() -> CredentialKeys {
    CredentialKeys::default()
}

fn token(raw: &str) -> SessionToken {
    SessionToken::new(raw).expect("valid token")
}

/// Store whose every operation fails, as a sealed platform keystore would.
struct FailingStore;

#[async_trait]
impl CredentialStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, CredentialStoreError> {
        Err(CredentialStoreError::backend("keystore sealed"))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), CredentialStoreError> {
        Err(CredentialStoreError::backend("keystore sealed"))
    }

    async fn delete(&self, _key: &str) -> Result<(), CredentialStoreError> {
        Err(CredentialStoreError::backend("keystore sealed"))
    }
}

/// Store that parks the first `set` until released, so a test can interleave
/// another operation in the middle of a login's persistence phase.
struct GatedStore {
    inner: InMemoryCredentialStore,
    gate_armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl GatedStore {
    fn new() -> Self {
        Self {
            inner: InMemoryCredentialStore::new(),
            gate_armed: AtomicBool::new(true),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl CredentialStore for GatedStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CredentialStoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CredentialStoreError> {
        if self.gate_armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), CredentialStoreError> {
        self.inner.delete(key).await
    }
}

#[rstest]
#[tokio::test]
async fn login_then_logout_round_trips_the_session(keys: CredentialKeys) {
    let store = Arc::new(InMemoryCredentialStore::new());
    let svc = SessionService::new(Arc::clone(&store), keys.clone());
    svc.hydrate().await;

    svc.login(token("tok123"), UserType::Admin, json!({"name": "A"}))
        .await
        .expect("login succeeds");

    let snapshot = svc.snapshot();
    assert!(snapshot.is_authenticated());
    assert!(snapshot.token().is_some());
    assert_eq!(snapshot.user_type(), Some(UserType::Admin));
    assert_eq!(
        store.value(keys.auth_token()).await.as_deref(),
        Some("tok123")
    );

    svc.logout().await.expect("logout succeeds");

    let snapshot = svc.snapshot();
    assert!(!snapshot.is_authenticated());
    assert!(snapshot.token().is_none());
    assert!(snapshot.user_type().is_none());
    assert!(store.is_empty().await);
}

#[rstest]
#[tokio::test]
async fn hydrate_restores_a_persisted_admin_session(keys: CredentialKeys) {
    let store = Arc::new(InMemoryCredentialStore::new());
    let user = json!({
        "roles": [{ "name": "manager", "permissions": [{ "name": "vehicles.create" }] }],
        "permissions": ["users.view"]
    });
    store
        .set(keys.auth_token(), "tok123")
        .await
        .expect("seed token");
    store
        .set(keys.user_type(), "admin")
        .await
        .expect("seed role");
    store
        .set(keys.user_data(), &user.to_string())
        .await
        .expect("seed profile");

    let svc = SessionService::new(store, keys);
    svc.hydrate().await;

    let snapshot = svc.snapshot();
    assert!(snapshot.is_hydrated());
    assert!(snapshot.is_authenticated());
    assert_eq!(snapshot.access().roles(), ["manager"]);
    assert!(snapshot.access().has_permission("vehicles.create"));
    assert!(snapshot.access().has_permission("users.view"));
}

#[rstest]
#[case::empty_storage(None, None, None)]
#[case::missing_role(Some("tok"), None, Some("{}"))]
#[case::unknown_role(Some("tok"), Some("owner"), Some("{}"))]
#[case::corrupt_profile(Some("tok"), Some("seller"), Some("{not json"))]
#[tokio::test]
async fn hydrate_falls_back_to_signed_out_on_bad_state(
    keys: CredentialKeys,
    #[case] stored_token: Option<&str>,
    #[case] stored_role: Option<&str>,
    #[case] stored_user: Option<&str>,
) {
    let store = Arc::new(InMemoryCredentialStore::new());
    if let Some(value) = stored_token {
        store.set(keys.auth_token(), value).await.expect("seed");
    }
    if let Some(value) = stored_role {
        store.set(keys.user_type(), value).await.expect("seed");
    }
    if let Some(value) = stored_user {
        store.set(keys.user_data(), value).await.expect("seed");
    }

    let svc = SessionService::new(store, keys);
    svc.hydrate().await;

    let snapshot = svc.snapshot();
    assert!(snapshot.is_hydrated());
    assert!(!snapshot.is_authenticated());
}

#[rstest]
#[tokio::test]
async fn hydrate_terminates_even_when_storage_fails(keys: CredentialKeys) {
    let svc = SessionService::new(Arc::new(FailingStore), keys);
    svc.hydrate().await;

    let snapshot = svc.snapshot();
    assert!(snapshot.is_hydrated());
    assert!(!snapshot.is_authenticated());
}

#[rstest]
#[tokio::test]
async fn concurrent_hydrate_calls_collapse_to_one(keys: CredentialKeys) {
    let svc = Arc::new(SessionService::new(
        Arc::new(InMemoryCredentialStore::new()),
        keys,
    ));
    let (first, second) = tokio::join!(svc.hydrate(), svc.hydrate());
    let ((), ()) = (first, second);
    assert!(svc.snapshot().is_hydrated());
}

#[rstest]
#[tokio::test]
async fn failed_login_leaves_the_session_signed_out(keys: CredentialKeys) {
    let svc = SessionService::new(Arc::new(FailingStore), keys);
    svc.hydrate().await;

    let result = svc
        .login(token("tok"), UserType::Seller, json!({"name": "S"}))
        .await;

    assert!(result.is_err());
    let snapshot = svc.snapshot();
    assert!(!snapshot.is_authenticated());
    assert!(!snapshot.is_loading());
}

#[rstest]
#[tokio::test]
async fn logout_clears_memory_even_when_storage_fails(keys: CredentialKeys) {
    let svc = SessionService::new(Arc::new(FailingStore), keys);
    svc.hydrate().await;

    let result = svc.logout().await;

    assert!(result.is_err());
    assert!(!svc.snapshot().is_authenticated());
}

#[rstest]
#[tokio::test]
async fn stale_login_never_overrides_a_later_logout(keys: CredentialKeys) {
    let store = Arc::new(GatedStore::new());
    let svc = Arc::new(SessionService::new(Arc::clone(&store), keys.clone()));
    svc.hydrate().await;

    let login_task = {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move {
            svc.login(token("stale-tok"), UserType::Admin, json!({"name": "A"}))
                .await
        })
    };

    // Wait for the login to park inside its persistence phase, then start a
    // user-initiated logout. The logout queues behind the login's storage
    // phase but draws the newer operation id, so the login's commit is
    // dropped when the gate opens.
    store.entered.notified().await;
    let logout_task = {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move { svc.logout().await })
    };
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
    store.release.notify_one();

    login_task
        .await
        .expect("login task completes")
        .expect("stale login returns without error");
    logout_task
        .await
        .expect("logout task completes")
        .expect("logout succeeds");

    let snapshot = svc.snapshot();
    assert!(!snapshot.is_authenticated());
    assert!(snapshot.token().is_none());
    assert!(snapshot.user_type().is_none());
    assert!(!snapshot.is_loading());
    assert!(store.inner.is_empty().await, "stale credentials must be rolled back");
}

#[rstest]
#[tokio::test]
async fn slow_login_never_clobbers_a_newer_login(keys: CredentialKeys) {
    let store = Arc::new(GatedStore::new());
    let svc = Arc::new(SessionService::new(Arc::clone(&store), keys.clone()));
    svc.hydrate().await;

    let stale_task = {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move {
            svc.login(token("stale-tok"), UserType::Admin, json!({"name": "A"}))
                .await
        })
    };
    store.entered.notified().await;

    // A second login arrives while the first is still persisting; it must
    // win both in memory and in storage.
    let fresh_task = {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move {
            svc.login(token("fresh-tok"), UserType::Seller, json!({"name": "B"}))
                .await
        })
    };
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
    store.release.notify_one();

    stale_task
        .await
        .expect("stale login task completes")
        .expect("stale login returns without error");
    fresh_task
        .await
        .expect("fresh login task completes")
        .expect("fresh login succeeds");

    let snapshot = svc.snapshot();
    assert!(snapshot.is_authenticated());
    assert_eq!(snapshot.user_type(), Some(UserType::Seller));
    assert_eq!(
        store.inner.value(keys.auth_token()).await.as_deref(),
        Some("fresh-tok"),
        "storage must hold the committed login's credentials"
    );
    assert_eq!(
        store.inner.value(keys.user_type()).await.as_deref(),
        Some("seller")
    );
}

#[rstest]
#[tokio::test]
async fn set_user_refreshes_access_for_the_active_role(keys: CredentialKeys) {
    let svc = SessionService::new(Arc::new(InMemoryCredentialStore::new()), keys);
    svc.hydrate().await;
    svc.login(
        token("tok"),
        UserType::Admin,
        json!({"permissions": ["vehicles.view"]}),
    )
    .await
    .expect("login succeeds");

    svc.set_user(json!({"permissions": ["vehicles.view", "vehicles.create"]}));

    let snapshot = svc.snapshot();
    assert!(snapshot.is_authenticated());
    assert!(snapshot.access().has_permission("vehicles.create"));
}

#[rstest]
#[tokio::test]
async fn subscribers_observe_state_transitions(keys: CredentialKeys) {
    let svc = SessionService::new(Arc::new(InMemoryCredentialStore::new()), keys);
    let mut sessions = svc.subscribe();
    assert!(!sessions.borrow_and_update().is_hydrated());

    svc.hydrate().await;
    sessions.changed().await.expect("hydration is published");
    assert!(sessions.borrow_and_update().is_hydrated());

    svc.login(token("tok"), UserType::Mechanic, json!({}))
        .await
        .expect("login succeeds");
    assert!(svc.snapshot().is_authenticated());
}
