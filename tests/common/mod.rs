//! Common test utilities for integration tests.
//!
//! Provides identity fixtures, document builders, a pre-wired
//! session + collection harness over the mock adapters, and bounded wait
//! helpers for watch-based state.
//!
//! # Example
//!
//! ```ignore
//! let mut h = Harness::signed_in(alice()).await;
//! h.sync.subscribe_to_items();
//! let view = wait_view(&h.sync, |v| !v.loading).await;
//! ```

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use livesync::adapters::{InMemoryDocumentStore, MockIdentityProvider};
use livesync::collection::encode_timestamp;
use livesync::models::{CollectionView, Document, Fields, Session, UserIdentity};
use livesync::{CollectionSync, SessionManager, SyncConfig};

/// Upper bound for any single wait in a test.
pub const WAIT: Duration = Duration::from_secs(2);

pub fn alice() -> UserIdentity {
    UserIdentity::new("alice")
        .with_display_name("Alice")
        .with_email("alice@example.com")
}

pub fn bob() -> UserIdentity {
    UserIdentity::new("bob").with_display_name("Bob")
}

/// Unwrap a JSON object literal into document fields.
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

/// A stored item document as the store would deliver it.
pub fn item_doc(id: &str, owner: &str, created_at: &str, title: &str) -> Document {
    Document::new(
        id,
        fields(serde_json::json!({
            "userId": owner,
            "createdAt": created_at,
            "updatedAt": created_at,
            "title": title,
        })),
    )
}

/// Fields for seeding the store with [`InMemoryDocumentStore::insert_document`].
pub fn item_fields(owner: &str, created_at: chrono::DateTime<chrono::Utc>, title: &str) -> Fields {
    let mut out = Fields::new();
    out.insert("userId".to_string(), Value::String(owner.to_string()));
    out.insert("createdAt".to_string(), encode_timestamp(created_at));
    out.insert("updatedAt".to_string(), encode_timestamp(created_at));
    out.insert("title".to_string(), Value::String(title.to_string()));
    out
}

/// Session manager and collection sync wired over shared mocks.
pub struct Harness {
    pub provider: MockIdentityProvider,
    pub store: InMemoryDocumentStore,
    pub session: SessionManager,
    pub sync: CollectionSync,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    pub fn with_config(config: SyncConfig) -> Self {
        let provider = MockIdentityProvider::new();
        let store = InMemoryDocumentStore::new();
        let session = SessionManager::new(Arc::new(provider.clone()));
        let sync = CollectionSync::new(Arc::new(store.clone()), session.subscribe(), &config);
        Self {
            provider,
            store,
            session,
            sync,
        }
    }

    /// Harness with `user` already signed in through the popup flow.
    pub async fn signed_in(user: UserIdentity) -> Self {
        let harness = Self::new();
        harness.sign_in(user).await;
        harness
    }

    pub async fn sign_in(&self, user: UserIdentity) {
        self.provider.set_sign_in_user(user, "test-access-token");
        self.session
            .sign_in_with_google()
            .await
            .expect("sign-in should succeed");
    }
}

/// Wait until the collection view satisfies `done`.
pub async fn wait_view(
    sync: &CollectionSync,
    done: impl FnMut(&CollectionView) -> bool,
) -> CollectionView {
    let mut rx = sync.subscribe();
    let view = tokio::time::timeout(WAIT, rx.wait_for(done))
        .await
        .expect("timed out waiting for collection view")
        .expect("collection state closed");
    view.clone()
}

/// Wait until the session satisfies `done`.
pub async fn wait_session(
    session: &SessionManager,
    done: impl FnMut(&Session) -> bool,
) -> Session {
    let mut rx = session.subscribe();
    let state = tokio::time::timeout(WAIT, rx.wait_for(done))
        .await
        .expect("timed out waiting for session")
        .expect("session state closed");
    state.clone()
}

/// Give spawned pump tasks a chance to run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(25)).await;
}
