//! Mock identity provider for testing.
//!
//! Scriptable sign-in outcomes, a gate to hold sign-in mid-flight, and
//! pushed auth-state transitions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};

use super::lock;
use crate::error::AuthError;
use crate::models::{Credential, UserIdentity};
use crate::traits::{AuthStateListener, IdentityProvider, ListenerRegistration, SignInResult};

type AuthSender = mpsc::UnboundedSender<Option<UserIdentity>>;

/// Mock identity provider.
///
/// Clones share state, so a test can keep one clone for scripting while the
/// session manager owns another.
///
/// # Example
///
/// ```ignore
/// use livesync::adapters::mock::MockIdentityProvider;
///
/// let provider = MockIdentityProvider::new();
/// provider.set_sign_in_result(Err(AuthError::PopupClosed));
///
/// // Simulate the provider restoring a persisted session
/// provider.push_auth_state(Some(UserIdentity::new("alice")));
/// ```
#[derive(Clone)]
pub struct MockIdentityProvider {
    /// User the provider currently considers signed in
    current: Arc<Mutex<Option<UserIdentity>>>,
    /// Outcome of the next interactive sign-in
    sign_in_result: Arc<Mutex<Result<SignInResult, AuthError>>>,
    /// When set, sign-in waits for a notification before completing
    sign_in_gate: Arc<Mutex<Option<Arc<Notify>>>>,
    /// Error returned by sign-out, if any
    sign_out_error: Arc<Mutex<Option<AuthError>>>,
    /// Attached auth-state listeners by registration id
    listeners: Arc<Mutex<HashMap<u64, AuthSender>>>,
    next_listener: Arc<AtomicU64>,
    sign_in_calls: Arc<AtomicUsize>,
}

impl MockIdentityProvider {
    /// Create a provider with nobody signed in. Sign-in succeeds as
    /// `mock-user` with access token `mock-access-token`.
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(None)),
            sign_in_result: Arc::new(Mutex::new(Ok(Self::default_sign_in()))),
            sign_in_gate: Arc::new(Mutex::new(None)),
            sign_out_error: Arc::new(Mutex::new(None)),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener: Arc::new(AtomicU64::new(0)),
            sign_in_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a provider that already has `user` signed in, as if a session
    /// had been restored.
    pub fn with_signed_in_user(user: UserIdentity) -> Self {
        let provider = Self::new();
        *lock(&provider.current) = Some(user);
        provider
    }

    fn default_sign_in() -> SignInResult {
        SignInResult {
            identity: UserIdentity::new("mock-user")
                .with_display_name("Mock User")
                .with_email("mock@example.com"),
            credential: Credential {
                provider_id: "google.com".to_string(),
                access_token: Some("mock-access-token".to_string()),
                id_token: None,
            },
        }
    }

    /// Script the outcome of subsequent sign-ins.
    pub fn set_sign_in_result(&self, result: Result<SignInResult, AuthError>) {
        *lock(&self.sign_in_result) = result;
    }

    /// Succeed subsequent sign-ins as `user` with the given access token.
    pub fn set_sign_in_user(&self, user: UserIdentity, access_token: &str) {
        self.set_sign_in_result(Ok(SignInResult {
            identity: user,
            credential: Credential {
                provider_id: "google.com".to_string(),
                access_token: Some(access_token.to_string()),
                id_token: None,
            },
        }));
    }

    /// Hold subsequent sign-ins until the returned gate is notified.
    pub fn pause_sign_in(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.sign_in_gate) = Some(gate.clone());
        gate
    }

    /// Let sign-ins complete immediately again.
    pub fn resume_sign_in(&self) {
        if let Some(gate) = lock(&self.sign_in_gate).take() {
            gate.notify_waiters();
        }
    }

    pub fn set_sign_out_error(&self, error: Option<AuthError>) {
        *lock(&self.sign_out_error) = error;
    }

    /// Change the provider-side user and notify every attached listener.
    pub fn push_auth_state(&self, user: Option<UserIdentity>) {
        *lock(&self.current) = user.clone();
        self.broadcast(user);
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        lock(&self.current).clone()
    }

    /// Number of auth-state listeners still attached.
    pub fn active_listeners(&self) -> usize {
        lock(&self.listeners).len()
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    fn broadcast(&self, user: Option<UserIdentity>) {
        let mut listeners = lock(&self.listeners);
        listeners.retain(|_, tx| tx.send(user.clone()).is_ok());
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn open_interactive_sign_in(&self) -> Result<SignInResult, AuthError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);

        let gate = lock(&self.sign_in_gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let result = lock(&self.sign_in_result).clone();
        if let Ok(ref signed_in) = result {
            self.push_auth_state(Some(signed_in.identity.clone()));
        }
        result
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let error = lock(&self.sign_out_error).clone();
        if let Some(error) = error {
            return Err(error);
        }

        self.push_auth_state(None);
        Ok(())
    }

    fn watch_auth_state(&self) -> AuthStateListener {
        let (tx, events) = mpsc::unbounded_channel();
        let _ = tx.send(self.current_user());

        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        lock(&self.listeners).insert(id, tx);

        let listeners = Arc::clone(&self.listeners);
        let registration = ListenerRegistration::new(move || {
            lock(&listeners).remove(&id);
        });

        AuthStateListener {
            events,
            registration,
        }
    }
}
