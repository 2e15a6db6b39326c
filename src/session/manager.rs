//! Session state machine.
//!
//! [`SessionManager`] owns the [`Session`] for one client and bridges the
//! identity provider's push notifications into it:
//!
//! ```text
//! Unknown(loading) ──provider reports user──▶ Authenticated(user)
//!        │                                         │   ▲
//!        └──provider reports none──▶ Anonymous ◀───┘   │
//!                                        └──sign-in────┘
//! ```
//!
//! No state is terminal. The provider listener and the two explicit
//! operations are the only writers.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use crate::error::AuthError;
use crate::models::{AccessToken, Session, SessionPhase, UserId, UserIdentity};
use crate::subscription::{LoadingGuard, SubscriptionHandle};
use crate::traits::{AuthStateListener, IdentityProvider, UserIdSource};

pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<Session>>,
    listener: Option<SubscriptionHandle>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            provider,
            state: Arc::new(state),
            listener: None,
        }
    }

    /// Current session snapshot.
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver notified on every session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().phase()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.state.borrow().user_id().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// True while the auth-state listener is attached and running.
    pub fn has_listener(&self) -> bool {
        self.listener.as_ref().is_some_and(SubscriptionHandle::is_active)
    }

    /// Sign in through the provider's popup flow.
    ///
    /// `loading` is raised for the whole call and lowered on every exit,
    /// including when the returned future is dropped before completion. On
    /// failure the current user is left as it was and the provider's error is
    /// returned unchanged.
    pub async fn sign_in_with_google(&self) -> Result<(UserIdentity, AccessToken), AuthError> {
        let _loading = LoadingGuard::raise(&*self.state);

        let result = self
            .provider
            .open_interactive_sign_in()
            .await
            .map_err(|err| {
                error!(code = err.error_code(), "Error signing in with Google: {}", err);
                err
            })?;

        let token = self
            .provider
            .extract_access_token(&result.credential)
            .map_err(|err| {
                error!(code = err.error_code(), "Error signing in with Google: {}", err);
                err
            })?;

        let identity = result.identity;
        self.state
            .send_modify(|session| session.user = Some(identity.clone()));
        info!(user_id = %identity.uid, "Signed in");

        Ok((identity, token))
    }

    /// Sign out at the provider, then clear the local user.
    pub async fn sign_out_user(&self) -> Result<(), AuthError> {
        if let Err(err) = self.provider.sign_out().await {
            error!(code = err.error_code(), "Error signing out: {}", err);
            return Err(err);
        }

        self.state.send_modify(|session| session.user = None);
        info!("Signed out");
        Ok(())
    }

    /// Attach the standing auth-state listener.
    ///
    /// Any previous listener is released first. Must be called from within a
    /// tokio runtime.
    pub fn init_auth(&mut self) {
        self.release_listener();

        let epoch = self.advance_epoch();
        let AuthStateListener {
            events,
            registration,
        } = self.provider.watch_auth_state();

        let task = tokio::spawn(pump_auth_state(events, Arc::clone(&self.state), epoch));
        self.listener = Some(SubscriptionHandle::new("auth-state", registration, task));
        debug!(epoch, "Auth listener attached");
    }

    /// Detach the auth-state listener if one is attached. Idempotent.
    pub fn cleanup(&mut self) {
        self.release_listener();
    }

    fn release_listener(&mut self) {
        if let Some(handle) = self.listener.take() {
            self.advance_epoch();
            handle.release();
        }
    }

    /// Fence off events from any listener attached before this call.
    fn advance_epoch(&self) -> u64 {
        let mut epoch = 0;
        self.state.send_if_modified(|session| {
            session.listener_epoch += 1;
            epoch = session.listener_epoch;
            false
        });
        epoch
    }
}

impl UserIdSource for SessionManager {
    fn current_user_id(&self) -> Option<UserId> {
        self.user_id()
    }
}

/// Copy provider transitions into the session until the listener closes or
/// is superseded.
async fn pump_auth_state(
    mut events: mpsc::UnboundedReceiver<Option<UserIdentity>>,
    state: Arc<watch::Sender<Session>>,
    epoch: u64,
) {
    while let Some(user) = events.recv().await {
        let user_id = user.as_ref().map(|u| u.uid.clone());
        let applied = state.send_if_modified(|session| {
            if session.listener_epoch != epoch {
                return false;
            }
            session.user = user;
            session.loading = false;
            true
        });

        if !applied {
            debug!(epoch, "Dropping auth event from released listener");
            break;
        }

        match user_id {
            Some(uid) => debug!(user_id = %uid, "Auth state changed: signed in"),
            None => debug!("Auth state changed: signed out"),
        }
    }
}
