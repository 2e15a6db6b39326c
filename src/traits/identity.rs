//! Identity provider trait abstraction.
//!
//! Provides a trait-based abstraction over the external identity provider,
//! enabling dependency injection and mocking in tests.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::listener::ListenerRegistration;
use crate::error::AuthError;
use crate::models::{AccessToken, Credential, UserIdentity};

/// Outcome of a completed interactive sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct SignInResult {
    pub identity: UserIdentity,
    pub credential: Credential,
}

/// A standing auth-state listener.
///
/// `events` yields the signed-in identity (or `None`) on every transition,
/// starting with the state at registration time. Dropping `registration`
/// detaches the listener and closes the channel.
#[derive(Debug)]
pub struct AuthStateListener {
    pub events: mpsc::UnboundedReceiver<Option<UserIdentity>>,
    pub registration: ListenerRegistration,
}

/// Trait for identity provider operations.
///
/// # Example
///
/// ```ignore
/// use livesync::traits::IdentityProvider;
///
/// async fn login<P: IdentityProvider>(provider: &P) -> Result<(), AuthError> {
///     let result = provider.open_interactive_sign_in().await?;
///     let token = provider.extract_access_token(&result.credential)?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run the interactive popup consent flow.
    ///
    /// Fails with [`AuthError::PopupClosed`] when the user dismisses the
    /// popup, or with the provider's rejection / network error.
    async fn open_interactive_sign_in(&self) -> Result<SignInResult, AuthError>;

    /// Sign the current user out at the provider.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Register a standing listener for auth-state transitions.
    fn watch_auth_state(&self) -> AuthStateListener;

    /// Pull the OAuth access token out of a sign-in credential.
    fn extract_access_token(&self, credential: &Credential) -> Result<AccessToken, AuthError> {
        credential
            .access_token
            .as_deref()
            .map(AccessToken::new)
            .ok_or(AuthError::MissingCredential)
    }
}
