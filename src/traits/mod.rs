//! Trait abstractions for dependency injection and testability.
//!
//! The external services sit behind these traits so the sync engine can be
//! driven by real clients in production and by the mocks in
//! [`crate::adapters::mock`] in tests.
//!
//! # Traits
//!
//! - [`IdentityProvider`] - Interactive sign-in, sign-out, auth-state push
//! - [`DocumentStore`] - Document writes and live queries
//! - [`UserIdSource`] - Reactive current-user lookup for the collection layer

pub mod identity;
pub mod listener;
pub mod store;
pub mod user_source;

pub use identity::{AuthStateListener, IdentityProvider, SignInResult};
pub use listener::ListenerRegistration;
pub use store::{DocumentStore, LiveQuery, QueryEvent};
pub use user_source::UserIdSource;
