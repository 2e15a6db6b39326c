//! Mock implementations for testing.
//!
//! In-process stand-ins for the identity provider and the document store,
//! used by unit tests, integration tests and the demo binary.
//!
//! # Available Mocks
//!
//! - [`MockIdentityProvider`] - Scriptable sign-in with pushed auth transitions
//! - [`InMemoryDocumentStore`] - Document store with live query evaluation

pub mod identity;
pub mod store;

pub use identity::MockIdentityProvider;
pub use store::InMemoryDocumentStore;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mock's state, recovering from a panic in another test thread.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
