//! Concrete implementations of trait abstractions.
//!
//! Production bindings to a hosted identity provider and document store are
//! supplied by the embedding application. This module carries the in-process
//! adapters used for tests and the demo binary.
//!
//! # Mock Implementations
//!
//! - [`mock::MockIdentityProvider`] - Scriptable identity provider
//! - [`mock::InMemoryDocumentStore`] - In-memory document store

pub mod mock;

pub use mock::{InMemoryDocumentStore, MockIdentityProvider};
