//! livesync - Reactive auth session and per-user live collection sync
//!
//! Two cooperating layers over an external identity provider and document
//! store:
//!
//! - [`session::SessionManager`] tracks who is signed in.
//! - [`collection::CollectionSync`] keeps a live, newest-first view of that
//!   user's items and routes writes to the store.
//!
//! Both expose their state through `tokio::sync::watch` receivers. External
//! services are reached only through the traits in [`traits`].

pub mod adapters;
pub mod collection;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod session;
pub mod subscription;
pub mod traits;

pub use collection::CollectionSync;
pub use config::{OwnershipCheck, SyncConfig};
pub use error::{AuthError, ListenError, SyncError, SyncResult, WriteError};
pub use session::SessionManager;
