//! Authentication session management.

mod manager;

pub use manager::SessionManager;
