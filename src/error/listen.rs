//! Live query listener errors.
//!
//! These are delivered through the listener's event channel rather than
//! returned from a call. A listener that reports one is finished.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenError {
    /// The store connection dropped.
    Unavailable { message: String },

    /// Store-side rules refused the query.
    PermissionDenied { message: String },

    /// The store cancelled the listener.
    Cancelled,

    /// Anything else the store reported.
    Other { message: String },
}

impl ListenError {
    pub fn user_message(&self) -> String {
        match self {
            ListenError::Unavailable { .. } => {
                "Live updates stopped because the server is unreachable.".to_string()
            }
            ListenError::PermissionDenied { .. } => {
                "You don't have permission to view these items.".to_string()
            }
            ListenError::Cancelled => "Live updates were cancelled.".to_string(),
            ListenError::Other { .. } => "Live updates stopped unexpectedly.".to_string(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ListenError::Unavailable { .. } => "E_LISTEN_UNAVAILABLE",
            ListenError::PermissionDenied { .. } => "E_LISTEN_DENIED",
            ListenError::Cancelled => "E_LISTEN_CANCELLED",
            ListenError::Other { .. } => "E_LISTEN_OTHER",
        }
    }
}

impl fmt::Display for ListenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenError::Unavailable { message } => write!(f, "Listener disconnected: {}", message),
            ListenError::PermissionDenied { message } => {
                write!(f, "Listener permission denied: {}", message)
            }
            ListenError::Cancelled => write!(f, "Listener cancelled by store"),
            ListenError::Other { message } => write!(f, "Listener error: {}", message),
        }
    }
}

impl std::error::Error for ListenError {}
