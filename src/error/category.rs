//! Error category classification.
//!
//! A coarse grouping so callers can pick a recovery strategy without
//! matching on every variant.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The provider or store could not be reached.
    /// Transient; the caller may try again.
    Network,

    /// Sign-in did not produce a usable session.
    Auth,

    /// Server-side rules or local ownership refused the operation.
    Permission,

    /// The user cancelled, or the target no longer exists.
    User,

    /// Malformed data crossing the store boundary.
    Client,

    /// Invalid or missing configuration.
    Configuration,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Permission => "permission",
            ErrorCategory::User => "user",
            ErrorCategory::Client => "client",
            ErrorCategory::Configuration => "configuration",
        }
    }

    /// Returns suggested recovery actions for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check your internet connection and try again",
            ErrorCategory::Auth => "Try signing out and signing back in",
            ErrorCategory::Permission => "Make sure you are signed in with the right account",
            ErrorCategory::User => "Refresh the list and try again",
            ErrorCategory::Client => "This may be a bug. Please report this issue if it persists",
            ErrorCategory::Configuration => "Check your configuration settings",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
