//! Unified error type for callers composing the session and collection layers.

use std::fmt;

use super::auth::AuthError;
use super::category::ErrorCategory;
use super::listen::ListenError;
use super::write::WriteError;
use crate::config::ConfigError;

/// Every error this crate can hand back, in one enum.
///
/// The individual operations return their own narrow error type; this exists
/// so application code can use `?` across both components.
#[derive(Debug)]
pub enum SyncError {
    /// Sign-in or sign-out failed.
    Auth(AuthError),

    /// A create, update or delete failed.
    Write(WriteError),

    /// A live listener reported an error.
    Listen(ListenError),

    /// Configuration could not be loaded.
    Config(ConfigError),
}

impl SyncError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::Auth(err) => match err {
                AuthError::Network { .. } => ErrorCategory::Network,
                AuthError::PopupClosed => ErrorCategory::User,
                _ => ErrorCategory::Auth,
            },
            SyncError::Write(err) => match err {
                WriteError::Unavailable { .. } => ErrorCategory::Network,
                WriteError::PermissionDenied { .. } | WriteError::NotOwner { .. } => {
                    ErrorCategory::Permission
                }
                WriteError::NotFound { .. } => ErrorCategory::User,
                WriteError::InvalidPayload { .. } => ErrorCategory::Client,
            },
            SyncError::Listen(err) => match err {
                ListenError::Unavailable { .. } => ErrorCategory::Network,
                ListenError::PermissionDenied { .. } => ErrorCategory::Permission,
                ListenError::Cancelled | ListenError::Other { .. } => ErrorCategory::Client,
            },
            SyncError::Config(_) => ErrorCategory::Configuration,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Auth(err) => err.user_message(),
            SyncError::Write(err) => err.user_message(),
            SyncError::Listen(err) => err.user_message(),
            SyncError::Config(err) => format!("Invalid configuration: {}", err),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            SyncError::Auth(err) => err.error_code(),
            SyncError::Write(err) => err.error_code(),
            SyncError::Listen(err) => err.error_code(),
            SyncError::Config(_) => "E_CONFIG",
        }
    }

    /// Get the recovery hint for this error.
    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Auth(err) => write!(f, "{}", err),
            SyncError::Write(err) => write!(f, "{}", err),
            SyncError::Listen(err) => write!(f, "{}", err),
            SyncError::Config(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Auth(err) => Some(err),
            SyncError::Write(err) => Some(err),
            SyncError::Listen(err) => Some(err),
            SyncError::Config(err) => Some(err),
        }
    }
}

impl From<AuthError> for SyncError {
    fn from(err: AuthError) -> Self {
        SyncError::Auth(err)
    }
}

impl From<WriteError> for SyncError {
    fn from(err: WriteError) -> Self {
        SyncError::Write(err)
    }
}

impl From<ListenError> for SyncError {
    fn from(err: ListenError) -> Self {
        SyncError::Listen(err)
    }
}

impl From<ConfigError> for SyncError {
    fn from(err: ConfigError) -> Self {
        SyncError::Config(err)
    }
}
