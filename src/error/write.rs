//! Document store write errors.

use std::fmt;

/// Failures of create, update and delete calls against the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// The store could not be reached.
    Unavailable { message: String },

    /// Store-side rules refused the write.
    PermissionDenied { message: String },

    /// The target document does not exist.
    NotFound { id: String },

    /// The store refused the payload shape.
    InvalidPayload { message: String },

    /// Local ownership check refused the write.
    NotOwner { id: String },
}

impl WriteError {
    /// Check if the write may succeed when repeated unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WriteError::Unavailable { .. })
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            WriteError::Unavailable { .. } => {
                "Your change could not be saved because the server is unreachable.".to_string()
            }
            WriteError::PermissionDenied { .. } => {
                "You don't have permission to change this item.".to_string()
            }
            WriteError::NotFound { .. } => "This item no longer exists.".to_string(),
            WriteError::InvalidPayload { .. } => "The item could not be saved.".to_string(),
            WriteError::NotOwner { .. } => "This item belongs to another user.".to_string(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            WriteError::Unavailable { .. } => "E_WRITE_UNAVAILABLE",
            WriteError::PermissionDenied { .. } => "E_WRITE_DENIED",
            WriteError::NotFound { .. } => "E_WRITE_NOT_FOUND",
            WriteError::InvalidPayload { .. } => "E_WRITE_PAYLOAD",
            WriteError::NotOwner { .. } => "E_WRITE_NOT_OWNER",
        }
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::Unavailable { message } => write!(f, "Store unavailable: {}", message),
            WriteError::PermissionDenied { message } => {
                write!(f, "Write permission denied: {}", message)
            }
            WriteError::NotFound { id } => write!(f, "Document '{}' not found", id),
            WriteError::InvalidPayload { message } => write!(f, "Invalid payload: {}", message),
            WriteError::NotOwner { id } => {
                write!(f, "Document '{}' is not owned by the current user", id)
            }
        }
    }
}

impl std::error::Error for WriteError {}
