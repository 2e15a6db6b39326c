//! Authentication error types.
//!
//! Errors raised by the identity provider during interactive sign-in,
//! sign-out, or credential handling.

use std::fmt;

/// Authentication-specific error variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The user dismissed the sign-in popup before completing consent.
    PopupClosed,

    /// The provider rejected the sign-in attempt.
    Rejected { message: String },

    /// The provider could not be reached.
    Network { message: String },

    /// The sign-in result carried no usable access token.
    MissingCredential,

    /// The provider refused to sign the user out.
    SignOutFailed { message: String },
}

impl AuthError {
    /// Check if the user cancelled the flow themselves.
    pub fn is_user_cancelled(&self) -> bool {
        matches!(self, AuthError::PopupClosed)
    }

    /// Check if repeating the same call could succeed without user changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Network { .. })
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::PopupClosed => "Sign-in was cancelled.".to_string(),
            AuthError::Rejected { .. } => {
                "The sign-in request was rejected. Please try again.".to_string()
            }
            AuthError::Network { .. } => {
                "Could not reach the sign-in service. Check your connection.".to_string()
            }
            AuthError::MissingCredential => {
                "Sign-in finished without an access token. Please sign in again.".to_string()
            }
            AuthError::SignOutFailed { .. } => "Could not sign you out. Please retry.".to_string(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::PopupClosed => "E_AUTH_POPUP_CLOSED",
            AuthError::Rejected { .. } => "E_AUTH_REJECTED",
            AuthError::Network { .. } => "E_AUTH_NETWORK",
            AuthError::MissingCredential => "E_AUTH_NO_CREDENTIAL",
            AuthError::SignOutFailed { .. } => "E_AUTH_SIGN_OUT",
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::PopupClosed => write!(f, "Sign-in popup closed by user"),
            AuthError::Rejected { message } => write!(f, "Sign-in rejected: {}", message),
            AuthError::Network { message } => write!(f, "Identity provider unreachable: {}", message),
            AuthError::MissingCredential => write!(f, "Credential has no access token"),
            AuthError::SignOutFailed { message } => write!(f, "Sign-out failed: {}", message),
        }
    }
}

impl std::error::Error for AuthError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popup_closed_is_user_cancelled() {
        let err = AuthError::PopupClosed;
        assert!(err.is_user_cancelled());
        assert!(!err.is_retryable());
        assert_eq!(err.error_code(), "E_AUTH_POPUP_CLOSED");
        assert!(err.user_message().contains("cancelled"));
    }

    #[test]
    fn test_network_is_retryable() {
        let err = AuthError::Network {
            message: "dns failure".to_string(),
        };
        assert!(err.is_retryable());
        assert!(!err.is_user_cancelled());
        assert_eq!(err.error_code(), "E_AUTH_NETWORK");
    }

    #[test]
    fn test_rejected_not_retryable() {
        let err = AuthError::Rejected {
            message: "account disabled".to_string(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.error_code(), "E_AUTH_REJECTED");
    }

    #[test]
    fn test_display_format() {
        let err = AuthError::SignOutFailed {
            message: "session locked".to_string(),
        };
        let display = format!("{}", err);
        assert!(display.contains("Sign-out failed"));
        assert!(display.contains("session locked"));
        assert_eq!(
            AuthError::MissingCredential.to_string(),
            "Credential has no access token"
        );
    }
}
