//! Error handling for the session and collection layers.
//!
//! Each boundary has its own error type:
//!
//! | Type | Raised by | Delivery |
//! |------|-----------|----------|
//! | [`AuthError`] | sign-in / sign-out | returned |
//! | [`WriteError`] | add / update / delete | returned |
//! | [`ListenError`] | live query listener | event channel, logged only |
//!
//! Every operation logs the error where it happens and returns it unchanged.
//! Nothing here retries. [`SyncError`] unifies the three for application code
//! and classifies them with an [`ErrorCategory`].

mod auth;
mod category;
mod listen;
mod sync_error;
mod write;

pub use auth::AuthError;
pub use category::ErrorCategory;
pub use listen::ListenError;
pub use sync_error::SyncError;
pub use write::WriteError;

/// Result alias for application code mixing both components.
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn test_error_unification() {
        let auth: SyncError = AuthError::PopupClosed.into();
        let write: SyncError = WriteError::Unavailable {
            message: "offline".to_string(),
        }
        .into();
        let listen: SyncError = ListenError::PermissionDenied {
            message: "rules".to_string(),
        }
        .into();
        let config: SyncError = ConfigError::EmptyValue {
            key: "collection".to_string(),
        }
        .into();

        assert_eq!(auth.category(), ErrorCategory::User);
        assert_eq!(write.category(), ErrorCategory::Network);
        assert_eq!(listen.category(), ErrorCategory::Permission);
        assert_eq!(config.category(), ErrorCategory::Configuration);

        for err in [&auth, &write, &listen, &config] {
            assert!(!err.error_code().is_empty());
            assert!(!err.user_message().is_empty());
        }
    }

    #[test]
    fn test_retry_logic() {
        let retryable: Vec<SyncError> = vec![
            AuthError::Network {
                message: "timeout".to_string(),
            }
            .into(),
            WriteError::Unavailable {
                message: "offline".to_string(),
            }
            .into(),
            ListenError::Unavailable {
                message: "reset".to_string(),
            }
            .into(),
        ];
        for err in retryable {
            assert!(err.is_retryable(), "Expected {:?} to be retryable", err);
        }

        let not_retryable: Vec<SyncError> = vec![
            AuthError::Rejected {
                message: "no".to_string(),
            }
            .into(),
            WriteError::NotOwner {
                id: "a".to_string(),
            }
            .into(),
            ListenError::Cancelled.into(),
        ];
        for err in not_retryable {
            assert!(!err.is_retryable(), "Expected {:?} to not be retryable", err);
        }
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;

        let err: SyncError = WriteError::NotFound {
            id: "doc-1".to_string(),
        }
        .into();
        let source = err.source().expect("write error should be the source");
        assert_eq!(source.to_string(), "Document 'doc-1' not found");
        assert_eq!(err.to_string(), source.to_string());
    }
}
