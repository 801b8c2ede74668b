//! Unified application error types for Looped CMS.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The staff lifecycle error kinds are
//! first-class [`ErrorKind`] variants so that the API adapter can translate
//! them into protocol responses without parsing messages.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested record does not exist (or is soft-deleted).
    NotFound,
    /// Another live staff record already uses this email address.
    DuplicateEmail,
    /// Password and confirmation password differ.
    PasswordMismatch,
    /// Login or password verification failed. Deliberately uniform.
    InvalidCredentials,
    /// The invite code does not match, or no invite is pending.
    InviteCodeInvalid,
    /// The invite code matches but its expiry has passed.
    InviteCodeExpired,
    /// The reset token does not match, or no reset is pending.
    ResetTokenInvalid,
    /// The reset token matches but its expiry has passed.
    ResetTokenExpired,
    /// A concurrent modification won the race for this record.
    Conflict,
    /// The notification gateway failed to deliver a message.
    NotificationFailed,
    /// The hashing primitive failed.
    Crypto,
    /// A store or gateway call timed out or could not be reached.
    Unavailable,
    /// Input validation failed.
    Validation,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Whether a caller may retry the same request with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable | Self::Conflict)
    }

    /// Return the kind as a stable upper-case code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::DuplicateEmail => "DUPLICATE_EMAIL",
            Self::PasswordMismatch => "PASSWORD_MISMATCH",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InviteCodeInvalid => "INVITE_CODE_INVALID",
            Self::InviteCodeExpired => "INVITE_CODE_EXPIRED",
            Self::ResetTokenInvalid => "RESET_TOKEN_INVALID",
            Self::ResetTokenExpired => "RESET_TOKEN_EXPIRED",
            Self::Conflict => "CONFLICT",
            Self::NotificationFailed => "NOTIFICATION_FAILED",
            Self::Crypto => "CRYPTO",
            Self::Unavailable => "UNAVAILABLE",
            Self::Validation => "VALIDATION",
            Self::Database => "DATABASE",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unified application error used throughout Looped.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether this error carries the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a duplicate-email error.
    pub fn duplicate_email(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateEmail, message)
    }

    /// Create a password-mismatch error.
    pub fn password_mismatch() -> Self {
        Self::new(
            ErrorKind::PasswordMismatch,
            "Password and confirm password do not match",
        )
    }

    /// Create the uniform invalid-credentials error.
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorKind::InvalidCredentials, "Invalid email or password")
    }

    /// Create an invalid invite code error.
    pub fn invite_code_invalid() -> Self {
        Self::new(ErrorKind::InviteCodeInvalid, "Invite code is invalid")
    }

    /// Create an expired invite code error.
    pub fn invite_code_expired() -> Self {
        Self::new(ErrorKind::InviteCodeExpired, "Invite code has expired")
    }

    /// Create an invalid reset token error.
    pub fn reset_token_invalid() -> Self {
        Self::new(ErrorKind::ResetTokenInvalid, "Reset token is invalid")
    }

    /// Create an expired reset token error.
    pub fn reset_token_expired() -> Self {
        Self::new(ErrorKind::ResetTokenExpired, "Reset token has expired")
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a notification-failed error.
    pub fn notification_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotificationFailed, message)
    }

    /// Create a crypto error.
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Crypto, message)
    }

    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Self::with_source(ErrorKind::Unavailable, "Operation timed out", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::Unavailable.is_retryable());
        assert!(ErrorKind::Conflict.is_retryable());
        assert!(!ErrorKind::InvalidCredentials.is_retryable());
        assert!(!ErrorKind::Crypto.is_retryable());
    }

    #[test]
    fn test_display_includes_kind() {
        let err = AppError::invite_code_expired();
        assert_eq!(err.to_string(), "INVITE_CODE_EXPIRED: Invite code has expired");
    }

    #[tokio::test]
    async fn test_elapsed_maps_to_unavailable() {
        let elapsed = tokio::time::timeout(
            std::time::Duration::from_millis(1),
            std::future::pending::<()>(),
        )
        .await
        .unwrap_err();
        let err = AppError::from(elapsed);
        assert!(err.is(ErrorKind::Unavailable));
    }
}
