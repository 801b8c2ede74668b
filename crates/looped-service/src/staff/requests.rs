//! Request payloads for staff operations.

use serde::{Deserialize, Serialize};
use validator::Validate;

use looped_core::error::AppError;
use looped_entity::staff::StaffRole;

/// Self-registration of an active account.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 191))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
}

/// Invitation of a new staff member.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InviteRequest {
    #[validate(email)]
    pub email: String,
    pub role: StaffRole,
}

/// Acceptance of a pending invitation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AcceptInviteRequest {
    #[validate(email)]
    pub email: String,
    pub code: String,
    /// Display name chosen by the invitee.
    #[validate(length(min = 1, max = 191))]
    pub name: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

/// Credentials for opening a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile changes. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateStaffRequest {
    #[validate(length(min = 1, max = 191))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub role: Option<StaffRole>,
}

/// Password change by the account holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Completion of a password reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub token: String,
    pub new_password: String,
}

/// Run derived field validation, reporting failures as `Validation`.
pub(crate) fn validate_request<T: Validate>(request: &T) -> Result<(), AppError> {
    request
        .validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
}

/// Canonical form of an email address for storage and lookups.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use looped_core::error::ErrorKind;

    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@X.com "), "alice@x.com");
    }

    #[test]
    fn test_invalid_email_is_validation_error() {
        let request = InviteRequest {
            email: "not-an-email".to_string(),
            role: StaffRole::Editor,
        };
        let err = validate_request(&request).unwrap_err();
        assert!(err.is(ErrorKind::Validation));
    }

    #[test]
    fn test_empty_update_is_valid() {
        validate_request(&UpdateStaffRequest::default()).unwrap();
    }
}
