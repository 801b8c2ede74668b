//! Resolved staff lifecycle policy.

use std::time::Duration;

use looped_core::config::StaffConfig;
use looped_core::error::AppError;
use looped_entity::staff::StaffRole;

/// Staff configuration with durations and the default role resolved.
#[derive(Debug, Clone)]
pub struct StaffPolicy {
    /// Invite code lifetime.
    pub invite_ttl: chrono::Duration,
    /// Reset token lifetime.
    pub reset_ttl: chrono::Duration,
    /// Role given to registrations once an owner exists.
    pub default_role: StaffRole,
    pub allow_deleted_email_reuse: bool,
    pub rollback_invite_on_notification_failure: bool,
    pub block_login_during_reset: bool,
    /// Bound on each repository or session store call.
    pub store_timeout: Duration,
    /// Bound on each notification send.
    pub notification_timeout: Duration,
    /// Every password reset request takes at least this long.
    pub forgot_password_floor: Duration,
}

impl StaffPolicy {
    /// Resolve a policy from configuration.
    pub fn from_config(config: &StaffConfig) -> Result<Self, AppError> {
        let default_role = config.default_role.parse::<StaffRole>().map_err(|e| {
            AppError::configuration(format!("staff.default_role: {}", e.message))
        })?;
        if default_role == StaffRole::Owner {
            return Err(AppError::configuration(
                "staff.default_role cannot be 'owner'",
            ));
        }

        Ok(Self {
            invite_ttl: chrono::Duration::hours(config.invite_ttl_hours as i64),
            reset_ttl: chrono::Duration::hours(config.reset_ttl_hours as i64),
            default_role,
            allow_deleted_email_reuse: config.allow_deleted_email_reuse,
            rollback_invite_on_notification_failure: config
                .rollback_invite_on_notification_failure,
            block_login_during_reset: config.block_login_during_reset,
            store_timeout: Duration::from_millis(config.store_timeout_ms),
            notification_timeout: Duration::from_millis(config.notification_timeout_ms),
            forgot_password_floor: Duration::from_millis(config.forgot_password_floor_ms),
        })
    }
}

impl Default for StaffPolicy {
    fn default() -> Self {
        Self {
            invite_ttl: chrono::Duration::hours(24),
            reset_ttl: chrono::Duration::hours(24),
            default_role: StaffRole::Contributor,
            allow_deleted_email_reuse: true,
            rollback_invite_on_notification_failure: false,
            block_login_during_reset: false,
            store_timeout: Duration::from_secs(5),
            notification_timeout: Duration::from_secs(10),
            forgot_password_floor: Duration::from_millis(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use looped_core::error::ErrorKind;

    use super::*;

    #[test]
    fn test_from_default_config() {
        let policy = StaffPolicy::from_config(&StaffConfig::default()).unwrap();
        assert_eq!(policy.default_role, StaffRole::Contributor);
        assert_eq!(policy.invite_ttl, chrono::Duration::hours(24));
        assert!(policy.allow_deleted_email_reuse);
    }

    #[test]
    fn test_rejects_bad_default_role() {
        for role in ["janitor", "owner"] {
            let config = StaffConfig {
                default_role: role.to_string(),
                ..StaffConfig::default()
            };
            let err = StaffPolicy::from_config(&config).unwrap_err();
            assert!(err.is(ErrorKind::Configuration));
        }
    }
}
