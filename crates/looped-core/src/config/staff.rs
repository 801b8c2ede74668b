//! Staff lifecycle policy configuration.

use serde::{Deserialize, Serialize};

/// Policy knobs for the staff invitation and password lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffConfig {
    /// Invite code lifetime in hours.
    #[serde(default = "default_code_ttl")]
    pub invite_ttl_hours: u64,
    /// Password reset token lifetime in hours.
    #[serde(default = "default_code_ttl")]
    pub reset_ttl_hours: u64,
    /// Role given to registrations after the owner account exists.
    #[serde(default = "default_role")]
    pub default_role: String,
    /// Whether an email held only by soft-deleted records may be reused.
    #[serde(default = "default_true")]
    pub allow_deleted_email_reuse: bool,
    /// Whether a failed invite email removes the freshly created record.
    #[serde(default)]
    pub rollback_invite_on_notification_failure: bool,
    /// Whether login is refused while a password reset is outstanding.
    #[serde(default)]
    pub block_login_during_reset: bool,
    /// Upper bound for a single repository call, in milliseconds.
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,
    /// Upper bound for a single notification send, in milliseconds.
    #[serde(default = "default_notification_timeout")]
    pub notification_timeout_ms: u64,
    /// Fixed response time of a password reset request, in milliseconds.
    #[serde(default = "default_forgot_password_floor")]
    pub forgot_password_floor_ms: u64,
}

impl Default for StaffConfig {
    fn default() -> Self {
        Self {
            invite_ttl_hours: default_code_ttl(),
            reset_ttl_hours: default_code_ttl(),
            default_role: default_role(),
            allow_deleted_email_reuse: true,
            rollback_invite_on_notification_failure: false,
            block_login_during_reset: false,
            store_timeout_ms: default_store_timeout(),
            notification_timeout_ms: default_notification_timeout(),
            forgot_password_floor_ms: default_forgot_password_floor(),
        }
    }
}

fn default_code_ttl() -> u64 {
    24
}

fn default_role() -> String {
    "contributor".to_string()
}

fn default_true() -> bool {
    true
}

fn default_store_timeout() -> u64 {
    5_000
}

fn default_notification_timeout() -> u64 {
    10_000
}

fn default_forgot_password_floor() -> u64 {
    500
}
