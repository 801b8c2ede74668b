//! Staff member entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use looped_core::types::StaffId;

use super::code::TimedCode;
use super::role::StaffRole;
use super::state::StaffState;

/// A staff account of the CMS back office.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    /// Unique identifier, assigned on insert.
    pub id: StaffId,
    /// Display name. Empty until the invitee accepts.
    pub name: String,
    /// Normalised email address.
    pub email: String,
    /// Argon2id PHC string. `None` while the account is pending.
    #[serde(skip_serializing)]
    pub hashed_password: Option<String>,
    /// Permission level.
    pub role: StaffRole,
    /// Lifecycle state.
    pub state: StaffState,
    /// Whether the email address has been proven.
    pub email_verified: bool,
    /// Pending invite code.
    #[serde(skip_serializing)]
    pub invite_code: Option<TimedCode>,
    /// Pending password reset token.
    #[serde(skip_serializing)]
    pub reset_token: Option<TimedCode>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last modified.
    pub updated_at: DateTime<Utc>,
    /// When the record was soft-deleted.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency counter.
    pub version: i64,
}

impl StaffMember {
    /// Whether the record takes part in normal lookups.
    pub fn is_live(&self) -> bool {
        self.state != StaffState::Deleted
    }

    /// Whether the account is active and has a usable password.
    pub fn is_active(&self) -> bool {
        self.state == StaffState::Active && self.hashed_password.is_some()
    }

    /// Whether a password reset token is outstanding and not yet expired.
    pub fn has_reset_in_flight(&self, now: DateTime<Utc>) -> bool {
        self.reset_token
            .as_ref()
            .is_some_and(|token| token.is_usable_at(now))
    }
}

/// Data required to create a new staff record.
///
/// The repository assigns the identifier and the initial version.
#[derive(Debug, Clone)]
pub struct NewStaff {
    /// Display name.
    pub name: String,
    /// Normalised email address.
    pub email: String,
    /// Pre-hashed password for accounts created active.
    pub hashed_password: Option<String>,
    /// Permission level.
    pub role: StaffRole,
    /// Initial lifecycle state.
    pub state: StaffState,
    /// Whether the email address has been proven.
    pub email_verified: bool,
    /// Invite code for pending accounts.
    pub invite_code: Option<TimedCode>,
    /// Creation instant; also the first `updated_at`.
    pub created_at: DateTime<Utc>,
}

impl NewStaff {
    /// Materialise the record with its assigned identifier.
    pub fn into_member(self, id: StaffId) -> StaffMember {
        StaffMember {
            id,
            name: self.name,
            email: self.email,
            hashed_password: self.hashed_password,
            role: self.role,
            state: self.state,
            email_verified: self.email_verified,
            invite_code: self.invite_code,
            reset_token: None,
            created_at: self.created_at,
            updated_at: self.created_at,
            deleted_at: None,
            version: 1,
        }
    }
}

/// A partial update applied under a version precondition.
///
/// `None` leaves a field untouched. For the nullable sub-records,
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct StaffPatch {
    /// New display name.
    pub name: Option<String>,
    /// New normalised email.
    pub email: Option<String>,
    /// New role.
    pub role: Option<StaffRole>,
    /// New password hash.
    pub hashed_password: Option<String>,
    /// New lifecycle state.
    pub state: Option<StaffState>,
    /// New verification flag.
    pub email_verified: Option<bool>,
    /// Replace or clear the invite code.
    pub invite_code: Option<Option<TimedCode>>,
    /// Replace or clear the reset token.
    pub reset_token: Option<Option<TimedCode>>,
    /// Set the soft-deletion instant.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl StaffPatch {
    /// Whether the patch would change the email to something new.
    pub fn changes_email(&self, current: &StaffMember) -> bool {
        self.email.as_deref().is_some_and(|email| email != current.email)
    }

    /// Apply the patch, stamp `updated_at`, and bump the version.
    ///
    /// `updated_at` never moves before `created_at`, even if `now` comes from
    /// a clock that lags the one used at creation.
    pub fn apply(self, staff: &mut StaffMember, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            staff.name = name;
        }
        if let Some(email) = self.email {
            staff.email = email;
        }
        if let Some(role) = self.role {
            staff.role = role;
        }
        if let Some(hash) = self.hashed_password {
            staff.hashed_password = Some(hash);
        }
        if let Some(state) = self.state {
            staff.state = state;
        }
        if let Some(verified) = self.email_verified {
            staff.email_verified = verified;
        }
        if let Some(invite_code) = self.invite_code {
            staff.invite_code = invite_code;
        }
        if let Some(reset_token) = self.reset_token {
            staff.reset_token = reset_token;
        }
        if let Some(deleted_at) = self.deleted_at {
            staff.deleted_at = Some(deleted_at);
        }
        staff.updated_at = now.max(staff.created_at);
        staff.version += 1;
    }

    /// Patch that soft-deletes a record and drops its pending codes.
    pub fn soft_delete(at: DateTime<Utc>) -> Self {
        Self {
            state: Some(StaffState::Deleted),
            invite_code: Some(None),
            reset_token: Some(None),
            deleted_at: Some(at),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pending(now: DateTime<Utc>) -> StaffMember {
        NewStaff {
            name: String::new(),
            email: "alice@x.com".into(),
            hashed_password: None,
            role: StaffRole::Editor,
            state: StaffState::Pending,
            email_verified: false,
            invite_code: Some(TimedCode::issue("h".into(), now, Duration::hours(24))),
            created_at: now,
        }
        .into_member(StaffId::new())
    }

    #[test]
    fn test_new_record_has_equal_timestamps() {
        let now = Utc::now();
        let staff = pending(now);
        assert_eq!(staff.created_at, staff.updated_at);
        assert_eq!(staff.version, 1);
        assert!(staff.is_live());
        assert!(!staff.is_active());
    }

    #[test]
    fn test_apply_clears_code_and_bumps_version() {
        let now = Utc::now();
        let mut staff = pending(now);
        let patch = StaffPatch {
            hashed_password: Some("$argon2id$...".into()),
            state: Some(StaffState::Active),
            email_verified: Some(true),
            invite_code: Some(None),
            ..StaffPatch::default()
        };
        patch.apply(&mut staff, now + Duration::minutes(5));

        assert!(staff.is_active());
        assert!(staff.invite_code.is_none());
        assert_eq!(staff.version, 2);
        assert_eq!(staff.updated_at, now + Duration::minutes(5));
    }

    #[test]
    fn test_updated_at_never_precedes_created_at() {
        let now = Utc::now();
        let mut staff = pending(now);
        StaffPatch::default().apply(&mut staff, now - Duration::seconds(30));
        assert_eq!(staff.updated_at, staff.created_at);
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let staff = pending(Utc::now());
        let json = serde_json::to_value(&staff).unwrap();
        assert!(json.get("hashed_password").is_none());
        assert!(json.get("invite_code").is_none());
        assert_eq!(json["state"], "pending");
    }
}
