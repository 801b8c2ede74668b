//! Staff service: account creation, invitations, profile maintenance.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use looped_auth::code::{CodeCheck, check_code, digest_code, generate_code};
use looped_auth::jwt::TokenIssuer;
use looped_auth::password::{PasswordHasher, PasswordValidator};
use looped_auth::session::SessionStore;
use looped_core::error::{AppError, ErrorKind};
use looped_core::result::AppResult;
use looped_core::traits::Clock;
use looped_core::types::{PageRequest, PageResponse, SessionId, StaffId};
use looped_database::repositories::{StaffRepository, Visibility};
use looped_entity::staff::{NewStaff, StaffMember, StaffPatch, StaffRole, StaffState, TimedCode};
use looped_notify::{MailTemplate, NotificationGateway, SendMailConfig};

use super::policy::StaffPolicy;
use super::requests::{
    AcceptInviteRequest, InviteRequest, RegisterRequest, UpdateStaffRequest, normalize_email,
    validate_request,
};

/// Orchestrates the staff account lifecycle.
///
/// One instance is built at startup and shared behind an `Arc`. Every
/// repository, session store, and gateway call runs under a timeout; an
/// elapsed call surfaces as `Unavailable`.
#[derive(Clone)]
pub struct StaffService {
    pub(super) repo: Arc<dyn StaffRepository>,
    pub(super) sessions: Arc<dyn SessionStore>,
    pub(super) gateway: Arc<dyn NotificationGateway>,
    pub(super) hasher: Arc<PasswordHasher>,
    pub(super) validator: Arc<PasswordValidator>,
    pub(super) tokens: Arc<TokenIssuer>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) policy: StaffPolicy,
}

impl std::fmt::Debug for StaffService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaffService")
            .field("policy", &self.policy)
            .finish()
    }
}

impl StaffService {
    /// Creates a new staff service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: Arc<dyn StaffRepository>,
        sessions: Arc<dyn SessionStore>,
        gateway: Arc<dyn NotificationGateway>,
        hasher: Arc<PasswordHasher>,
        validator: Arc<PasswordValidator>,
        tokens: Arc<TokenIssuer>,
        clock: Arc<dyn Clock>,
        policy: StaffPolicy,
    ) -> Self {
        Self {
            repo,
            sessions,
            gateway,
            hasher,
            validator,
            tokens,
            clock,
            policy,
        }
    }

    /// Registers an active account directly, without an invitation.
    ///
    /// The first live account becomes the owner; later ones get the
    /// configured default role.
    pub async fn register(&self, req: RegisterRequest) -> AppResult<StaffMember> {
        validate_request(&req)?;
        let email = normalize_email(&req.email);
        self.validator
            .validate(&req.password, &[email.as_str(), req.name.as_str()])?;
        self.ensure_email_reusable(&email).await?;

        let live = self.store("count staff", self.repo.count_live()).await?;
        let role = if live == 0 {
            StaffRole::Owner
        } else {
            self.policy.default_role
        };

        let hashed_password = self.hasher.hash_password(&req.password)?;
        let staff = self
            .store(
                "insert staff",
                self.repo.insert(NewStaff {
                    name: req.name.trim().to_string(),
                    email,
                    hashed_password: Some(hashed_password),
                    role,
                    state: StaffState::Active,
                    email_verified: false,
                    invite_code: None,
                    created_at: self.now(),
                }),
            )
            .await?;

        info!(staff_id = %staff.id, role = %staff.role, "Staff member registered");
        Ok(staff)
    }

    /// Creates a pending account and mails it an invite code.
    ///
    /// If delivery fails the record stays, unless the rollback policy is
    /// on, in which case it is purged. Either way the delivery error is
    /// returned.
    pub async fn send_invite(&self, req: InviteRequest) -> AppResult<StaffMember> {
        validate_request(&req)?;
        let email = normalize_email(&req.email);
        self.ensure_email_reusable(&email).await?;

        let now = self.now();
        let (code, invite_code) = self.issue_code(now, self.policy.invite_ttl);
        let staff = self
            .store(
                "insert staff",
                self.repo.insert(NewStaff {
                    name: String::new(),
                    email,
                    hashed_password: None,
                    role: req.role,
                    state: StaffState::Pending,
                    email_verified: false,
                    invite_code: Some(invite_code),
                    created_at: now,
                }),
            )
            .await?;

        let mail = SendMailConfig::new(
            staff.email.clone(),
            MailTemplate::StaffInvite {
                code,
                role: staff.role,
            },
        );
        if let Err(e) = self.deliver(&mail).await {
            if self.policy.rollback_invite_on_notification_failure {
                warn!(staff_id = %staff.id, error = %e, "Invite not delivered, removing record");
                if let Err(purge_err) = self.store("purge staff", self.repo.purge(staff.id)).await
                {
                    error!(staff_id = %staff.id, error = %purge_err, "Failed to roll back invite");
                }
            } else {
                warn!(staff_id = %staff.id, error = %e, "Invite not delivered, record kept");
            }
            return Err(e);
        }

        info!(staff_id = %staff.id, role = %staff.role, "Staff invite sent");
        Ok(staff)
    }

    /// Issues a fresh invite code to a pending account and mails it.
    ///
    /// The previous code stops working as soon as the new one is stored.
    pub async fn resend_invite(&self, email: &str) -> AppResult<StaffMember> {
        let email = normalize_email(email);
        let staff = self.find_live_by_email(&email).await?;
        if staff.state != StaffState::Pending {
            return Err(AppError::not_found("No pending invitation for this email"));
        }

        let now = self.now();
        let (code, invite_code) = self.issue_code(now, self.policy.invite_ttl);
        let patch = StaffPatch {
            invite_code: Some(Some(invite_code)),
            ..StaffPatch::default()
        };
        let staff = self
            .store(
                "update staff",
                self.repo.update(staff.id, staff.version, patch, now),
            )
            .await?;

        let mail = SendMailConfig::new(
            staff.email.clone(),
            MailTemplate::StaffInvite {
                code,
                role: staff.role,
            },
        );
        self.deliver(&mail).await?;

        info!(staff_id = %staff.id, "Staff invite re-sent");
        Ok(staff)
    }

    /// Accepts an invitation: sets the password and activates the account.
    ///
    /// Checks run in a fixed order: password confirmation, account lookup,
    /// code match, code expiry, password policy. A code is cleared once
    /// accepted, so presenting it again is `InviteCodeInvalid`.
    pub async fn accept_invite(&self, req: AcceptInviteRequest) -> AppResult<StaffMember> {
        if req.password != req.confirm_password {
            return Err(AppError::password_mismatch());
        }
        validate_request(&req)?;

        let email = normalize_email(&req.email);
        let staff = self.find_live_by_email(&email).await?;
        let now = self.now();

        let pending_code = match staff.state {
            StaffState::Pending => staff.invite_code.as_ref(),
            _ => None,
        };
        match check_code(pending_code, &req.code, now) {
            CodeCheck::Valid => {}
            CodeCheck::Invalid => return Err(AppError::invite_code_invalid()),
            CodeCheck::Expired => return Err(AppError::invite_code_expired()),
        }

        let name = req.name.as_deref().map(str::trim).unwrap_or_default();
        self.validator
            .validate(&req.password, &[email.as_str(), name])?;
        let state = staff.state.transition(StaffState::Active)?;
        let hashed_password = self.hasher.hash_password(&req.password)?;

        let patch = StaffPatch {
            name: req.name.as_ref().map(|n| n.trim().to_string()),
            hashed_password: Some(hashed_password),
            state: Some(state),
            email_verified: Some(true),
            invite_code: Some(None),
            ..StaffPatch::default()
        };
        let staff = self
            .store(
                "update staff",
                self.repo.update(staff.id, staff.version, patch, now),
            )
            .await?;

        info!(staff_id = %staff.id, "Staff invite accepted");
        Ok(staff)
    }

    /// Updates name, email, or role. A new email is unverified.
    pub async fn update(&self, id: StaffId, req: UpdateStaffRequest) -> AppResult<StaffMember> {
        validate_request(&req)?;
        let staff = self.get(id).await?;

        let mut patch = StaffPatch {
            name: req.name.map(|n| n.trim().to_string()),
            email: req.email.as_deref().map(normalize_email),
            role: req.role,
            ..StaffPatch::default()
        };
        if patch.changes_email(&staff) {
            if let Some(email) = patch.email.as_deref() {
                self.ensure_email_reusable(email).await?;
            }
            patch.email_verified = Some(false);
        }

        let staff = self
            .store(
                "update staff",
                self.repo.update(staff.id, staff.version, patch, self.now()),
            )
            .await?;

        info!(staff_id = %staff.id, "Staff member updated");
        Ok(staff)
    }

    /// Soft-deletes an account and ends all of its sessions.
    pub async fn delete(&self, id: StaffId) -> AppResult<StaffMember> {
        let staff = self.get(id).await?;
        staff.state.transition(StaffState::Deleted)?;

        let staff = self
            .store(
                "delete staff",
                self.repo.soft_delete(staff.id, staff.version, self.now()),
            )
            .await?;
        let revoked = self.revoke_sessions(staff.id, None).await;

        info!(staff_id = %staff.id, revoked, "Staff member deleted");
        Ok(staff)
    }

    /// Fetches a live account by id.
    pub async fn get(&self, id: StaffId) -> AppResult<StaffMember> {
        self.store("find staff", self.repo.find_by_id(id, Visibility::Live))
            .await
    }

    /// Lists live accounts, newest first.
    pub async fn list(&self, page: PageRequest) -> AppResult<PageResponse<StaffMember>> {
        self.store("list staff", self.repo.list(&page)).await
    }

    pub(super) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(super) async fn find_live_by_email(&self, email: &str) -> AppResult<StaffMember> {
        self.store(
            "find staff",
            self.repo.find_by_email(email, Visibility::Live),
        )
        .await
    }

    /// Generate a code and the record that stores its digest.
    pub(super) fn issue_code(
        &self,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> (String, TimedCode) {
        let code = generate_code();
        let stored = TimedCode::issue(digest_code(&code), now, ttl);
        (code, stored)
    }

    /// Reject an email still held by a soft-deleted record when reuse is off.
    ///
    /// Live holders are left to the repository's uniqueness check.
    async fn ensure_email_reusable(&self, email: &str) -> AppResult<()> {
        if self.policy.allow_deleted_email_reuse {
            return Ok(());
        }

        match self
            .store(
                "find staff",
                self.repo.find_by_email(email, Visibility::IncludeDeleted),
            )
            .await
        {
            Ok(existing) if !existing.is_live() => {
                debug!(staff_id = %existing.id, "Email held by deleted staff member");
                Err(AppError::duplicate_email(
                    "Email belongs to a deleted staff member",
                ))
            }
            Ok(_) => Ok(()),
            Err(e) if e.is(ErrorKind::NotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Revoke sessions after a committed write.
    ///
    /// A failure here is logged, not returned: `authenticate` already refuses
    /// sessions of deleted accounts and sessions opened under an old password.
    pub(super) async fn revoke_sessions(
        &self,
        staff_id: StaffId,
        keep: Option<SessionId>,
    ) -> u64 {
        match self
            .store(
                "revoke sessions",
                self.sessions.revoke_all_for_staff(staff_id, keep),
            )
            .await
        {
            Ok(revoked) => revoked,
            Err(e) => {
                warn!(staff_id = %staff_id, error = %e, "Session revocation failed after commit");
                0
            }
        }
    }

    /// Run a repository or session store call under the store timeout.
    pub(super) async fn store<T, F>(&self, operation: &'static str, call: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        bounded(self.policy.store_timeout, operation, call).await
    }

    /// Send a notification under the notification timeout.
    pub(super) async fn deliver(&self, mail: &SendMailConfig) -> AppResult<()> {
        bounded(
            self.policy.notification_timeout,
            "send notification",
            self.gateway.send(mail),
        )
        .await
    }
}

async fn bounded<T, F>(limit: Duration, operation: &'static str, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, timeout_ms = limit.as_millis() as u64, "Call timed out");
            Err(AppError::unavailable(format!("{operation} timed out")))
        }
    }
}
