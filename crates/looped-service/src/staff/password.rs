//! Password change and recovery.

use tokio::time::Instant;
use tracing::{debug, info, warn};

use looped_auth::code::{CodeCheck, check_code};
use looped_auth::session::SessionRecord;
use looped_core::error::{AppError, ErrorKind};
use looped_core::result::AppResult;
use looped_core::types::{SessionId, StaffId};
use looped_entity::staff::{StaffPatch, StaffState};
use looped_notify::{MailTemplate, SendMailConfig};

use super::requests::{ChangePasswordRequest, ResetPasswordRequest, normalize_email};
use super::service::StaffService;

impl StaffService {
    /// Changes the password of an active account.
    ///
    /// Every other session of the account is revoked; `keep` names the
    /// caller's own session, if any. An outstanding reset token is dropped.
    pub async fn change_password(
        &self,
        id: StaffId,
        req: ChangePasswordRequest,
        keep: Option<SessionId>,
    ) -> AppResult<()> {
        let staff = self.get(id).await?;
        let hash = match (staff.state, staff.hashed_password.as_deref()) {
            (StaffState::Active, Some(hash)) => hash,
            _ => return Err(AppError::invalid_credentials()),
        };
        if !self.hasher.verify_password(&req.current_password, hash)? {
            return Err(AppError::invalid_credentials());
        }

        self.validator
            .validate_not_same(&req.current_password, &req.new_password)?;
        self.validator
            .validate(&req.new_password, &[staff.email.as_str(), staff.name.as_str()])?;
        let hashed_password = self.hasher.hash_password(&req.new_password)?;

        let patch = StaffPatch {
            hashed_password: Some(hashed_password),
            reset_token: Some(None),
            ..StaffPatch::default()
        };
        let staff = self
            .store(
                "update staff",
                self.repo.update(staff.id, staff.version, patch, self.now()),
            )
            .await?;
        if let (Some(session_id), Some(hash)) = (keep, staff.hashed_password.as_deref()) {
            self.rebind_session(staff.id, session_id, hash).await;
        }
        let revoked = self.revoke_sessions(staff.id, keep).await;

        info!(staff_id = %staff.id, revoked, "Password changed");
        Ok(())
    }

    /// Starts a password reset for `email`.
    ///
    /// Always succeeds, so callers cannot learn which emails hold accounts.
    /// Failures after the lookup are logged and swallowed.
    ///
    /// The work runs on its own task and the call returns no sooner than the
    /// configured floor, whether or not the email is known. Work that outlives
    /// the floor keeps running in the background.
    pub async fn forgot_password(&self, email: &str) -> AppResult<()> {
        let deadline = Instant::now() + self.policy.forgot_password_floor;
        let email = normalize_email(email);
        let service = self.clone();
        let mut work = tokio::spawn(async move {
            if let Err(e) = service.issue_reset_token(&email).await {
                warn!(error = %e, "Password reset request failed");
            }
        });

        match tokio::time::timeout_at(deadline, &mut work).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Password reset task aborted"),
            Err(_) => debug!("Password reset still running at response deadline"),
        }
        tokio::time::sleep_until(deadline).await;
        Ok(())
    }

    /// Point the caller's own session at the new password hash.
    async fn rebind_session(&self, staff_id: StaffId, session_id: SessionId, hash: &str) {
        let owned = match self.store("find session", self.sessions.get(session_id)).await {
            Ok(record) => record.is_some_and(|record| record.staff_id == staff_id),
            Err(e) => {
                warn!(staff_id = %staff_id, error = %e, "Session lookup failed after commit");
                return;
            }
        };
        if !owned {
            return;
        }

        let rebound = self.store(
            "rebind session",
            self.sessions.rebind(session_id, SessionRecord::tag_for(hash)),
        );
        if let Err(e) = rebound.await {
            warn!(staff_id = %staff_id, error = %e, "Session rebind failed after commit");
        }
    }

    async fn issue_reset_token(&self, email: &str) -> AppResult<()> {
        let staff = match self.find_live_by_email(email).await {
            Ok(staff) => staff,
            Err(e) if e.is(ErrorKind::NotFound) => {
                debug!("Password reset requested for unknown email");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if staff.state != StaffState::Active {
            debug!(staff_id = %staff.id, state = %staff.state, "Password reset for inactive account");
            return Ok(());
        }

        let now = self.now();
        let (code, reset_token) = self.issue_code(now, self.policy.reset_ttl);
        let patch = StaffPatch {
            reset_token: Some(Some(reset_token)),
            ..StaffPatch::default()
        };
        let staff = self
            .store(
                "update staff",
                self.repo.update(staff.id, staff.version, patch, now),
            )
            .await?;

        self.deliver(&SendMailConfig::new(
            staff.email.clone(),
            MailTemplate::PasswordReset { code },
        ))
        .await?;

        info!(staff_id = %staff.id, "Password reset token issued");
        Ok(())
    }

    /// Completes a password reset and revokes every session of the account.
    pub async fn reset_password(&self, req: ResetPasswordRequest) -> AppResult<()> {
        let email = normalize_email(&req.email);
        let staff = match self.find_live_by_email(&email).await {
            Ok(staff) => staff,
            Err(e) if e.is(ErrorKind::NotFound) => return Err(AppError::reset_token_invalid()),
            Err(e) => return Err(e),
        };

        let now = self.now();
        let pending_token = match staff.state {
            StaffState::Active => staff.reset_token.as_ref(),
            _ => None,
        };
        match check_code(pending_token, &req.token, now) {
            CodeCheck::Valid => {}
            CodeCheck::Invalid => return Err(AppError::reset_token_invalid()),
            CodeCheck::Expired => return Err(AppError::reset_token_expired()),
        }

        self.validator
            .validate(&req.new_password, &[staff.email.as_str(), staff.name.as_str()])?;
        let hashed_password = self.hasher.hash_password(&req.new_password)?;

        let patch = StaffPatch {
            hashed_password: Some(hashed_password),
            reset_token: Some(None),
            ..StaffPatch::default()
        };
        let staff = self
            .store(
                "update staff",
                self.repo.update(staff.id, staff.version, patch, now),
            )
            .await?;
        let revoked = self.revoke_sessions(staff.id, None).await;

        info!(staff_id = %staff.id, revoked, "Password reset completed");
        Ok(())
    }
}
