//! Login, token authentication, and logout.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use looped_auth::jwt::Claims;
use looped_auth::session::SessionRecord;
use looped_core::error::{AppError, ErrorKind};
use looped_core::result::AppResult;
use looped_core::types::SessionId;
use looped_database::repositories::Visibility;
use looped_entity::staff::StaffMember;

use super::requests::{LoginRequest, normalize_email};
use super::service::StaffService;

/// Outcome of a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    /// Signed session token.
    pub token: String,
    /// Session the token is bound to.
    pub session_id: SessionId,
    /// When the token and session lapse.
    pub expires_at: DateTime<Utc>,
    /// The authenticated staff member.
    pub staff: StaffMember,
}

impl StaffService {
    /// Verifies credentials and opens a session.
    ///
    /// Unknown, deleted, and pending accounts, and wrong passwords, all
    /// produce the same `InvalidCredentials` error.
    pub async fn login(&self, req: LoginRequest) -> AppResult<LoginResult> {
        let email = normalize_email(&req.email);
        let staff = match self.find_live_by_email(&email).await {
            Ok(staff) => staff,
            Err(e) if e.is(ErrorKind::NotFound) => {
                debug!("Login for unknown email");
                return Err(self.reject_login(&req.password));
            }
            Err(e) => return Err(e),
        };

        let now = self.now();
        let hash = match staff.hashed_password.as_deref() {
            Some(hash) if staff.is_active() => hash,
            _ => {
                debug!(staff_id = %staff.id, state = %staff.state, "Login for inactive account");
                return Err(self.reject_login(&req.password));
            }
        };
        if self.policy.block_login_during_reset && staff.has_reset_in_flight(now) {
            debug!(staff_id = %staff.id, "Login refused while reset is outstanding");
            return Err(self.reject_login(&req.password));
        }

        if !self.hasher.verify_password(&req.password, hash)? {
            debug!(staff_id = %staff.id, "Login with wrong password");
            return Err(AppError::invalid_credentials());
        }

        let session_id = SessionId::new();
        let issued = self.tokens.issue(staff.id, session_id, now)?;
        self.store(
            "create session",
            self.sessions.create(SessionRecord {
                session_id,
                staff_id: staff.id,
                created_at: now,
                expires_at: issued.expires_at,
                credential_tag: SessionRecord::tag_for(hash),
            }),
        )
        .await?;

        info!(staff_id = %staff.id, session_id = %session_id, "Staff member logged in");
        Ok(LoginResult {
            token: issued.token,
            session_id,
            expires_at: issued.expires_at,
            staff,
        })
    }

    /// Resolves a session token to its claims.
    ///
    /// The token must carry a valid signature, be unexpired, and belong to
    /// a registered session. The account must still be live and active,
    /// with the same password hash the session was opened with.
    pub async fn authenticate(&self, token: &str) -> AppResult<Claims> {
        let now = self.now();
        let claims = self.tokens.verify(token, now)?;

        let session = self
            .store("check session", self.sessions.get(claims.session_id()))
            .await?
            .filter(|session| session.is_live_at(now) && session.staff_id == claims.staff_id());
        let Some(session) = session else {
            debug!(session_id = %claims.sid, "Token for revoked session");
            return Err(AppError::invalid_credentials());
        };

        let staff = match self
            .store(
                "find staff",
                self.repo.find_by_id(claims.staff_id(), Visibility::Live),
            )
            .await
        {
            Ok(staff) => staff,
            Err(e) if e.is(ErrorKind::NotFound) => {
                debug!(session_id = %claims.sid, "Token for deleted account");
                return Err(AppError::invalid_credentials());
            }
            Err(e) => return Err(e),
        };

        let current_tag = match staff.hashed_password.as_deref() {
            Some(hash) if staff.is_active() => SessionRecord::tag_for(hash),
            _ => {
                debug!(session_id = %claims.sid, "Token for inactive account");
                return Err(AppError::invalid_credentials());
            }
        };
        if current_tag != session.credential_tag {
            debug!(session_id = %claims.sid, "Session predates a password change");
            return Err(AppError::invalid_credentials());
        }

        Ok(claims)
    }

    /// Burn a decoy verification so every refused login costs the same.
    fn reject_login(&self, password: &str) -> AppError {
        self.hasher.verify_decoy(password);
        AppError::invalid_credentials()
    }

    /// Ends the session behind `token`.
    ///
    /// Idempotent: malformed, expired, or already revoked tokens succeed
    /// without effect.
    pub async fn logout(&self, token: &str) -> AppResult<()> {
        let claims = match self.tokens.verify(token, self.now()) {
            Ok(claims) => claims,
            Err(_) => {
                debug!("Logout with unusable token");
                return Ok(());
            }
        };

        let revoked = self
            .store("revoke session", self.sessions.revoke(claims.session_id()))
            .await?;
        if revoked {
            info!(staff_id = %claims.sub, session_id = %claims.sid, "Staff member logged out");
        }
        Ok(())
    }
}
