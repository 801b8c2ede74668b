//! Session registry contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use looped_core::result::AppResult;
use looped_core::types::{SessionId, StaffId};

use crate::code::digest_code;

/// A live login session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session identifier, also embedded in the session token.
    pub session_id: SessionId,
    /// Staff member the session belongs to.
    pub staff_id: StaffId,
    /// When the session was opened.
    pub created_at: DateTime<Utc>,
    /// When the session lapses.
    pub expires_at: DateTime<Utc>,
    /// Fingerprint of the password hash the session was opened with.
    pub credential_tag: String,
}

impl SessionRecord {
    /// Fingerprint a stored password hash.
    ///
    /// Any password change produces a new salted hash and so a new tag.
    pub fn tag_for(hashed_password: &str) -> String {
        digest_code(hashed_password)
    }

    /// Whether the session is still usable at `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Registry of live sessions. A token is only honoured while its session
/// is registered here.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Register a new session.
    async fn create(&self, record: SessionRecord) -> AppResult<()>;

    /// Whether the session exists and has not lapsed at `now`.
    async fn is_active(&self, session_id: SessionId, now: DateTime<Utc>) -> AppResult<bool>;

    /// Look up a registered session.
    async fn get(&self, session_id: SessionId) -> AppResult<Option<SessionRecord>>;

    /// Re-bind a session to a new credential tag. Returns whether it exists.
    async fn rebind(&self, session_id: SessionId, credential_tag: String) -> AppResult<bool>;

    /// Remove a session. Returns whether it was registered.
    async fn revoke(&self, session_id: SessionId) -> AppResult<bool>;

    /// Remove every session of a staff member except `keep`.
    /// Returns how many were removed.
    async fn revoke_all_for_staff(
        &self,
        staff_id: StaffId,
        keep: Option<SessionId>,
    ) -> AppResult<u64>;

    /// Drop sessions that have lapsed at `now`. Returns how many were removed.
    async fn prune(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
