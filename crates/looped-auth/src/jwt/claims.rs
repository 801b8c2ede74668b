//! Claims carried by a staff session token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use looped_core::types::{SessionId, StaffId};

/// JWT claims payload of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the staff member id.
    pub sub: Uuid,
    /// Session this token belongs to.
    pub sid: Uuid,
    /// Issuer.
    pub iss: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// Returns the staff id from the subject claim.
    pub fn staff_id(&self) -> StaffId {
        StaffId::from_uuid(self.sub)
    }

    /// Returns the session id.
    pub fn session_id(&self) -> SessionId {
        SessionId::from_uuid(self.sid)
    }

    /// Returns the expiration instant.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Whether the token has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}
