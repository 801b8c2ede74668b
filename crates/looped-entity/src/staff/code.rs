//! Time-boxed single-use codes (invite codes and password reset tokens).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pending one-time code attached to a staff record.
///
/// Only the digest of the code is stored; the plaintext leaves the process
/// once, inside the notification sent to the staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedCode {
    /// Digest of the code, as produced by `looped_auth::code::digest_code`.
    pub code_hash: String,
    /// Instant from which the code is no longer usable.
    pub expiry: DateTime<Utc>,
}

impl TimedCode {
    /// Create a code record that expires `ttl` after `issued_at`.
    pub fn issue(code_hash: String, issued_at: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self {
            code_hash,
            expiry: issued_at + ttl,
        }
    }

    /// A code is usable strictly before its expiry.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expiry
    }

    /// Rebuild from the two nullable columns it is stored as.
    pub fn from_columns(
        code_hash: Option<String>,
        expiry: Option<DateTime<Utc>>,
    ) -> Option<Self> {
        match (code_hash, expiry) {
            (Some(code_hash), Some(expiry)) => Some(Self { code_hash, expiry }),
            _ => None,
        }
    }
}
