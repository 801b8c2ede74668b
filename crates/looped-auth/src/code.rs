//! One-time codes: staff invite codes and password reset tokens.
//!
//! A code is 32 random bytes from the OS generator, encoded URL-safe so it
//! can travel inside a link. Only its SHA-256 digest is persisted.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use looped_entity::staff::TimedCode;

/// Number of random bytes in a code.
const CODE_BYTES: usize = 32;

/// Outcome of presenting a code against a stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    /// Code matches and is within its window.
    Valid,
    /// No code is pending, or the presented code does not match.
    Invalid,
    /// Code matches but its window has closed.
    Expired,
}

/// Generate a fresh plaintext code.
pub fn generate_code() -> String {
    let mut bytes = [0u8; CODE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest a plaintext code for storage.
pub fn digest_code(code: &str) -> String {
    URL_SAFE_NO_PAD.encode(raw_digest(code))
}

fn raw_digest(code: &str) -> [u8; 32] {
    Sha256::digest(code.as_bytes()).into()
}

/// Check a presented code against the pending one at instant `now`.
///
/// Mismatch wins over expiry: an expired code is only reported as such when
/// the presented value is the right one.
pub fn check_code(stored: Option<&TimedCode>, presented: &str, now: DateTime<Utc>) -> CodeCheck {
    let Some(stored) = stored else {
        return CodeCheck::Invalid;
    };

    // A stored digest that does not decode can never match.
    let Ok(stored_digest) = URL_SAFE_NO_PAD.decode(&stored.code_hash) else {
        return CodeCheck::Invalid;
    };
    let matches: bool = stored_digest
        .as_slice()
        .ct_eq(raw_digest(presented).as_slice())
        .into();
    if !matches {
        return CodeCheck::Invalid;
    }

    if stored.is_usable_at(now) {
        CodeCheck::Valid
    } else {
        CodeCheck::Expired
    }
}
