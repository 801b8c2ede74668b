//! Argon2id password hashing and verification.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use std::sync::OnceLock;

use tracing::warn;

use looped_core::error::AppError;

/// Hash that failed logins are verified against when there is no real one.
static DECOY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Handles password hashing and verification using Argon2id.
#[derive(Debug, Clone)]
pub struct PasswordHasher;

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher {
    /// Creates a new password hasher instance.
    ///
    /// The decoy hash is computed on first construction so that the first
    /// failed login does not pay for it.
    pub fn new() -> Self {
        let hasher = Self;
        hasher.decoy_hash();
        hasher
    }

    fn decoy_hash(&self) -> Option<&'static str> {
        DECOY_HASH
            .get_or_init(|| match self.hash_password("looped-decoy-credential") {
                Ok(hash) => Some(hash),
                Err(e) => {
                    warn!(error = %e, "Could not prepare decoy password hash");
                    None
                }
            })
            .as_deref()
    }

    /// Runs one full Argon2id verification against a fixed hash and
    /// discards the result.
    ///
    /// Login calls this on every path that has no real hash to check, so an
    /// unknown or inactive account costs as much as a wrong password.
    pub fn verify_decoy(&self, password: &str) {
        if let Some(hash) = self.decoy_hash() {
            let _ = self.verify_password(password, hash);
        }
    }

    /// Hashes a plaintext password using Argon2id with a random salt.
    ///
    /// The result is a PHC string carrying algorithm, parameters and salt.
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::crypto(format!("Password hashing failed: {e}")))
    }

    /// Verifies a plaintext password against a stored Argon2id hash.
    ///
    /// Returns `Ok(false)` on mismatch. A malformed stored hash is a
    /// `Crypto` error, never a silent mismatch.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::crypto(format!("Invalid password hash format: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::crypto(format!(
                "Password verification failed: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use looped_core::error::ErrorKind;

    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash_password("correct-horse-battery-staple").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify_password("correct-horse-battery-staple", &hash).unwrap());
        assert!(!hasher.verify_password("wrong-horse", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let hasher = PasswordHasher::new();
        let a = hasher.hash_password("same-password").unwrap();
        let b = hasher.hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_decoy_hash_is_a_real_argon2_hash() {
        let hasher = PasswordHasher::new();
        let decoy = hasher.decoy_hash().unwrap();
        assert!(decoy.starts_with("$argon2id$"));
        assert!(!hasher.verify_password("anything", decoy).unwrap());
        hasher.verify_decoy("anything");
    }

    #[test]
    fn test_malformed_hash_is_crypto_error() {
        let err = PasswordHasher::new()
            .verify_password("anything", "not-a-phc-string")
            .unwrap_err();
        assert!(err.is(ErrorKind::Crypto));
    }
}
