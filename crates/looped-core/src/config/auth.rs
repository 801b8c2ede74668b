//! Authentication configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Placeholder signing secret shipped in the default configuration.
pub const DEFAULT_JWT_SECRET: &str = "CHANGE_ME_IN_PRODUCTION";

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for session token signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret", skip_serializing)]
    pub jwt_secret: String,
    /// Issuer claim written into every session token.
    #[serde(default = "default_issuer")]
    pub jwt_issuer: String,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Minimum zxcvbn score (0-4) a new password must reach.
    #[serde(default = "default_password_score")]
    pub password_min_score: u8,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_issuer: default_issuer(),
            password_min_length: default_password_min(),
            password_min_score: default_password_score(),
        }
    }
}

impl AuthConfig {
    /// Whether the signing secret is empty or still the shipped placeholder.
    /// Anyone who knows it can forge session tokens.
    pub fn uses_default_secret(&self) -> bool {
        let secret = self.jwt_secret.trim();
        secret.is_empty() || secret == DEFAULT_JWT_SECRET
    }

    /// Refuse the placeholder secret in every environment but development.
    pub fn check_secret(&self, env: &str) -> Result<(), AppError> {
        if self.uses_default_secret() && env != "development" {
            return Err(AppError::configuration(format!(
                "auth.jwt_secret must be set outside development (env '{env}')"
            )));
        }
        Ok(())
    }
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_issuer() -> String {
    "looped-cms".to_string()
}

fn default_password_min() -> usize {
    8
}

fn default_password_score() -> u8 {
    2
}
