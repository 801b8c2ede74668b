//! Session token signing and verification (HS256).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use looped_core::config::{AuthConfig, SessionConfig};
use looped_core::error::AppError;
use looped_core::types::{SessionId, StaffId};

use super::claims::Claims;

/// A freshly signed session token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Compact JWS.
    pub token: String,
    /// Instant the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies session tokens.
///
/// Expiry is checked against the instant the caller passes in rather than
/// the library's own clock, so tokens follow the same time source as the
/// rest of the staff lifecycle.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenIssuer {
    /// Creates a new issuer from auth and session configuration.
    pub fn new(auth: &AuthConfig, session: &SessionConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_issuer(&[auth.jwt_issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            encoding_key: EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
            validation,
            issuer: auth.jwt_issuer.clone(),
            ttl: Duration::minutes(session.ttl_minutes as i64),
        }
    }

    /// Token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `staff_id` bound to `session_id`.
    pub fn issue(
        &self,
        staff_id: StaffId,
        session_id: SessionId,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, AppError> {
        let expires_at = issued_at + self.ttl;
        let claims = Claims {
            sub: staff_id.into_uuid(),
            sid: session_id.into_uuid(),
            iss: self.issuer.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::crypto(format!("Failed to sign session token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature, issuer and expiry of `token` at instant `now`.
    ///
    /// Every failure is reported as `InvalidCredentials`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "Rejected session token");
                AppError::invalid_credentials()
            })?
            .claims;

        if claims.is_expired_at(now) {
            debug!(session_id = %claims.sid, "Rejected expired session token");
            return Err(AppError::invalid_credentials());
        }

        Ok(claims)
    }
}
