use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use taskdesk_core::UserId;

use crate::{AccessClaims, Role, TokenValidationError, validate_claims};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to encode token: {0}")]
    Encode(String),

    #[error("invalid token")]
    Invalid,

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Verifies a bearer token into claims.
///
/// Kept as a trait so the HTTP layer (and tests) can swap implementations.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, TokenError>;
}

/// HS256 JWT codec: mints and verifies bearer tokens with a shared secret.
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256TokenCodec {
    pub const DEFAULT_TTL_HOURS: i64 = 24;

    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::hours(Self::DEFAULT_TTL_HOURS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Mint a signed token binding a user id + role, valid for the codec TTL.
    pub fn issue(&self, user_id: UserId, role: Role, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = AccessClaims {
            sub: user_id,
            role,
            issued_at: now,
            expires_at: now + self.ttl,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }
}

impl TokenVerifier for Hs256TokenCodec {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, TokenError> {
        // Expiry lives in our own claim fields; jsonwebtoken only checks the
        // signature here.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<AccessClaims>(token, &self.decoding, &validation)
            .map_err(|_| TokenError::Invalid)?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
