//! Bearer-token minting and verification.
//!
//! # Purpose
//! Defines the claim structure and the HMAC-SHA256 codec for the stateless
//! session credential. Every replica can validate a credential with nothing
//! but the shared secret; there is no server-side session record.
//!
//! # Key invariants
//! - Tokens are always HS256; no other algorithm is accepted on decode.
//! - Lifetime is 24 hours from issuance with zero clock-skew leeway.
//! - The `sub` claim must equal `user_auth`; anything else is malformed.
//!
//! # Security boundary
//! Verification failures are surfaced to clients only as a generic 401; the
//! variants below exist for logs and tests, never for response bodies.
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Credential lifetime. Fixed by the session contract.
pub const TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Fixed `sub` claim distinguishing session credentials from any other JWT
/// that might be signed with the same secret.
pub const TOKEN_SUBJECT: &str = "user_auth";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub iat: i64,
    pub exp: i64,
    pub sub: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("bad signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

/// Stateless HS256 codec over the configured secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a credential for `user_id` valid for [`TOKEN_TTL`] from now.
    pub fn issue(&self, user_id: i64) -> Result<String, TokenError> {
        let now = unix_now();
        self.issue_claims(&Claims {
            user_id,
            iat: now,
            exp: now + TOKEN_TTL.as_secs() as i64,
            sub: TOKEN_SUBJECT.to_string(),
        })
    }

    /// Sign an explicit claim set. Used by [`issue`](Self::issue) and by tests
    /// that need control over `iat`/`exp`.
    pub fn issue_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|_| TokenError::Malformed)
    }

    /// Verify signature, expiry, and subject; return the embedded claims.
    /// Expiry is a strict comparison, no leeway.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            })?;
        if data.claims.sub != TOKEN_SUBJECT {
            return Err(TokenError::Malformed);
        }
        Ok(data.claims)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
