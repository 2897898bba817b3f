//! Signed, time-bound credential encoding/decoding (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use quorum_core::UserId;

/// Claims carried by an access token.
///
/// `iat`/`exp` are unix timestamps in seconds, per JWT convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject / principal identifier.
    pub sub: UserId,

    /// Issued-at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The signature does not verify against the signing key. Claims of such
    /// a token must never be trusted.
    #[error("token signature is invalid")]
    InvalidSignature,

    /// Well-formed and correctly signed, but past its expiry. Kept distinct
    /// from a forgery so callers can offer a re-authentication path; both are
    /// non-authenticated outcomes at the authorization layer.
    #[error("token has expired")]
    Expired,

    /// The token cannot be parsed into the expected shape.
    #[error("malformed token")]
    Malformed,

    #[error("token encoding failed")]
    Encode,
}

/// Encodes and decodes signed access tokens with a fixed process-wide key.
///
/// Key rotation is intentionally not modeled; only expiry invalidates an
/// issued credential.
#[derive(Clone)]
pub struct TokenService {
    header: Header,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(signing_key: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked explicitly after signature verification so the
        // two gates stay independent and the error taxonomy stays ours.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            header: Header::new(Algorithm::HS256),
            encoding: EncodingKey::from_secret(signing_key),
            decoding: DecodingKey::from_secret(signing_key),
            validation,
        }
    }

    /// Issue a token for `subject` expiring `ttl` from now.
    pub fn issue(&self, subject: UserId, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        self.issue_at(subject, now, now + ttl)
    }

    /// Issue a token with explicit timestamps (tests pin these).
    pub fn issue_at(
        &self,
        subject: UserId,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = AccessClaims {
            sub: subject,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        jsonwebtoken::encode(&self.header, &claims, &self.encoding).map_err(|_| TokenError::Encode)
    }

    /// Decode and validate a token against the current time.
    ///
    /// Signature verification happens before any claim is looked at; an
    /// unverified claim is never used for a decision.
    pub fn decode(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Decode and validate a token as of `now`.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, TokenError> {
        let data = jsonwebtoken::decode::<AccessClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })?;

        let claims = data.claims;
        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
