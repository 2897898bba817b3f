//! One-way secret hashing and verification (bcrypt).

use serde::Deserialize;
use thiserror::Error;

/// Lowest cost factor bcrypt accepts.
pub const MIN_COST: u32 = 4;
/// Highest cost factor bcrypt accepts.
pub const MAX_COST: u32 = 31;
/// Reasonable default for production deployments.
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

/// A hashed secret as produced by [`CryptoService::hash`].
///
/// The wrapped string embeds the bcrypt parameters (cost, salt) needed for
/// verification. It is never the plaintext secret, and its `Debug` output is
/// redacted so it cannot leak through logs.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SecretHash(String);

impl SecretHash {
    /// Wrap an already-hashed value (e.g. loaded from a store).
    pub fn from_hashed(hashed: impl Into<String>) -> Self {
        Self(hashed.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SecretHash(<redacted>)")
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("cost factor {0} outside accepted range {MIN_COST}..={MAX_COST}")]
    InvalidCost(u32),

    #[error("hashing failed")]
    HashFailed,

    #[error("stored hash is malformed")]
    MalformedHash,
}

/// CPU-bound secret hashing service.
///
/// Hash and verify are deliberately expensive (tunable via the cost factor).
/// Callers on a cooperative scheduler must offload these to a blocking pool.
#[derive(Debug, Clone)]
pub struct CryptoService {
    cost: u32,
}

impl CryptoService {
    /// Create a service with the given default cost factor.
    ///
    /// Fails fast if the cost is outside bcrypt's accepted range, so a
    /// misconfigured process refuses to start rather than failing on the
    /// first registration.
    pub fn new(cost: u32) -> Result<Self, CryptoError> {
        check_cost(cost)?;
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash `secret` with the configured cost factor.
    pub fn hash(&self, secret: &str) -> Result<SecretHash, CryptoError> {
        self.hash_with_cost(secret, self.cost)
    }

    /// Hash `secret` with an explicit cost factor.
    ///
    /// The plaintext is consumed here and never logged.
    pub fn hash_with_cost(&self, secret: &str, cost: u32) -> Result<SecretHash, CryptoError> {
        check_cost(cost)?;
        let hashed = bcrypt::hash(secret, cost).map_err(|_| CryptoError::HashFailed)?;
        Ok(SecretHash(hashed))
    }

    /// Whether `secret`, hashed with the parameters embedded in `hashed`,
    /// reproduces `hashed`. The original secret is never reconstructed.
    pub fn verify(&self, secret: &str, hashed: &SecretHash) -> Result<bool, CryptoError> {
        bcrypt::verify(secret, hashed.as_str()).map_err(|_| CryptoError::MalformedHash)
    }
}

fn check_cost(cost: u32) -> Result<(), CryptoError> {
    if !(MIN_COST..=MAX_COST).contains(&cost) {
        return Err(CryptoError::InvalidCost(cost));
    }
    Ok(())
}
