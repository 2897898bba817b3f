//! The authenticated entity and the storage boundary it is resolved through.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use quorum_core::UserId;

use crate::{Role, SecretHash};

/// A resolved user record.
///
/// The secret field only ever holds the output of the crypto service's hash;
/// it is skipped on serialization and redacted in `Debug` so plaintext or
/// hash material cannot reach a response body or a log line.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub secret_hash: SecretHash,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not serve the lookup (surfaced to callers as a
    /// generic server fault, never with internal detail).
    #[error("principal store unavailable: {0}")]
    Unavailable(String),
}

/// Storage boundary consumed by the authenticator.
///
/// Query semantics live behind this trait; the access-control core only ever
/// asks "does this subject still exist, and what is it".
pub trait PrincipalStore: Send + Sync {
    fn find_by_id(&self, id: &UserId) -> Result<Option<Principal>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> Principal {
        Principal {
            id: UserId::new(),
            email: "alice@example.com".to_string(),
            display_name: "Alice".to_string(),
            secret_hash: SecretHash::from_hashed("$2b$04$abcdefghijklmnopqrstuv"),
            role: Role::new("member"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn secret_hash_never_serializes() {
        let body = serde_json::to_value(principal()).unwrap();
        assert!(body.get("secret_hash").is_none());
        assert!(body.get("email").is_some());
    }

    #[test]
    fn debug_never_shows_hash_material() {
        let rendered = format!("{:?}", principal());
        assert!(!rendered.contains("$2b$"));
    }
}
