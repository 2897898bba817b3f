//! Credential → principal resolution.

use std::sync::Arc;

use thiserror::Error;

use crate::{Capability, Principal, PrincipalStore, StoreError, TokenError, TokenService};

/// Gate-level failure taxonomy.
///
/// `Unauthenticated`/`SessionExpired`/`Forbidden` are caller-recoverable
/// rejections; `Store` is an internal fault and must surface as a generic
/// server error without detail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// No credential, a forged or malformed credential, or an unknown
    /// subject. Deliberately uniform: internal detail never reaches callers.
    #[error("unauthenticated")]
    Unauthenticated,

    /// A well-formed, correctly signed credential past its expiry. Distinct
    /// so callers can offer a re-authentication path; still a
    /// non-authenticated outcome.
    #[error("session expired")]
    SessionExpired,

    /// Authenticated, but the role lacks the required capability.
    #[error("missing capability '{0}'")]
    Forbidden(Capability),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where the caller placed the credential, in checking order.
///
/// An already-attached principal (from an earlier gate) short-circuits; the
/// out-of-band header channel is next; the in-body channel is consulted only
/// if the header yields nothing.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub attached: Option<Principal>,
    pub header_token: Option<String>,
    pub body_token: Option<String>,
}

impl Credentials {
    pub fn attached(principal: Principal) -> Self {
        Self {
            attached: Some(principal),
            ..Self::default()
        }
    }

    pub fn header(token: impl Into<String>) -> Self {
        Self {
            header_token: Some(token.into()),
            ..Self::default()
        }
    }

    pub fn body(token: impl Into<String>) -> Self {
        Self {
            body_token: Some(token.into()),
            ..Self::default()
        }
    }
}

/// Resolves a credential to a principal via the token service and the
/// principal store.
#[derive(Clone)]
pub struct Authenticator {
    tokens: Arc<TokenService>,
    store: Arc<dyn PrincipalStore>,
}

impl Authenticator {
    pub fn new(tokens: Arc<TokenService>, store: Arc<dyn PrincipalStore>) -> Self {
        Self { tokens, store }
    }

    /// Authenticate a request's credentials.
    ///
    /// Idempotent: an attached principal is returned as-is. Token decode
    /// failures collapse to `Unauthenticated` (expiry keeps its own variant);
    /// a valid token whose subject no longer exists is also
    /// `Unauthenticated`, since deletion must win over an outstanding
    /// credential.
    pub fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AccessError> {
        if let Some(principal) = &credentials.attached {
            return Ok(principal.clone());
        }

        let token = credentials
            .header_token
            .as_deref()
            .or(credentials.body_token.as_deref())
            .ok_or(AccessError::Unauthenticated)?;

        let claims = self.tokens.decode(token).map_err(|e| match e {
            TokenError::Expired => AccessError::SessionExpired,
            _ => AccessError::Unauthenticated,
        })?;

        match self.store.find_by_id(&claims.sub)? {
            Some(principal) => Ok(principal),
            None => Err(AccessError::Unauthenticated),
        }
    }
}
