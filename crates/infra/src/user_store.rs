//! In-memory user store.
//!
//! Serves as the principal store consumed by the authenticator. Secrets
//! arrive here already hashed; the write path is responsible for invoking the
//! crypto service before persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use quorum_auth::{Principal, PrincipalStore, StoreError};
use quorum_core::{DomainError, UserId};

#[derive(Debug, Default)]
pub struct UserStore {
    inner: RwLock<HashMap<UserId, Principal>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new user. Email addresses are unique.
    pub fn insert(&self, principal: Principal) -> Result<(), DomainError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::conflict("user store lock poisoned"))?;

        if map.values().any(|p| p.email == principal.email) {
            return Err(DomainError::conflict(format!(
                "email '{}' is already registered",
                principal.email
            )));
        }
        map.insert(principal.id, principal);
        Ok(())
    }

    pub fn find_by_email(&self, email: &str) -> Option<Principal> {
        let map = self.inner.read().ok()?;
        map.values().find(|p| p.email == email).cloned()
    }

    pub fn list(&self) -> Vec<Principal> {
        match self.inner.read() {
            Ok(map) => {
                let mut users: Vec<_> = map.values().cloned().collect();
                users.sort_by_key(|p| p.created_at);
                users
            }
            Err(_) => vec![],
        }
    }

    /// Apply `update` to the stored record and bump its update timestamp.
    pub fn update(
        &self,
        id: &UserId,
        update: impl FnOnce(&mut Principal),
    ) -> Result<Principal, DomainError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::conflict("user store lock poisoned"))?;

        let principal = map.get_mut(id).ok_or(DomainError::NotFound)?;
        update(principal);
        principal.updated_at = Utc::now();
        Ok(principal.clone())
    }

    pub fn delete(&self, id: &UserId) -> Result<(), DomainError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::conflict("user store lock poisoned"))?;
        map.remove(id).map(|_| ()).ok_or(DomainError::NotFound)
    }
}

impl PrincipalStore for UserStore {
    fn find_by_id(&self, id: &UserId) -> Result<Option<Principal>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::Unavailable("user store lock poisoned".to_string()))?;
        Ok(map.get(id).cloned())
    }
}
