//! Request-scoped context attached by the authentication gate.

use quorum_auth::{Principal, Role};
use quorum_core::UserId;

/// The authenticated principal for a request.
///
/// Inserted into request extensions by the authentication gate; downstream
/// gates and handlers read it from there. Never shared across requests.
#[derive(Debug, Clone)]
pub struct PrincipalContext(Principal);

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self(principal)
    }

    pub fn principal(&self) -> &Principal {
        &self.0
    }

    pub fn id(&self) -> UserId {
        self.0.id
    }

    pub fn role(&self) -> &Role {
        &self.0.role
    }
}
