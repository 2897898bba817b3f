//! Authenticate → authorize composition, transport-agnostic.

use std::sync::Arc;

use crate::{AccessError, Authenticator, Capability, Credentials, Principal, RoleTable};

/// What an endpoint demands of a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityRequirement {
    /// No credential needed; the handler runs for anyone.
    Public,
    /// A valid credential whose role grants the capability.
    Requires(Capability),
}

impl CapabilityRequirement {
    pub fn requires(name: &'static str) -> Self {
        Self::Requires(Capability::new(name))
    }
}

/// Runs the ordered gate chain for an endpoint: authenticate, then check the
/// principal's role against the endpoint's declared capability.
///
/// A failed gate short-circuits; the handler behind it never runs.
#[derive(Clone)]
pub struct Gatekeeper {
    authenticator: Authenticator,
    policy: Arc<RoleTable>,
}

impl Gatekeeper {
    pub fn new(authenticator: Authenticator, policy: Arc<RoleTable>) -> Self {
        Self {
            authenticator,
            policy,
        }
    }

    /// Admit or reject a request.
    ///
    /// Public endpoints skip both gates and yield no principal. Otherwise the
    /// caller is authenticated first; only an authenticated principal can be
    /// `Forbidden`, which keeps the two rejections distinguishable.
    pub fn admit(
        &self,
        credentials: &Credentials,
        requirement: &CapabilityRequirement,
    ) -> Result<Option<Principal>, AccessError> {
        let capability = match requirement {
            CapabilityRequirement::Public => return Ok(None),
            CapabilityRequirement::Requires(capability) => capability,
        };

        let principal = self.authenticator.authenticate(credentials)?;

        if !self.policy.is_allowed(&principal.role, capability) {
            return Err(AccessError::Forbidden(capability.clone()));
        }

        Ok(Some(principal))
    }
}
