//! Role → capability resolution.
//!
//! The role table is loaded once from configuration, validated eagerly
//! (exactly one default role), and read-only thereafter.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Capability, Role};

/// One configured role, as it appears in configuration input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleConfig {
    pub name: String,
    pub capabilities: Vec<String>,
    /// At most one role across the whole table may set this.
    #[serde(default)]
    pub default: bool,
}

impl RoleConfig {
    pub fn new(name: impl Into<String>, capabilities: &[&str], default: bool) -> Self {
        Self {
            name: name.into(),
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
            default,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("no role is marked as default")]
    NoDefaultRole,

    #[error("multiple roles are marked as default: {0:?}")]
    MultipleDefaultRoles(Vec<String>),

    #[error("duplicate role '{0}'")]
    DuplicateRole(String),
}

/// Validated role → capability table with a designated default role.
#[derive(Debug, Clone)]
pub struct RoleTable {
    table: HashMap<Role, BTreeSet<Capability>>,
    default_role: Role,
}

impl RoleTable {
    /// Build and validate a table from configuration.
    ///
    /// Fails if a role name repeats or if the number of default-flagged roles
    /// is not exactly one. This runs at load time; a process with an invalid
    /// table must not serve traffic.
    pub fn from_config(roles: &[RoleConfig]) -> Result<Self, PolicyError> {
        let mut table: HashMap<Role, BTreeSet<Capability>> = HashMap::new();
        let mut defaults: Vec<String> = Vec::new();

        for role in roles {
            let name = Role::new(role.name.clone());
            if table.contains_key(&name) {
                return Err(PolicyError::DuplicateRole(role.name.clone()));
            }
            let capabilities = role
                .capabilities
                .iter()
                .map(|c| Capability::new(c.clone()))
                .collect();
            table.insert(name, capabilities);
            if role.default {
                defaults.push(role.name.clone());
            }
        }

        let default_role = match defaults.as_slice() {
            [single] => Role::new(single.clone()),
            [] => return Err(PolicyError::NoDefaultRole),
            _ => return Err(PolicyError::MultipleDefaultRoles(defaults)),
        };

        Ok(Self {
            table,
            default_role,
        })
    }

    /// The capability set granted to `role`.
    pub fn capabilities_of(&self, role: &Role) -> Result<&BTreeSet<Capability>, PolicyError> {
        self.table
            .get(role)
            .ok_or_else(|| PolicyError::UnknownRole(role.as_str().to_string()))
    }

    /// Membership test. An unknown role yields `false` so authorization
    /// failure is uniform regardless of cause; callers wanting diagnostics
    /// use [`RoleTable::capabilities_of`].
    pub fn is_allowed(&self, role: &Role, capability: &Capability) -> bool {
        let Some(granted) = self.table.get(role) else {
            return false;
        };
        granted.contains(capability) || granted.iter().any(Capability::is_wildcard)
    }

    /// The role assigned to principals that specify none.
    pub fn default_role(&self) -> &Role {
        &self.default_role
    }
}
