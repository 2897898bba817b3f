//! Process configuration, loaded from the environment.

use thiserror::Error;

use quorum_auth::RoleConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("QUORUM_HASH_COST must be an integer: '{0}'")]
    InvalidHashCost(String),

    #[error("QUORUM_TOKEN_TTL_MIN must be a positive integer: '{0}'")]
    InvalidTokenTtl(String),

    #[error("failed to read roles file '{path}': {source}")]
    RolesFileRead {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse roles file '{path}': {source}")]
    RolesFileParse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Process-wide token signing key, fixed for the process lifetime.
    pub signing_key: String,
    /// bcrypt cost factor for secret hashing.
    pub hash_cost: u32,
    /// Issued-token lifetime in minutes.
    pub token_ttl_min: i64,
    pub roles: Vec<RoleConfig>,
}

impl AppConfig {
    /// Load configuration from `QUORUM_*` environment variables.
    ///
    /// The role table itself is validated by the service registry at boot;
    /// this only deals with reading and parsing the inputs.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr =
            std::env::var("QUORUM_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let signing_key = std::env::var("QUORUM_SIGNING_KEY").unwrap_or_else(|_| {
            tracing::warn!("QUORUM_SIGNING_KEY not set; using insecure dev default");
            "dev-secret".to_string()
        });

        let hash_cost = match std::env::var("QUORUM_HASH_COST") {
            Ok(raw) => raw
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidHashCost(raw))?,
            Err(_) => quorum_auth::crypto::DEFAULT_COST,
        };

        let token_ttl_min = match std::env::var("QUORUM_TOKEN_TTL_MIN") {
            Ok(raw) => match raw.parse::<i64>() {
                Ok(ttl) if ttl > 0 => ttl,
                _ => return Err(ConfigError::InvalidTokenTtl(raw)),
            },
            Err(_) => 60,
        };

        let roles = match std::env::var("QUORUM_ROLES_FILE") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|source| {
                    ConfigError::RolesFileRead {
                        path: path.clone(),
                        source,
                    }
                })?;
                serde_json::from_str(&raw)
                    .map_err(|source| ConfigError::RolesFileParse { path, source })?
            }
            Err(_) => Self::default_roles(),
        };

        Ok(Self {
            bind_addr,
            signing_key,
            hash_cost,
            token_ttl_min,
            roles,
        })
    }

    /// Built-in role table used when no roles file is configured.
    pub fn default_roles() -> Vec<RoleConfig> {
        vec![
            RoleConfig::new("admin", &["*"], false),
            RoleConfig::new(
                "member",
                &["polls.create", "polls.vote", "comments.create", "profile.write"],
                true,
            ),
        ]
    }
}
