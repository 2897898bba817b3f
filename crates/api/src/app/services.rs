//! The process's dependency root.
//!
//! `ServiceRegistry` owns every singleton service. Services are constructed
//! on first access and cached for the process lifetime; services reference
//! each other through the registry, so no explicit wiring step exists. The
//! registry itself is built once in `main` (or per test) and handed down by
//! `Arc`; it is never reachable globally, so tests get independent instances.

use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use quorum_auth::{
    Authenticator, CryptoError, CryptoService, Gatekeeper, PolicyError, RoleTable, TokenService,
};
use quorum_infra::{CommentStore, PollStore, UserStore};

use crate::config::AppConfig;

/// Fatal boot failures. A process with an invalid role table or cost factor
/// must refuse to serve traffic.
#[derive(Debug, Error)]
pub enum BootError {
    #[error("role configuration rejected: {0}")]
    Policy(#[from] PolicyError),

    #[error("crypto configuration rejected: {0}")]
    Crypto(#[from] CryptoError),
}

thread_local! {
    // Names of services currently under construction on this thread. A name
    // reappearing here means a service asked for itself mid-construction,
    // which is a configuration cycle, not a retryable condition.
    static CONSTRUCTION_STACK: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
}

pub struct ServiceRegistry {
    config: AppConfig,
    // Validated eagerly: these are exactly the fail-fast config checks.
    policy: Arc<RoleTable>,
    crypto: Arc<CryptoService>,
    // Constructed on first access, exactly once even under concurrent access.
    tokens: OnceLock<Arc<TokenService>>,
    users: OnceLock<Arc<UserStore>>,
    polls: OnceLock<Arc<PollStore>>,
    comments: OnceLock<Arc<CommentStore>>,
    authenticator: OnceLock<Arc<Authenticator>>,
    gatekeeper: OnceLock<Arc<Gatekeeper>>,
}

impl ServiceRegistry {
    /// Build a registry, validating configuration-derived invariants
    /// (exactly one default role, cost factor within range) up front.
    pub fn new(config: AppConfig) -> Result<Self, BootError> {
        let policy = Arc::new(RoleTable::from_config(&config.roles)?);
        let crypto = Arc::new(CryptoService::new(config.hash_cost)?);

        Ok(Self {
            config,
            policy,
            crypto,
            tokens: OnceLock::new(),
            users: OnceLock::new(),
            polls: OnceLock::new(),
            comments: OnceLock::new(),
            authenticator: OnceLock::new(),
            gatekeeper: OnceLock::new(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn policy(&self) -> Arc<RoleTable> {
        self.policy.clone()
    }

    pub fn crypto(&self) -> Arc<CryptoService> {
        self.crypto.clone()
    }

    pub fn tokens(&self) -> Arc<TokenService> {
        self.get_or_build("tokens", &self.tokens, |r| {
            TokenService::new(r.config.signing_key.as_bytes())
        })
    }

    pub fn users(&self) -> Arc<UserStore> {
        self.get_or_build("users", &self.users, |_| UserStore::new())
    }

    pub fn polls(&self) -> Arc<PollStore> {
        self.get_or_build("polls", &self.polls, |_| PollStore::new())
    }

    pub fn comments(&self) -> Arc<CommentStore> {
        self.get_or_build("comments", &self.comments, |_| CommentStore::new())
    }

    pub fn authenticator(&self) -> Arc<Authenticator> {
        self.get_or_build("authenticator", &self.authenticator, |r| {
            Authenticator::new(r.tokens(), r.users())
        })
    }

    pub fn gatekeeper(&self) -> Arc<Gatekeeper> {
        self.get_or_build("gatekeeper", &self.gatekeeper, |r| {
            Gatekeeper::new(r.authenticator().as_ref().clone(), r.policy())
        })
    }

    /// Construct-on-first-access with single-instance semantics.
    ///
    /// Concurrent first access is serialized by the `OnceLock`; exactly one
    /// caller constructs, everyone observes that instance. Same-thread
    /// re-entry on the same service name is a construction cycle and aborts
    /// with the cycle path.
    fn get_or_build<T>(
        &self,
        name: &'static str,
        cell: &OnceLock<Arc<T>>,
        build: impl FnOnce(&Self) -> T,
    ) -> Arc<T> {
        if let Some(existing) = cell.get() {
            return existing.clone();
        }

        CONSTRUCTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&name) {
                let mut cycle: Vec<&str> = stack.clone();
                cycle.push(name);
                panic!("service construction cycle: {}", cycle.join(" -> "));
            }
            stack.push(name);
        });

        let instance = cell
            .get_or_init(|| {
                tracing::info!(service = name, "loaded service");
                Arc::new(build(self))
            })
            .clone();

        CONSTRUCTION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        instance
    }
}
