//! Endpoint registry.
//!
//! Each resource module declares its endpoints as (method, path, capability
//! requirement, handler) tuples; the app builder merges them into public and
//! gated routers and logs every registration.

use std::sync::Arc;

use axum::{Router, routing::MethodRouter};

use quorum_auth::{CapabilityRequirement, Gatekeeper};

use crate::middleware::{self, CapabilityGate};

pub mod auth;
pub mod comments;
pub mod polls;
pub mod system;
pub mod users;

pub struct Endpoint {
    pub method: &'static str,
    pub path: &'static str,
    pub requirement: CapabilityRequirement,
    pub handler: MethodRouter,
}

impl Endpoint {
    pub fn public(method: &'static str, path: &'static str, handler: MethodRouter) -> Self {
        Self {
            method,
            path,
            requirement: CapabilityRequirement::Public,
            handler,
        }
    }

    pub fn guarded(
        method: &'static str,
        path: &'static str,
        capability: &'static str,
        handler: MethodRouter,
    ) -> Self {
        Self {
            method,
            path,
            requirement: CapabilityRequirement::requires(capability),
            handler,
        }
    }
}

/// One resource module's endpoints.
pub struct ResourceRoutes {
    pub name: &'static str,
    pub endpoints: Vec<Endpoint>,
}

impl ResourceRoutes {
    /// Split into (public, protected) routers, wiring one capability gate per
    /// guarded endpoint. Protected routes still need the router-level
    /// authentication gate layered on by the app builder.
    pub fn into_routers(self, gatekeeper: &Arc<Gatekeeper>) -> (Router, Router) {
        let mut public = Router::new();
        let mut protected = Router::new();

        for endpoint in self.endpoints {
            let requirement = match &endpoint.requirement {
                CapabilityRequirement::Public => "public".to_string(),
                CapabilityRequirement::Requires(capability) => format!("requires {capability}"),
            };
            tracing::info!(
                resource = self.name,
                method = endpoint.method,
                path = endpoint.path,
                requirement,
                "registered endpoint"
            );

            match endpoint.requirement {
                CapabilityRequirement::Public => {
                    public = public.route(endpoint.path, endpoint.handler);
                }
                requirement @ CapabilityRequirement::Requires(_) => {
                    let gate = CapabilityGate {
                        gatekeeper: gatekeeper.clone(),
                        requirement,
                    };
                    let gated = Router::new()
                        .route(endpoint.path, endpoint.handler)
                        .route_layer(axum::middleware::from_fn_with_state(
                            gate,
                            middleware::capability_gate,
                        ));
                    protected = protected.merge(gated);
                }
            }
        }

        (public, protected)
    }
}

/// All resource modules, in registration order.
pub fn resources() -> Vec<ResourceRoutes> {
    vec![
        system::resource(),
        auth::resource(),
        users::resource(),
        polls::resource(),
        comments::resource(),
    ]
}
