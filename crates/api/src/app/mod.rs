//! Application assembly.
//!
//! Builds the full router from the endpoint registry: public routes go
//! straight through, protected routes pass the authentication gate and
//! their per-endpoint capability gates.

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use crate::middleware::{self, AuthState};
use services::ServiceRegistry;

pub fn build_app(registry: Arc<ServiceRegistry>) -> Router {
    let gatekeeper = registry.gatekeeper();
    let auth_state = AuthState {
        authenticator: registry.authenticator(),
    };

    let mut public = Router::new();
    let mut protected = Router::new();
    for resource in routes::resources() {
        let (resource_public, resource_protected) = resource.into_routers(&gatekeeper);
        public = public.merge(resource_public);
        protected = protected.merge(resource_protected);
    }

    // The authentication gate wraps only the protected half; capability gates
    // are already layered per endpoint and so run after it.
    let protected = protected.layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::authentication_gate,
    ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(registry)))
}
