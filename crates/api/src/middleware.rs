//! Request gates: authentication and per-endpoint capability checks.
//!
//! The gate chain for a protected endpoint is ordered: the router-level
//! authentication gate runs first and attaches the principal, then the
//! endpoint's capability gate, then the handler. A failed gate
//! short-circuits; the handler never runs.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use quorum_auth::{
    AccessError, Authenticator, CapabilityRequirement, Credentials, Gatekeeper,
};

use crate::app::errors;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub authenticator: Arc<Authenticator>,
}

/// Router-level authentication gate.
///
/// Uses the out-of-band header channel only; the in-body fallback channel is
/// exposed solely by `GET /users/me`, which authenticates in its handler.
pub async fn authentication_gate(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let credentials = Credentials {
        attached: None,
        header_token: bearer_token(req.headers()).map(str::to_string),
        body_token: None,
    };

    match state.authenticator.authenticate(&credentials) {
        Ok(principal) => {
            req.extensions_mut().insert(PrincipalContext::new(principal));
            next.run(req).await
        }
        Err(e) => errors::access_error_to_response(e),
    }
}

#[derive(Clone)]
pub struct CapabilityGate {
    pub gatekeeper: Arc<Gatekeeper>,
    pub requirement: CapabilityRequirement,
}

/// Per-endpoint authorization gate.
///
/// Requires a principal attached by the authentication gate; an authenticated
/// principal whose role lacks the capability is `Forbidden`, distinct from
/// `Unauthenticated`.
pub async fn capability_gate(
    State(gate): State<CapabilityGate>,
    req: Request,
    next: Next,
) -> Response {
    let Some(context) = req.extensions().get::<PrincipalContext>() else {
        return errors::access_error_to_response(AccessError::Unauthenticated);
    };

    let credentials = Credentials::attached(context.principal().clone());
    match gate.gatekeeper.admit(&credentials, &gate.requirement) {
        Ok(_) => next.run(req).await,
        Err(e) => errors::access_error_to_response(e),
    }
}

/// Extract a bearer token from the `Authorization` header, if present and
/// well-formed.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
