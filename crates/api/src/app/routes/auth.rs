//! Registration and login flows.
//!
//! The only places where a plaintext secret is handled: it is hashed (or
//! verified) and dropped, never persisted or logged.

use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use chrono::{Duration, Utc};
use serde_json::json;

use quorum_auth::Principal;
use quorum_core::UserId;

use super::{Endpoint, ResourceRoutes};
use crate::app::{dto, errors, services::ServiceRegistry};

pub fn resource() -> ResourceRoutes {
    ResourceRoutes {
        name: "auth",
        endpoints: vec![
            Endpoint::public("POST", "/auth/register", post(register)),
            Endpoint::public("POST", "/auth/login", post(login)),
        ],
    }
}

pub async fn register(
    Extension(registry): Extension<Arc<ServiceRegistry>>,
    Json(body): Json<dto::RegisterRequest>,
) -> axum::response::Response {
    for check in [
        dto::validate_email(&body.email),
        dto::validate_name(&body.name),
        dto::validate_password(&body.password),
    ] {
        if let Err(msg) = check {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", msg);
        }
    }

    // Hashing is CPU-heavy; keep it off the async workers.
    let crypto = registry.crypto();
    let password = body.password;
    let secret_hash = match tokio::task::spawn_blocking(move || crypto.hash(&password)).await {
        Ok(Ok(hash)) => hash,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "secret hashing failed");
            return errors::server_error();
        }
        Err(e) => {
            tracing::error!(error = %e, "hashing task failed");
            return errors::server_error();
        }
    };

    let now = Utc::now();
    let principal = Principal {
        id: UserId::new(),
        email: body.email.trim().to_lowercase(),
        display_name: body.name.trim().to_string(),
        secret_hash,
        role: registry.policy().default_role().clone(),
        created_at: now,
        updated_at: now,
    };
    let id = principal.id;

    if let Err(e) = registry.users().insert(principal) {
        return errors::domain_error_to_response(e);
    }

    (StatusCode::CREATED, Json(json!({ "id": id }))).into_response()
}

pub async fn login(
    Extension(registry): Extension<Arc<ServiceRegistry>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    // Uniform rejection for unknown email and wrong password alike.
    let rejected = || {
        errors::json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid email or password",
        )
    };

    let Some(principal) = registry.users().find_by_email(&body.email.trim().to_lowercase())
    else {
        return rejected();
    };

    let crypto = registry.crypto();
    let secret_hash = principal.secret_hash.clone();
    let password = body.password;
    let verified =
        match tokio::task::spawn_blocking(move || crypto.verify(&password, &secret_hash)).await {
            Ok(Ok(verified)) => verified,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "secret verification failed");
                return errors::server_error();
            }
            Err(e) => {
                tracing::error!(error = %e, "verification task failed");
                return errors::server_error();
            }
        };

    if !verified {
        return rejected();
    }

    let ttl_min = registry.config().token_ttl_min;
    match registry.tokens().issue(principal.id, Duration::minutes(ttl_min)) {
        Ok(token) => (
            StatusCode::OK,
            Json(json!({
                "token": token,
                "token_type": "Bearer",
                "expires_in": ttl_min * 60,
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "token issuance failed");
            errors::server_error()
        }
    }
}
