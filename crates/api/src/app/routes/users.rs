//! Users resource.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, patch, put},
};
use serde_json::json;

use quorum_auth::{Credentials, PrincipalStore, SecretHash};
use quorum_core::UserId;

use super::{Endpoint, ResourceRoutes};
use crate::app::{dto, errors, services::ServiceRegistry};
use crate::context::PrincipalContext;
use crate::middleware;

pub fn resource() -> ResourceRoutes {
    ResourceRoutes {
        name: "users",
        endpoints: vec![
            Endpoint::public("GET", "/users/me", get(get_me)),
            Endpoint::guarded("PATCH", "/users/me", "profile.write", patch(update_me)),
            Endpoint::guarded("GET", "/users", "users.read", get(list_users)),
            Endpoint::guarded("GET", "/users/:id", "users.read", get(get_user)),
            Endpoint::guarded("PUT", "/users/:id", "users.write", put(modify_user)),
            Endpoint::guarded("PATCH", "/users/:id", "users.write", patch(update_user)),
            Endpoint::guarded("DELETE", "/users/:id", "users.delete", delete(delete_user)),
        ],
    }
}

/// Resolve the caller from a provided token.
///
/// Registered on the public router so the in-body fallback channel stays
/// reachable: the header is checked first, the body `token` field second.
pub async fn get_me(
    Extension(registry): Extension<Arc<ServiceRegistry>>,
    headers: HeaderMap,
    body: Option<Json<dto::TokenBody>>,
) -> axum::response::Response {
    let credentials = Credentials {
        attached: None,
        header_token: middleware::bearer_token(&headers).map(str::to_string),
        body_token: body.and_then(|Json(b)| b.token),
    };

    match registry.authenticator().authenticate(&credentials) {
        Ok(principal) => (StatusCode::OK, Json(json!({ "user": principal }))).into_response(),
        Err(e) => errors::access_error_to_response(e),
    }
}

pub async fn update_me(
    Extension(registry): Extension<Arc<ServiceRegistry>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::UpdateUserRequest>,
) -> axum::response::Response {
    apply_update(&registry, principal.id(), body).await
}

pub async fn list_users(
    Extension(registry): Extension<Arc<ServiceRegistry>>,
) -> axum::response::Response {
    let users = registry.users().list();
    (StatusCode::OK, Json(json!({ "users": users }))).into_response()
}

pub async fn get_user(
    Extension(registry): Extension<Arc<ServiceRegistry>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match registry.users().find_by_id(&id) {
        Ok(Some(user)) => (StatusCode::OK, Json(json!({ "user": user }))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => {
            tracing::error!(error = %e, "user lookup failed");
            errors::server_error()
        }
    }
}

pub async fn modify_user(
    Extension(registry): Extension<Arc<ServiceRegistry>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ModifyUserRequest>,
) -> axum::response::Response {
    let id: UserId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    // Full replacement: every mutable field is required.
    let update = dto::UpdateUserRequest {
        email: Some(body.email),
        name: Some(body.name),
        password: Some(body.password),
    };
    apply_update(&registry, id, update).await
}

pub async fn update_user(
    Extension(registry): Extension<Arc<ServiceRegistry>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateUserRequest>,
) -> axum::response::Response {
    let id: UserId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };
    apply_update(&registry, id, body).await
}

pub async fn delete_user(
    Extension(registry): Extension<Arc<ServiceRegistry>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match registry.users().delete(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Shared write path for profile updates.
///
/// The secret is re-hashed only when the password field changes; the entity
/// itself carries no hashing behavior.
async fn apply_update(
    registry: &Arc<ServiceRegistry>,
    id: UserId,
    update: dto::UpdateUserRequest,
) -> axum::response::Response {
    let checks = [
        update.email.as_deref().map(dto::validate_email),
        update.name.as_deref().map(dto::validate_name),
        update.password.as_deref().map(dto::validate_password),
    ];
    for check in checks.into_iter().flatten() {
        if let Err(msg) = check {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", msg);
        }
    }

    let new_hash: Option<SecretHash> = match update.password {
        Some(password) => {
            let crypto = registry.crypto();
            match tokio::task::spawn_blocking(move || crypto.hash(&password)).await {
                Ok(Ok(hash)) => Some(hash),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "secret hashing failed");
                    return errors::server_error();
                }
                Err(e) => {
                    tracing::error!(error = %e, "hashing task failed");
                    return errors::server_error();
                }
            }
        }
        None => None,
    };

    let result = registry.users().update(&id, |principal| {
        if let Some(email) = update.email {
            principal.email = email.trim().to_lowercase();
        }
        if let Some(name) = update.name {
            principal.display_name = name.trim().to_string();
        }
        if let Some(hash) = new_hash {
            principal.secret_hash = hash;
        }
    });

    match result {
        Ok(updated) => (StatusCode::OK, Json(json!({ "user": updated }))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
