//! Polls resource.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde_json::json;

use quorum_core::PollId;
use quorum_infra::PollRecord;

use super::{Endpoint, ResourceRoutes};
use crate::app::{dto, errors, services::ServiceRegistry};
use crate::context::PrincipalContext;

pub fn resource() -> ResourceRoutes {
    ResourceRoutes {
        name: "polls",
        endpoints: vec![
            Endpoint::public("GET", "/polls", get(list_polls)),
            Endpoint::public("GET", "/polls/:id", get(get_poll)),
            Endpoint::guarded("POST", "/polls", "polls.create", post(create_poll)),
            Endpoint::guarded("POST", "/polls/:id/vote", "polls.vote", post(vote)),
            Endpoint::guarded("DELETE", "/polls/:id", "polls.delete", delete(delete_poll)),
        ],
    }
}

pub async fn list_polls(
    Extension(registry): Extension<Arc<ServiceRegistry>>,
) -> axum::response::Response {
    let polls = registry.polls().list();
    (StatusCode::OK, Json(json!({ "polls": polls }))).into_response()
}

pub async fn get_poll(
    Extension(registry): Extension<Arc<ServiceRegistry>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PollId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match registry.polls().get(&id) {
        Some(poll) => (StatusCode::OK, Json(json!({ "poll": poll }))).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "poll not found"),
    }
}

pub async fn create_poll(
    Extension(registry): Extension<Arc<ServiceRegistry>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreatePollRequest>,
) -> axum::response::Response {
    if let Err(msg) = dto::validate_poll(&body) {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", msg);
    }

    let poll = PollRecord::new(
        body.question.trim().to_string(),
        body.options
            .into_iter()
            .map(|label| label.trim().to_string())
            .collect(),
        principal.id(),
    );

    match registry.polls().insert(poll.clone()) {
        Ok(()) => (StatusCode::CREATED, Json(json!({ "poll": poll }))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn vote(
    Extension(registry): Extension<Arc<ServiceRegistry>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::VoteRequest>,
) -> axum::response::Response {
    let id: PollId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match registry.polls().vote(&id, body.option, principal.id()) {
        Ok(poll) => (StatusCode::OK, Json(json!({ "poll": poll }))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_poll(
    Extension(registry): Extension<Arc<ServiceRegistry>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PollId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match registry.polls().delete(&id) {
        Ok(()) => {
            registry.comments().delete_for_poll(&id);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
