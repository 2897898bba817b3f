//! Comments resource, nested under polls.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde_json::json;

use quorum_core::{CommentId, PollId};
use quorum_infra::CommentRecord;

use super::{Endpoint, ResourceRoutes};
use crate::app::{dto, errors, services::ServiceRegistry};
use crate::context::PrincipalContext;

pub fn resource() -> ResourceRoutes {
    ResourceRoutes {
        name: "comments",
        endpoints: vec![
            Endpoint::public("GET", "/polls/:id/comments", get(list_comments)),
            Endpoint::guarded(
                "POST",
                "/polls/:id/comments",
                "comments.create",
                post(create_comment),
            ),
            Endpoint::guarded(
                "DELETE",
                "/polls/:id/comments/:comment_id",
                "comments.delete",
                delete(delete_comment),
            ),
        ],
    }
}

pub async fn list_comments(
    Extension(registry): Extension<Arc<ServiceRegistry>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PollId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };
    if registry.polls().get(&id).is_none() {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "poll not found");
    }

    let comments = registry.comments().list_for_poll(&id);
    (StatusCode::OK, Json(json!({ "comments": comments }))).into_response()
}

pub async fn create_comment(
    Extension(registry): Extension<Arc<ServiceRegistry>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::CreateCommentRequest>,
) -> axum::response::Response {
    let id: PollId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };
    if registry.polls().get(&id).is_none() {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "poll not found");
    }
    if let Err(msg) = dto::validate_comment(&body.body) {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", msg);
    }

    let comment = CommentRecord::new(id, principal.id(), body.body.trim().to_string());
    match registry.comments().insert(comment.clone()) {
        Ok(()) => (StatusCode::CREATED, Json(json!({ "comment": comment }))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_comment(
    Extension(registry): Extension<Arc<ServiceRegistry>>,
    Path((poll_id, comment_id)): Path<(String, String)>,
) -> axum::response::Response {
    let poll_id: PollId = match poll_id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let comment_id: CommentId = match comment_id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    // A comment is only addressable through the poll it belongs to.
    match registry.comments().get(&comment_id) {
        Some(comment) if comment.poll_id == poll_id => {
            match registry.comments().delete(&comment_id) {
                Ok(()) => StatusCode::NO_CONTENT.into_response(),
                Err(e) => errors::domain_error_to_response(e),
            }
        }
        _ => errors::json_error(StatusCode::NOT_FOUND, "not_found", "comment not found"),
    }
}
