//! Consistent JSON error responses.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use quorum_auth::AccessError;
use quorum_core::DomainError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Machine-readable gate rejections.
///
/// `token_expired` stays distinguishable from `unauthenticated` so clients
/// can offer a re-authenticate path; internal store faults surface as a
/// generic server error and are logged here, never echoed to the caller.
pub fn access_error_to_response(err: AccessError) -> axum::response::Response {
    match err {
        AccessError::Unauthenticated => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "authentication required")
        }
        AccessError::SessionExpired => json_error(
            StatusCode::UNAUTHORIZED,
            "token_expired",
            "session expired, please re-authenticate",
        ),
        AccessError::Forbidden(capability) => json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            format!("missing capability '{capability}'"),
        ),
        AccessError::Store(e) => {
            tracing::error!(error = %e, "principal store failure during authentication");
            server_error()
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
    }
}

/// Generic server fault. Details belong in the log at the failure site.
pub fn server_error() -> axum::response::Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "server_error",
        "internal server error",
    )
}
