use axum::{http::StatusCode, routing::get};

use super::{Endpoint, ResourceRoutes};

pub fn resource() -> ResourceRoutes {
    ResourceRoutes {
        name: "system",
        endpoints: vec![Endpoint::public("GET", "/health", get(health))],
    }
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}
