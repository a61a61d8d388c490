use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;

use crate::utils::response::{error, success};

pub mod events;

pub use events::{create_event, delete_event, get_event, list_events, update_event};

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "devevent-api",
    };

    success(payload, "Health check successful")
}

pub async fn route_not_found() -> Response {
    error("NOT_FOUND", "Route not found", None, StatusCode::NOT_FOUND)
}

pub async fn method_not_allowed() -> Response {
    error(
        "METHOD_NOT_ALLOWED",
        "Method not allowed",
        None,
        StatusCode::METHOD_NOT_ALLOWED,
    )
}
