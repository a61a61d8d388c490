use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub message: String,
    pub error: ApiErrorBody,
}

pub fn success<T>(data: T, message: impl Into<String>) -> Response
where
    T: Serialize,
{
    with_status(StatusCode::OK, data, message)
}

pub fn created<T>(data: T, message: impl Into<String>) -> Response
where
    T: Serialize,
{
    with_status(StatusCode::CREATED, data, message)
}

pub fn empty_success(message: impl Into<String>) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: true,
        message: message.into(),
        data: None,
    };
    (StatusCode::OK, Json(body)).into_response()
}

fn with_status<T>(status: StatusCode, data: T, message: impl Into<String>) -> Response
where
    T: Serialize,
{
    let body = ApiResponse {
        success: true,
        message: message.into(),
        data: Some(data),
    };
    (status, Json(body)).into_response()
}

pub fn error(
    code: &str,
    message: impl Into<String>,
    details: Option<String>,
    status: StatusCode,
) -> Response {
    let body = ApiErrorResponse {
        success: false,
        message: message.into(),
        error: ApiErrorBody {
            code: code.to_string(),
            details,
        },
    };

    (status, Json(body)).into_response()
}
