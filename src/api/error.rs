//! API error types and helpers.
//!
//! # Purpose
//! Centralizes HTTP error response construction so every endpoint and
//! middleware stage returns the same error shape.
//!
//! # Security considerations
//! - Internal errors log details server-side but return generic messages.
//! - Bodies never carry stack traces, SQL fragments, or token contents.
use crate::api::types::ErrorResponse;
use crate::store::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Structured API error returned by handlers and middleware.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn build(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
        },
    }
}

/// 400: client input failed validation or was malformed.
pub fn api_validation_error(message: &str) -> ApiError {
    build(StatusCode::BAD_REQUEST, "validation_error", message)
}

/// 401: authentication missing or failed.
pub fn api_unauthorized(message: &str) -> ApiError {
    build(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

/// 403: authenticated but the role lacks the permission.
pub fn api_forbidden(message: &str) -> ApiError {
    build(StatusCode::FORBIDDEN, "forbidden", message)
}

/// 404 with a caller-provided code (`not_found`, `not_enabled`).
pub fn api_not_found(message: &str) -> ApiError {
    build(StatusCode::NOT_FOUND, "not_found", message)
}

/// 404 used for disabled features, so their presence is not exposed.
pub fn api_not_enabled(message: &str) -> ApiError {
    build(StatusCode::NOT_FOUND, "not_enabled", message)
}

/// 409: uniqueness conflict.
pub fn api_conflict(code: &str, message: &str) -> ApiError {
    build(StatusCode::CONFLICT, code, message)
}

/// 429: rejected by the admission gate.
pub fn api_rate_limited(message: &str) -> ApiError {
    build(StatusCode::TOO_MANY_REQUESTS, "rate_limited", message)
}

/// 500 from a store error. Logs the fault server-side, returns a generic
/// message.
pub fn api_internal(message: &str, err: &StoreError) -> ApiError {
    tracing::error!(error = ?err, "storage error");
    build(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

/// 500 without a concrete store error to log.
pub fn api_internal_message(message: &str) -> ApiError {
    build(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}
