//! Health endpoint.
//!
//! Kept outside both the rate limiter and the auth chain so probes keep
//! working while the service is saturated or the token secret is rotated.
use crate::api::error::{ApiError, api_internal};
use crate::api::types::HealthResponse;
use crate::app::AppState;
use axum::Json;
use axum::extract::State;

#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 500, description = "Backing store unavailable", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn health(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, ApiError> {
    if let Err(err) = state.store.health_check().await {
        return Err(api_internal("storage unavailable", &err));
    }
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        backend: state.store.backend_name().to_string(),
        durable: state.store.is_durable(),
    }))
}
