//! Permission administration handlers.
//!
//! The mutation surface for the decision table. Routes here are themselves
//! protected by `permission` resource tuples, so only roles the table grants
//! can reshape the table. Edits are durable and survive reseeding.
use crate::api::error::{ApiError, api_internal, api_not_found, api_validation_error};
use crate::api::types::{PermissionListResponse, PermissionUpsertRequest};
use crate::app::AppState;
use crate::model::PermissionTuple;
use crate::store::StoreError;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "permissions",
    responses(
        (status = 200, description = "Full decision table", body = PermissionListResponse)
    ),
    security(("bearer" = []))
)]
pub(crate) async fn list_permissions(
    State(state): State<AppState>,
) -> Result<Json<PermissionListResponse>, ApiError> {
    let items = state
        .store
        .list_permissions()
        .await
        .map_err(|err| api_internal("failed to list permissions", &err))?;
    Ok(Json(PermissionListResponse { items }))
}

#[utoipa::path(
    put,
    path = "/api/permissions",
    tag = "permissions",
    request_body = PermissionUpsertRequest,
    responses(
        (status = 200, description = "Tuple created or updated", body = PermissionTuple),
        (status = 400, description = "Validation failed", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
/// Create or flip one `(role, resource, action)` tuple. Takes effect on the
/// next request; there is no cache to invalidate.
pub(crate) async fn upsert_permission(
    State(state): State<AppState>,
    Json(body): Json<PermissionUpsertRequest>,
) -> Result<Json<PermissionTuple>, ApiError> {
    let resource = body.resource.trim().to_lowercase();
    let action = body.action.trim().to_lowercase();
    if resource.is_empty() || action.is_empty() {
        return Err(api_validation_error("resource and action must not be empty"));
    }

    let tuple = state
        .store
        .upsert_permission(body.role, &resource, &action, body.allowed)
        .await
        .map_err(|err| api_internal("failed to store permission", &err))?;
    tracing::info!(
        role = %tuple.role,
        resource = %tuple.resource,
        action = %tuple.action,
        allowed = tuple.allowed,
        "permission tuple written"
    );
    Ok(Json(tuple))
}

#[utoipa::path(
    delete,
    path = "/api/permissions/{id}",
    tag = "permissions",
    params(("id" = i64, Path, description = "Tuple identifier")),
    responses(
        (status = 204, description = "Tuple removed"),
        (status = 404, description = "Tuple not found", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
/// Remove a tuple. The affected cell reverts to the implicit deny until the
/// seeder or an admin writes it again.
pub(crate) async fn delete_permission(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    match state.store.delete_permission(id).await {
        Ok(()) => {
            tracing::info!(permission_id = id, "permission tuple removed");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(StoreError::NotFound(_)) => Err(api_not_found("permission not found")),
        Err(err) => Err(api_internal("failed to delete permission", &err)),
    }
}
