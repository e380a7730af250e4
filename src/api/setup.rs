//! One-time root bootstrap endpoint.
//!
//! Disabled deployments answer 404 so the route's existence is not
//! advertised. When enabled via `ALLOW_ADMIN`, the first call creates the
//! root account; every later call conflicts.
use crate::api::error::{
    ApiError, api_conflict, api_internal, api_internal_message, api_not_enabled,
};
use crate::api::session::{validate_email, validate_password, validate_username};
use crate::api::types::SetupRootRequest;
use crate::app::AppState;
use crate::auth::password;
use crate::model::{PublicUser, Role};
use crate::store::{NewUser, StoreError};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[utoipa::path(
    post,
    path = "/internal/setup/root",
    tag = "setup",
    request_body = SetupRootRequest,
    responses(
        (status = 201, description = "Root account created", body = PublicUser),
        (status = 404, description = "Bootstrap disabled", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Root already exists", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn setup_root(
    State(state): State<AppState>,
    Json(body): Json<SetupRootRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.allow_admin {
        return Err(api_not_enabled("not found"));
    }

    validate_username(&body.username)?;
    validate_email(&body.email)?;
    validate_password(&body.password)?;

    let has_root = state
        .store
        .any_user_with_role(Role::Root)
        .await
        .map_err(|err| api_internal("failed to check for root account", &err))?;
    if has_root {
        return Err(api_conflict("already_exists", "root account already exists"));
    }

    let password_hash = password::hash(&body.password).await.map_err(|err| {
        tracing::error!(error = ?err, "password hashing failed");
        api_internal_message("failed to process credentials")
    })?;

    match state
        .store
        .create_user(NewUser {
            username: body.username.trim().to_string(),
            email: body.email.trim().to_string(),
            password_hash,
            role: Role::Root,
        })
        .await
    {
        Ok(user) => {
            tracing::warn!(user_id = user.id, "root account bootstrapped");
            Ok((StatusCode::CREATED, Json(user.public())))
        }
        Err(StoreError::Conflict(_)) => Err(api_conflict(
            "already_exists",
            "username or email already taken",
        )),
        Err(err) => Err(api_internal("failed to create root account", &err)),
    }
}
