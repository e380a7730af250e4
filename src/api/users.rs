//! Administrative user API handlers.
//!
//! CRUD over accounts plus the ban/unban toggles. Every route here sits
//! behind the full middleware chain with a `user` resource permission, so the
//! handlers themselves do no role checks.
use crate::api::error::{
    ApiError, api_conflict, api_internal, api_internal_message, api_not_found,
    api_validation_error,
};
use crate::api::session::{validate_email, validate_password, validate_username};
use crate::api::types::{AckResponse, UserCreateRequest, UserListResponse, UserUpdateRequest};
use crate::app::AppState;
use crate::auth::password;
use crate::model::{PublicUser, Role};
use crate::store::{NewUser, StoreError, UserUpdate};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "List accounts", body = UserListResponse)
    ),
    security(("bearer" = []))
)]
pub(crate) async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<UserListResponse>, ApiError> {
    let items = state
        .store
        .list_users()
        .await
        .map_err(|err| api_internal("failed to list accounts", &err))?;
    Ok(Json(UserListResponse {
        items: items.iter().map(|user| user.public()).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Account", body = PublicUser),
        (status = 404, description = "Account not found", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub(crate) async fn get_user(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<PublicUser>, ApiError> {
    match state.store.get_user(id).await {
        Ok(user) => Ok(Json(user.public())),
        Err(StoreError::NotFound(_)) => Err(api_not_found("account not found")),
        Err(err) => Err(api_internal("failed to load account", &err)),
    }
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = UserCreateRequest,
    responses(
        (status = 201, description = "Account created", body = PublicUser),
        (status = 400, description = "Validation failed", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Username or email taken", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
/// Admin account creation. Unlike self-registration the caller chooses the
/// role; defaults to `user` when omitted.
pub(crate) async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<UserCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_username(&body.username)?;
    validate_email(&body.email)?;
    validate_password(&body.password)?;

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
            role: body.role.unwrap_or(Role::User),
        })
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = user.id, role = %user.role, "account created");
            Ok((StatusCode::CREATED, Json(user.public())))
        }
        Err(StoreError::Conflict(_)) => Err(api_conflict(
            "already_exists",
            "username or email already taken",
        )),
        Err(err) => Err(api_internal("failed to create account", &err)),
    }
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "Account identifier")),
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "Account updated", body = PublicUser),
        (status = 400, description = "Nothing to update", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Account not found", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Username or email taken", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub(crate) async fn update_user(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<UserUpdateRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    // Provided fields obey the same rules as registration; absent fields are
    // left untouched.
    if let Some(username) = body.username.as_deref() {
        validate_username(username)?;
    }
    if let Some(email) = body.email.as_deref() {
        validate_email(email)?;
    }
    let password_hash = match body.password.as_deref() {
        Some(pw) => {
            validate_password(pw)?;
            Some(password::hash(pw).await.map_err(|err| {
                tracing::error!(error = ?err, "password hashing failed");
                api_internal_message("failed to process credentials")
            })?)
        }
        None => None,
    };
    let update = UserUpdate {
        username: body.username.map(|u| u.trim().to_string()),
        email: body.email.map(|e| e.trim().to_string()),
        password_hash,
        role: body.role,
        is_active: None,
    };
    if update.is_empty() {
        return Err(api_validation_error("nothing to update"));
    }

    match state.store.update_user(id, update).await {
        Ok(user) => Ok(Json(user.public())),
        Err(StoreError::NotFound(_)) => Err(api_not_found("account not found")),
        Err(StoreError::Conflict(_)) => Err(api_conflict(
            "already_exists",
            "username or email already taken",
        )),
        Err(err) => Err(api_internal("failed to update account", &err)),
    }
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "Account identifier")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 404, description = "Account not found", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
/// Soft delete. The record is tombstoned; its username and email stay
/// reserved.
pub(crate) async fn delete_user(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    match state.store.delete_user(id).await {
        Ok(()) => {
            tracing::info!(user_id = id, "account deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(StoreError::NotFound(_)) => Err(api_not_found("account not found")),
        Err(err) => Err(api_internal("failed to delete account", &err)),
    }
}

async fn set_active(state: &AppState, id: i64, active: bool) -> Result<Json<AckResponse>, ApiError> {
    let update = UserUpdate {
        is_active: Some(active),
        ..UserUpdate::default()
    };
    match state.store.update_user(id, update).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, active, "account activity toggled");
            Ok(Json(AckResponse::ok()))
        }
        Err(StoreError::NotFound(_)) => Err(api_not_found("account not found")),
        Err(err) => Err(api_internal("failed to update account", &err)),
    }
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/ban",
    tag = "users",
    params(("id" = i64, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Account banned", body = AckResponse),
        (status = 404, description = "Account not found", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
/// Disable an account. Its outstanding tokens keep verifying but every
/// permission check fails until unban.
pub(crate) async fn ban_user(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<AckResponse>, ApiError> {
    set_active(&state, id, false).await
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/unban",
    tag = "users",
    params(("id" = i64, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Account unbanned", body = AckResponse),
        (status = 404, description = "Account not found", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub(crate) async fn unban_user(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<AckResponse>, ApiError> {
    set_active(&state, id, true).await
}
