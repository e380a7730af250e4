//! Session API handlers: registration, login, and token reset.
//!
//! # Purpose
//! The only routes that mint credentials. All three are public in the sense
//! that they bypass the permission check; they still pass through the rate
//! limiter.
//!
//! # Security considerations
//! - Login failures return one generic 401 regardless of whether the account
//!   exists, the password is wrong, or the account is disabled.
//! - Plaintext passwords are hashed before they reach the store and are never
//!   logged.
use crate::api::error::{
    ApiError, api_conflict, api_internal, api_internal_message, api_unauthorized,
    api_validation_error,
};
use crate::api::types::{LoginRequest, RegisterRequest, SessionResponse, TokenResponse};
use crate::app::AppState;
use crate::auth::middleware::bearer_token;
use crate::auth::password;
use crate::model::{PublicUser, Role};
use crate::store::{NewUser, StoreError};
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;

pub(crate) const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.trim().is_empty() {
        return Err(api_validation_error("username must not be empty"));
    }
    Ok(())
}

// Full RFC parsing is the mail system's problem; reject the obvious.
pub(crate) fn validate_email(email: &str) -> Result<(), ApiError> {
    if !email.contains('@') || email.trim().len() < 3 {
        return Err(api_validation_error("email is not valid"));
    }
    Ok(())
}

pub(crate) fn validate_password(pw: &str) -> Result<(), ApiError> {
    if pw.len() < MIN_PASSWORD_LEN {
        return Err(api_validation_error("password must be at least 6 characters"));
    }
    Ok(())
}

fn validate_credentials(username: &str, email: &str, pw: &str) -> Result<(), ApiError> {
    validate_username(username)?;
    validate_email(email)?;
    validate_password(pw)
}

#[utoipa::path(
    post,
    path = "/api/register",
    tag = "session",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = PublicUser),
        (status = 400, description = "Validation failed", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Username or email taken", body = crate::api::types::ErrorResponse)
    )
)]
/// Self-service registration. New accounts always get the `user` role;
/// anything higher goes through the admin user API.
pub(crate) async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    validate_credentials(&body.username, &body.email, &body.password)?;

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
            role: Role::User,
        })
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = user.id, "account registered");
            Ok(Json(user.public()))
        }
        Err(StoreError::Conflict(_)) => Err(api_conflict(
            "already_exists",
            "username or email already taken",
        )),
        Err(err) => Err(api_internal("failed to create account", &err)),
    }
}

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "session",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session established", body = SessionResponse),
        (status = 401, description = "Bad credentials", body = crate::api::types::ErrorResponse)
    )
)]
/// Exchange a password for a bearer token. Accepts username or email.
pub(crate) async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let lookup = if let Some(username) = body.username.as_deref() {
        state.store.get_user_by_username(username.trim()).await
    } else if let Some(email) = body.email.as_deref() {
        state.store.get_user_by_email(email.trim()).await
    } else {
        return Err(api_validation_error("username or email is required"));
    };

    let user = match lookup {
        Ok(user) => user,
        Err(StoreError::NotFound(_)) => return Err(api_unauthorized("bad credentials")),
        Err(err) => return Err(api_internal("failed to look up account", &err)),
    };

    let matches = password::verify(&body.password, &user.password_hash)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "password verification failed");
            api_internal_message("failed to process credentials")
        })?;
    if !matches || !user.is_active {
        metrics::counter!("forumauth_login_failed_total").increment(1);
        return Err(api_unauthorized("bad credentials"));
    }

    let token = state.tokens.issue(user.id).map_err(|err| {
        tracing::error!(error = ?err, "token issuance failed");
        api_internal_message("failed to issue credential")
    })?;
    tracing::info!(user_id = user.id, "session established");
    Ok(Json(SessionResponse {
        token,
        user: user.public(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/reset-token",
    tag = "session",
    responses(
        (status = 200, description = "Fresh token issued", body = TokenResponse),
        (status = 401, description = "Invalid or expired token", body = crate::api::types::ErrorResponse)
    ),
    security(("bearer" = []))
)]
/// Reissue a bearer token before it expires. The incoming token must still
/// verify, expiry included, so an expired session cannot resurrect itself.
pub(crate) async fn reset_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, ApiError> {
    let Some(token) = bearer_token(&headers) else {
        return Err(api_unauthorized("missing bearer credential"));
    };
    let claims = state
        .tokens
        .verify(token)
        .map_err(|_| api_unauthorized("invalid credential"))?;

    // The subject must still exist and be active; a banned account must not
    // be able to roll its session forward.
    let user = match state.store.get_user(claims.user_id).await {
        Ok(user) => user,
        Err(StoreError::NotFound(_)) => return Err(api_unauthorized("unknown subject")),
        Err(err) => return Err(api_internal("failed to resolve subject", &err)),
    };
    if !user.is_active {
        return Err(api_unauthorized("account disabled"));
    }

    let token = state.tokens.issue(user.id).map_err(|err| {
        tracing::error!(error = ?err, "token issuance failed");
        api_internal_message("failed to issue credential")
    })?;
    Ok(Json(TokenResponse { token }))
}
