//! Request admission and authorization middleware.
//!
//! # Purpose
//! Implements the per-request chain: rate limit, then bearer authentication,
//! then the route-specific permission check. Every stage is terminal on
//! failure; the handler only runs once all three have passed.
//!
//! # Key invariants
//! - A missing tuple and `allowed == false` are indistinguishable to clients
//!   (both 403).
//! - Storage faults map to 500 and fail closed; they never default-allow.
//! - No mutex is held across store I/O; the gate's lock covers arithmetic
//!   only.
use crate::api::error::{
    ApiError, api_forbidden, api_internal, api_rate_limited, api_unauthorized,
};
use crate::app::AppState;
use crate::store::StoreError;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;

/// Authenticated subject attached to request extensions by [`require_auth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject(pub i64);

/// The `(resource, action)` pair a protected route declares at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePermission {
    pub resource: &'static str,
    pub action: &'static str,
}

/// Stage 1: per-IP token-bucket admission. Rejected requests get a 429 and
/// never reach authentication.
pub async fn throttle(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = client_ip(&request, state.trust_proxy);
    if !state.gate.allow(&ip) {
        tracing::debug!(%ip, "request rejected by rate limiter");
        return Err(api_rate_limited("too many requests"));
    }
    Ok(next.run(request).await)
}

/// Stage 2: bearer extraction and verification. On success the subject ID is
/// placed into request extensions; the response never carries token
/// diagnostics.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(request.headers()) else {
        return Err(api_unauthorized("missing bearer credential"));
    };
    let claims = state.tokens.verify(token).map_err(|err| {
        metrics::counter!("forumauth_auth_failed_total").increment(1);
        tracing::debug!(error = %err, "credential verification failed");
        api_unauthorized("invalid credential")
    })?;
    request.extensions_mut().insert(Subject(claims.user_id));
    Ok(next.run(request).await)
}

/// Stage 3: the route's permission check. Resolves the subject's role and
/// consults the permission store for the declared `(resource, action)` pair.
pub async fn check_permission(
    State((state, perm)): State<(AppState, RoutePermission)>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(Subject(user_id)) = request.extensions().get::<Subject>().copied() else {
        return Err(api_unauthorized("missing subject"));
    };

    let user = match state.store.get_user(user_id).await {
        Ok(user) => user,
        // The subject vanished after the token was minted (deleted account).
        Err(StoreError::NotFound(_)) => return Err(api_unauthorized("unknown subject")),
        Err(err) => return Err(api_internal("failed to resolve subject role", &err)),
    };
    if !user.is_active {
        return Err(api_forbidden("account disabled"));
    }

    match state
        .store
        .get_permission(user.role, perm.resource, perm.action)
        .await
    {
        Ok(tuple) if tuple.allowed => Ok(next.run(request).await),
        Ok(_) | Err(StoreError::NotFound(_)) => {
            metrics::counter!("forumauth_authz_denied_total").increment(1);
            tracing::debug!(
                subject = user_id,
                role = %user.role,
                resource = perm.resource,
                action = perm.action,
                "permission denied"
            );
            Err(api_forbidden("permission denied"))
        }
        Err(err) => Err(api_internal("failed to load permission", &err)),
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Client IP for rate limiting: the leftmost `X-Forwarded-For` entry when
/// the deployment declares a trusted proxy, otherwise the connection peer
/// address. Without `trust_proxy` the header is attacker-controlled and
/// would let a client rotate identities past the limiter.
fn client_ip(request: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(value) = request.headers().get("x-forwarded-for") {
            if let Ok(raw) = value.to_str() {
                if let Some(first) = raw.split(',').next() {
                    let first = first.trim();
                    if !first.is_empty() {
                        return first.to_string();
                    }
                }
            }
        }
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
