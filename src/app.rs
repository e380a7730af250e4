//! HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, composes the per-request middleware chain, and
//! defines the shared application state injected into handlers.
//!
//! # Key invariants
//! - Every protected route is registered through [`guard`], which takes the
//!   `(resource, action)` pair as arguments and asserts at startup that the
//!   default matrix covers it. There is no way to wire a protected route
//!   without a permission pair.
//! - `/health`, `/docs`, and the OpenAPI document sit outside the rate
//!   limiter so probes and tooling survive saturation.
use crate::api;
use crate::api::content::CONTENT_BINDINGS;
use crate::api::openapi::ApiDoc;
use crate::auth::middleware::{RoutePermission, check_permission, require_auth, throttle};
use crate::auth::rate_limit::RequestGate;
use crate::auth::seed::matrix_contains;
use crate::auth::token::TokenCodec;
use crate::store::AuthBackend;
use axum::Router;
use axum::routing::{MethodRouter, delete, get, post, put};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AuthBackend>,
    pub tokens: TokenCodec,
    pub gate: Arc<dyn RequestGate>,
    pub allow_admin: bool,
    /// Rate-limit on `X-Forwarded-For` instead of the peer address. Only set
    /// behind a proxy that overwrites the header.
    pub trust_proxy: bool,
}

/// Wrap a method router in the permission check for `(resource, action)`.
///
/// Panics during router construction when the pair is not in the default
/// matrix; a typo here must fail the boot, not silently deny (or worse,
/// allow) at request time.
fn guard(
    route: MethodRouter<AppState>,
    state: &AppState,
    resource: &'static str,
    action: &'static str,
) -> MethodRouter<AppState> {
    assert!(
        matrix_contains(resource, action),
        "route declares unknown permission pair {resource}:{action}"
    );
    route.layer(axum::middleware::from_fn_with_state(
        (state.clone(), RoutePermission { resource, action }),
        check_permission,
    ))
}

fn content_routes(state: &AppState) -> Router<AppState> {
    let mut router = Router::new();
    for binding in CONTENT_BINDINGS {
        let route = match binding.method {
            "GET" => get(api::content::accepted),
            "POST" => post(api::content::accepted),
            "PUT" => put(api::content::accepted),
            "DELETE" => delete(api::content::accepted),
            other => panic!("unsupported method {other} for {}", binding.path),
        };
        router = router.route(
            binding.path,
            guard(route, state, binding.resource, binding.action),
        );
    }
    router
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            )
        });

    // Session and bootstrap routes skip authentication but not the limiter.
    let public = Router::new()
        .route("/api/register", post(api::session::register))
        .route("/api/login", post(api::session::login))
        .route("/api/reset-token", post(api::session::reset_token))
        .route("/internal/setup/root", post(api::setup::setup_root));

    let protected = Router::new()
        .route(
            "/api/users",
            guard(get(api::users::list_users), &state, "user", "view")
                .merge(guard(post(api::users::create_user), &state, "user", "create")),
        )
        .route(
            "/api/users/:id",
            guard(get(api::users::get_user), &state, "user", "view")
                .merge(guard(put(api::users::update_user), &state, "user", "edit"))
                .merge(guard(delete(api::users::delete_user), &state, "user", "delete")),
        )
        .route(
            "/api/users/:id/ban",
            guard(post(api::users::ban_user), &state, "user", "ban"),
        )
        .route(
            "/api/users/:id/unban",
            guard(post(api::users::unban_user), &state, "user", "unban"),
        )
        .route(
            "/api/permissions",
            guard(
                get(api::permissions::list_permissions),
                &state,
                "permission",
                "view",
            )
            .merge(guard(
                put(api::permissions::upsert_permission),
                &state,
                "permission",
                "edit",
            )),
        )
        .route(
            "/api/permissions/:id",
            guard(
                delete(api::permissions::delete_permission),
                &state,
                "permission",
                "delete",
            ),
        )
        .merge(content_routes(&state))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let rate_limited = public.merge(protected).layer(
        axum::middleware::from_fn_with_state(state.clone(), throttle),
    );

    Router::new()
        .route("/health", get(api::system::health))
        .merge(rate_limited)
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs")
                .url("/api/openapi.json", ApiDoc::openapi()),
        )
        .layer(trace_layer)
        .with_state(state)
}
