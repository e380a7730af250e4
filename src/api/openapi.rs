//! OpenAPI schema aggregation.
//!
//! Collects routes and schema types into a single document served at
//! `/api/openapi.json` and rendered by Swagger UI at `/docs`.
use crate::api::{
    permissions, session, setup, system,
    types::{
        AckResponse, ErrorResponse, HealthResponse, LoginRequest, PermissionListResponse,
        PermissionUpsertRequest, RegisterRequest, SessionResponse, SetupRootRequest,
        TokenResponse, UserCreateRequest, UserListResponse, UserUpdateRequest,
    },
    users,
};
use crate::model::{PermissionTuple, PublicUser, Role};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "forumauth",
        version = "v1",
        description = "Forum identity, session, and authorization API"
    ),
    paths(
        system::health,
        session::register,
        session::login,
        session::reset_token,
        setup::setup_root,
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        users::ban_user,
        users::unban_user,
        permissions::list_permissions,
        permissions::upsert_permission,
        permissions::delete_permission
    ),
    components(schemas(
        ErrorResponse,
        HealthResponse,
        AckResponse,
        Role,
        PublicUser,
        PermissionTuple,
        RegisterRequest,
        LoginRequest,
        SessionResponse,
        TokenResponse,
        SetupRootRequest,
        UserCreateRequest,
        UserUpdateRequest,
        UserListResponse,
        PermissionUpsertRequest,
        PermissionListResponse
    )),
    tags(
        (name = "system", description = "Health and service metadata"),
        (name = "session", description = "Registration, login, and token reset"),
        (name = "setup", description = "One-time root bootstrap"),
        (name = "users", description = "Account administration"),
        (name = "permissions", description = "Authorization decision table")
    )
)]
pub struct ApiDoc;
