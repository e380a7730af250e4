//! Request and response bodies for the HTTP API.
use crate::model::{PermissionTuple, PublicUser, Role};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Uniform error body. `code` is a stable machine-readable discriminator;
/// `error` is for humans.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login accepts either a username or an email plus the password.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Administrative user creation. Unlike self-registration the caller picks
/// the role.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UserCreateRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UserUpdateRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserListResponse {
    pub items: Vec<PublicUser>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PermissionUpsertRequest {
    pub role: Role,
    pub resource: String,
    pub action: String,
    pub allowed: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionListResponse {
    pub items: Vec<PermissionTuple>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    pub durable: bool,
}

/// Generic acknowledgement for operations without a richer body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AckResponse {
    pub status: String,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    pub fn accepted() -> Self {
        Self {
            status: "accepted".to_string(),
        }
    }
}

/// Bootstrap body for the one-time root account.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetupRootRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_accepts_either_identifier() {
        let by_name: LoginRequest =
            serde_json::from_str(r#"{"username":"alice","password":"pw"}"#).unwrap();
        assert_eq!(by_name.username.as_deref(), Some("alice"));
        assert!(by_name.email.is_none());

        let by_email: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.c","password":"pw"}"#).unwrap();
        assert!(by_email.username.is_none());
        assert_eq!(by_email.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn user_update_fields_default_to_none() {
        let update: UserUpdateRequest = serde_json::from_str("{}").unwrap();
        assert!(update.username.is_none());
        assert!(update.email.is_none());
        assert!(update.password.is_none());
        assert!(update.role.is_none());
    }

    #[test]
    fn permission_upsert_parses_role_labels() {
        let req: PermissionUpsertRequest = serde_json::from_str(
            r#"{"role":"employee","resource":"question","action":"approve","allowed":true}"#,
        )
        .unwrap();
        assert_eq!(req.role, Role::Employee);
        assert!(req.allowed);
    }
}
