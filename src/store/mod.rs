//! Persistent stores for subjects and permission tuples.
//!
//! Two backends implement the same traits: a durable Postgres store and an
//! in-memory store for development and tests. Handlers only see the traits.
use crate::model::{PermissionTuple, Role, User};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Fields for a new subject record. The password is already hashed by the
/// caller; stores never see plaintext.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Partial update for a subject. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
    }
}

/// CRUD over subjects with uniqueness on username and email. Deletes are
/// soft: a tombstone hides the record from every accessor here.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn get_user(&self, id: i64) -> StoreResult<User>;
    async fn get_user_by_username(&self, username: &str) -> StoreResult<User>;
    async fn get_user_by_email(&self, email: &str) -> StoreResult<User>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn update_user(&self, id: i64, update: UserUpdate) -> StoreResult<User>;
    async fn delete_user(&self, id: i64) -> StoreResult<()>;
    async fn any_user_with_role(&self, role: Role) -> StoreResult<bool>;
}

/// Durable `(role, resource, action) -> allowed` relation. `get_permission`
/// is the request hot path; both backends resolve it with a single point
/// lookup on the composite key.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn get_permission(
        &self,
        role: Role,
        resource: &str,
        action: &str,
    ) -> StoreResult<PermissionTuple>;
    async fn upsert_permission(
        &self,
        role: Role,
        resource: &str,
        action: &str,
        allowed: bool,
    ) -> StoreResult<PermissionTuple>;
    async fn list_permissions(&self) -> StoreResult<Vec<PermissionTuple>>;
    async fn delete_permission(&self, id: i64) -> StoreResult<()>;
}

/// Everything the HTTP layer needs from a backend.
#[async_trait]
pub trait AuthBackend: IdentityStore + PermissionStore {
    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
