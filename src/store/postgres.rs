//! Postgres-backed implementation of the identity and permission stores.
//!
//! # Key invariants
//! - `users` and `permissions` are authoritative tables; the permission key
//!   `(role, resource, action)` carries a unique constraint, which is also
//!   the index behind the hot-path `get_permission` lookup.
//! - Subject deletes are soft: a `deleted_at` tombstone hides the row from
//!   every read in this module. Permission deletes are hard.
//!
//! # Concurrency model
//! The store is shared across async handlers; `sqlx::PgPool` manages
//! connection concurrency. No application-level locking.
//!
//! # Operational notes
//! - Migrations run at startup via `sqlx::migrate!` so the schema is in place
//!   before the service accepts requests.
//! - Connection URLs may contain credentials; they are never logged.
//! - Pool timeouts are explicit: hanging forever on a DB fault is not
//!   acceptable on the request path.
use super::{
    AuthBackend, IdentityStore, NewUser, PermissionStore, StoreError, StoreResult, UserUpdate,
};
use crate::model::{PermissionTuple, Role, User};
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::time::Duration;

pub struct PostgresStore {
    pool: PgPool,
}

/// Row shape for the `users` table. Kept separate from the domain type so
/// schema details (string-encoded role) stay localized here.
#[derive(Debug, Clone, FromRow)]
struct DbUser {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl DbUser {
    fn into_user(self) -> StoreResult<User> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|err| StoreError::Unexpected(anyhow!("corrupt role column: {err}")))?;
        Ok(User {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            role,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

/// Row shape for the `permissions` table.
#[derive(Debug, Clone, FromRow)]
struct DbPermission {
    id: i64,
    role: String,
    resource: String,
    action: String,
    allowed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DbPermission {
    fn into_tuple(self) -> StoreResult<PermissionTuple> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|err| StoreError::Unexpected(anyhow!("corrupt role column: {err}")))?;
        Ok(PermissionTuple {
            id: self.id,
            role,
            resource: self.resource,
            action: self.action,
            allowed: self.allowed,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn map_conflict(err: sqlx::Error, message: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        // 23505: unique_violation
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::Conflict(message.to_string());
        }
    }
    StoreError::Unexpected(anyhow::Error::new(err))
}

impl PostgresStore {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .context("connect postgres pool")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("run migrations")?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl IdentityStore for PostgresStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, DbUser>(
            "INSERT INTO users (username, email, password_hash, role) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, username, email, password_hash, role, is_active, \
                       created_at, updated_at, deleted_at",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| map_conflict(err, "username or email already taken"))?;
        row.into_user()
    }

    async fn get_user(&self, id: i64) -> StoreResult<User> {
        let row = sqlx::query_as::<_, DbUser>(
            "SELECT id, username, email, password_hash, role, is_active, \
                    created_at, updated_at, deleted_at \
             FROM users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(anyhow::Error::new)?
        .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        row.into_user()
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<User> {
        let row = sqlx::query_as::<_, DbUser>(
            "SELECT id, username, email, password_hash, role, is_active, \
                    created_at, updated_at, deleted_at \
             FROM users WHERE username = $1 AND deleted_at IS NULL",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(anyhow::Error::new)?
        .ok_or_else(|| StoreError::NotFound(format!("user {username}")))?;
        row.into_user()
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        let row = sqlx::query_as::<_, DbUser>(
            "SELECT id, username, email, password_hash, role, is_active, \
                    created_at, updated_at, deleted_at \
             FROM users WHERE email = $1 AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(anyhow::Error::new)?
        .ok_or_else(|| StoreError::NotFound(format!("user {email}")))?;
        row.into_user()
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, DbUser>(
            "SELECT id, username, email, password_hash, role, is_active, \
                    created_at, updated_at, deleted_at \
             FROM users WHERE deleted_at IS NULL ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(anyhow::Error::new)?;
        rows.into_iter().map(DbUser::into_user).collect()
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> StoreResult<User> {
        let row = sqlx::query_as::<_, DbUser>(
            "UPDATE users SET \
                 username = COALESCE($2, username), \
                 email = COALESCE($3, email), \
                 password_hash = COALESCE($4, password_hash), \
                 role = COALESCE($5, role), \
                 is_active = COALESCE($6, is_active), \
                 updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING id, username, email, password_hash, role, is_active, \
                       created_at, updated_at, deleted_at",
        )
        .bind(id)
        .bind(update.username)
        .bind(update.email)
        .bind(update.password_hash)
        .bind(update.role.map(|role| role.as_str().to_string()))
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| map_conflict(err, "username or email already taken"))?
        .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        row.into_user()
    }

    async fn delete_user(&self, id: i64) -> StoreResult<()> {
        let result =
            sqlx::query("UPDATE users SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(anyhow::Error::new)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    async fn any_user_with_role(&self, role: Role) -> StoreResult<bool> {
        let exists: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM users WHERE role = $1 AND deleted_at IS NULL LIMIT 1",
        )
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(anyhow::Error::new)?;
        Ok(exists.is_some())
    }
}

#[async_trait]
impl PermissionStore for PostgresStore {
    async fn get_permission(
        &self,
        role: Role,
        resource: &str,
        action: &str,
    ) -> StoreResult<PermissionTuple> {
        let row = sqlx::query_as::<_, DbPermission>(
            "SELECT id, role, resource, action, allowed, created_at, updated_at \
             FROM permissions WHERE role = $1 AND resource = $2 AND action = $3",
        )
        .bind(role.as_str())
        .bind(resource)
        .bind(action)
        .fetch_optional(&self.pool)
        .await
        .map_err(anyhow::Error::new)?
        .ok_or_else(|| StoreError::NotFound(format!("permission {role}:{resource}:{action}")))?;
        row.into_tuple()
    }

    async fn upsert_permission(
        &self,
        role: Role,
        resource: &str,
        action: &str,
        allowed: bool,
    ) -> StoreResult<PermissionTuple> {
        let row = sqlx::query_as::<_, DbPermission>(
            "INSERT INTO permissions (role, resource, action, allowed) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (role, resource, action) \
             DO UPDATE SET allowed = EXCLUDED.allowed, updated_at = now() \
             RETURNING id, role, resource, action, allowed, created_at, updated_at",
        )
        .bind(role.as_str())
        .bind(resource)
        .bind(action)
        .bind(allowed)
        .fetch_one(&self.pool)
        .await
        .map_err(anyhow::Error::new)?;
        row.into_tuple()
    }

    async fn list_permissions(&self) -> StoreResult<Vec<PermissionTuple>> {
        let rows = sqlx::query_as::<_, DbPermission>(
            "SELECT id, role, resource, action, allowed, created_at, updated_at \
             FROM permissions ORDER BY resource, action, role",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(anyhow::Error::new)?;
        rows.into_iter().map(DbPermission::into_tuple).collect()
    }

    async fn delete_permission(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(anyhow::Error::new)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("permission {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthBackend for PostgresStore {
    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(anyhow::Error::new)?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
