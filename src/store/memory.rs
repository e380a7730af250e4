//! In-memory implementation of the identity and permission stores.
//!
//! # Purpose
//! Implements the store traits entirely in memory using `HashMap`s guarded by
//! `tokio::sync::RwLock`. It exists for:
//! - local development and tests (no external dependencies)
//! - deployments where durability is not required
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Single-process consistency**: write locks for mutations, read locks
//!   for reads.
//!
//! Uniqueness checks scan the user map; acceptable for dev/test workloads.
//! Soft-deleted users keep their username and email reserved, matching the
//! unique constraints of the Postgres schema.
use super::{
    AuthBackend, IdentityStore, NewUser, PermissionStore, StoreError, StoreResult, UserUpdate,
};
use crate::model::{PermissionTuple, Role, User};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct UserTable {
    next_id: i64,
    rows: HashMap<i64, User>,
}

#[derive(Default)]
struct PermissionTable {
    next_id: i64,
    rows: HashMap<(Role, String, String), PermissionTuple>,
}

pub struct InMemoryStore {
    users: Arc<RwLock<UserTable>>,
    permissions: Arc<RwLock<PermissionTable>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(UserTable::default())),
            permissions: Arc::new(RwLock::new(PermissionTable::default())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn visible(user: &User) -> bool {
    user.deleted_at.is_none()
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut table = self.users.write().await;
        // Uniqueness spans tombstoned rows too, as in the SQL schema.
        if table.rows.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!(
                "username taken: {}",
                user.username
            )));
        }
        if table.rows.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email taken: {}", user.email)));
        }
        table.next_id += 1;
        let now = Utc::now();
        let record = User {
            id: table.next_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        table.rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_user(&self, id: i64) -> StoreResult<User> {
        let table = self.users.read().await;
        table
            .rows
            .get(&id)
            .filter(|u| visible(u))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<User> {
        let table = self.users.read().await;
        table
            .rows
            .values()
            .find(|u| visible(u) && u.username == username)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {username}")))
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        let table = self.users.read().await;
        table
            .rows
            .values()
            .find(|u| visible(u) && u.email == email)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {email}")))
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let table = self.users.read().await;
        let mut items: Vec<User> = table.rows.values().filter(|u| visible(u)).cloned().collect();
        items.sort_by_key(|u| u.id);
        Ok(items)
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> StoreResult<User> {
        let mut table = self.users.write().await;
        if let Some(username) = &update.username {
            if table
                .rows
                .values()
                .any(|u| u.id != id && &u.username == username)
            {
                return Err(StoreError::Conflict(format!("username taken: {username}")));
            }
        }
        if let Some(email) = &update.email {
            if table.rows.values().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::Conflict(format!("email taken: {email}")));
            }
        }
        let user = table
            .rows
            .get_mut(&id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(password_hash) = update.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(is_active) = update.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i64) -> StoreResult<()> {
        let mut table = self.users.write().await;
        let user = table
            .rows
            .get_mut(&id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        user.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn any_user_with_role(&self, role: Role) -> StoreResult<bool> {
        let table = self.users.read().await;
        Ok(table.rows.values().any(|u| visible(u) && u.role == role))
    }
}

#[async_trait]
impl PermissionStore for InMemoryStore {
    async fn get_permission(
        &self,
        role: Role,
        resource: &str,
        action: &str,
    ) -> StoreResult<PermissionTuple> {
        let table = self.permissions.read().await;
        table
            .rows
            .get(&(role, resource.to_string(), action.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("permission {role}:{resource}:{action}")))
    }

    async fn upsert_permission(
        &self,
        role: Role,
        resource: &str,
        action: &str,
        allowed: bool,
    ) -> StoreResult<PermissionTuple> {
        let mut table = self.permissions.write().await;
        let key = (role, resource.to_string(), action.to_string());
        let now = Utc::now();
        if let Some(existing) = table.rows.get_mut(&key) {
            existing.allowed = allowed;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        table.next_id += 1;
        let tuple = PermissionTuple {
            id: table.next_id,
            role,
            resource: resource.to_string(),
            action: action.to_string(),
            allowed,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(key, tuple.clone());
        Ok(tuple)
    }

    async fn list_permissions(&self) -> StoreResult<Vec<PermissionTuple>> {
        let table = self.permissions.read().await;
        let mut items: Vec<PermissionTuple> = table.rows.values().cloned().collect();
        items.sort_by_key(|p| p.id);
        Ok(items)
    }

    async fn delete_permission(&self, id: i64) -> StoreResult<()> {
        let mut table = self.permissions.write().await;
        let key = table
            .rows
            .iter()
            .find(|(_, tuple)| tuple.id == id)
            .map(|(key, _)| key.clone());
        match key {
            Some(key) => {
                table.rows.remove(&key);
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("permission {id}"))),
        }
    }
}

#[async_trait]
impl AuthBackend for InMemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn create_and_get_user() {
        let store = InMemoryStore::new();
        let created = store
            .create_user(new_user("alice", "alice@example.com"))
            .await
            .expect("create");
        assert_eq!(created.role, Role::User);
        assert!(created.is_active);

        let by_id = store.get_user(created.id).await.expect("by id");
        assert_eq!(by_id.username, "alice");
        let by_name = store.get_user_by_username("alice").await.expect("by name");
        assert_eq!(by_name.id, created.id);
        let by_email = store
            .get_user_by_email("alice@example.com")
            .await
            .expect("by email");
        assert_eq!(by_email.id, created.id);
    }

    #[tokio::test]
    async fn create_user_enforces_uniqueness() {
        let store = InMemoryStore::new();
        store
            .create_user(new_user("alice", "alice@example.com"))
            .await
            .expect("create");

        let err = store
            .create_user(new_user("alice", "other@example.com"))
            .await
            .err()
            .expect("username conflict");
        assert!(matches!(err, StoreError::Conflict(_)));

        let err = store
            .create_user(new_user("bob", "alice@example.com"))
            .await
            .err()
            .expect("email conflict");
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_user_applies_partial_fields() {
        let store = InMemoryStore::new();
        let created = store
            .create_user(new_user("alice", "alice@example.com"))
            .await
            .expect("create");

        let updated = store
            .update_user(
                created.id,
                UserUpdate {
                    role: Some(Role::Admin),
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .expect("update");
        assert_eq!(updated.role, Role::Admin);
        assert!(!updated.is_active);
        assert_eq!(updated.username, "alice");
    }

    #[tokio::test]
    async fn update_user_rejects_taken_username() {
        let store = InMemoryStore::new();
        store
            .create_user(new_user("alice", "alice@example.com"))
            .await
            .expect("create");
        let bob = store
            .create_user(new_user("bob", "bob@example.com"))
            .await
            .expect("create");

        let err = store
            .update_user(
                bob.id,
                UserUpdate {
                    username: Some("alice".to_string()),
                    ..Default::default()
                },
            )
            .await
            .err()
            .expect("conflict");
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn soft_delete_hides_user_everywhere() {
        let store = InMemoryStore::new();
        let created = store
            .create_user(new_user("alice", "alice@example.com"))
            .await
            .expect("create");

        store.delete_user(created.id).await.expect("delete");
        assert!(matches!(
            store.get_user(created.id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.get_user_by_username("alice").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(store.list_users().await.expect("list").is_empty());
        assert!(matches!(
            store.delete_user(created.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn permission_upsert_is_idempotent_on_key() {
        let store = InMemoryStore::new();
        let first = store
            .upsert_permission(Role::User, "question", "create", true)
            .await
            .expect("insert");
        let second = store
            .upsert_permission(Role::User, "question", "create", false)
            .await
            .expect("update");
        assert_eq!(first.id, second.id);
        assert!(!second.allowed);

        let fetched = store
            .get_permission(Role::User, "question", "create")
            .await
            .expect("get");
        assert!(!fetched.allowed);
        assert_eq!(store.list_permissions().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn missing_permission_is_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.get_permission(Role::User, "question", "delete").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_permission_removes_tuple() {
        let store = InMemoryStore::new();
        let tuple = store
            .upsert_permission(Role::Admin, "question", "delete", true)
            .await
            .expect("insert");
        store.delete_permission(tuple.id).await.expect("delete");
        assert!(matches!(
            store.get_permission(Role::Admin, "question", "delete").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_permission(tuple.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn any_user_with_role_scans_visible_rows() {
        let store = InMemoryStore::new();
        assert!(!store.any_user_with_role(Role::Root).await.expect("scan"));
        let created = store
            .create_user(NewUser {
                username: "root".to_string(),
                email: "root@example.com".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Root,
            })
            .await
            .expect("create");
        assert!(store.any_user_with_role(Role::Root).await.expect("scan"));
        store.delete_user(created.id).await.expect("delete");
        assert!(!store.any_user_with_role(Role::Root).await.expect("scan"));
    }
}
