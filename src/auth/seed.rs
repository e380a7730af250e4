//! Permission seeding from the embedded default matrix.
//!
//! # Purpose
//! On boot, materialize every cell of the role x resource x action product
//! into the permission store so the hot-path lookup never has to distinguish
//! "absent by policy" from "absent by oversight".
//!
//! # Key invariants
//! - **Idempotent**: running the seeder N times equals running it once.
//! - **Additive only**: an existing tuple is never toggled or removed, so
//!   administrative edits survive restarts. The embedded matrix is the
//!   recovery baseline; the store is the operational truth.
//! - **Complete**: every route binding's `(resource, action)` pair is covered
//!   by the matrix; `guard` asserts this at startup.
use crate::model::Role;
use crate::store::{PermissionStore, StoreError, StoreResult};

const EVERYONE: &[Role] = &[Role::Root, Role::Admin, Role::Employee, Role::User];
const STAFF: &[Role] = &[Role::Root, Role::Admin, Role::Employee];
const ADMINS: &[Role] = &[Role::Root, Role::Admin];
const ROOT_ONLY: &[Role] = &[Role::Root];

type ActionGrants = (&'static str, &'static [Role]);

/// Default `(resource, action) -> allowed roles` matrix. Cells not listed for
/// a resource do not exist; the doubtful ones default to root only.
pub const DEFAULT_MATRIX: &[(&str, &[ActionGrants])] = &[
    (
        "user",
        &[
            ("create", ADMINS),
            ("view", STAFF),
            ("edit", ADMINS),
            ("delete", ADMINS),
            ("ban", ADMINS),
            ("unban", ADMINS),
        ],
    ),
    (
        "question",
        &[
            ("create", EVERYONE),
            ("view", EVERYONE),
            ("edit", STAFF),
            ("delete", ADMINS),
            ("approve", STAFF),
            ("change_status", STAFF),
        ],
    ),
    (
        "answer",
        &[
            ("create", EVERYONE),
            ("view", EVERYONE),
            ("edit", STAFF),
            ("delete", ADMINS),
            ("accept", EVERYONE),
            ("change_status", STAFF),
        ],
    ),
    (
        "comment",
        &[
            ("create", EVERYONE),
            ("view", EVERYONE),
            ("edit", ADMINS),
            ("delete", ADMINS),
        ],
    ),
    (
        "vote",
        &[
            ("create", EVERYONE),
            ("view", EVERYONE),
            ("edit", ADMINS),
            ("delete", ADMINS),
        ],
    ),
    (
        "tag",
        &[
            ("create", STAFF),
            ("view", EVERYONE),
            ("edit", ADMINS),
            ("delete", ADMINS),
        ],
    ),
    (
        "follow",
        &[
            ("create", EVERYONE),
            ("view", EVERYONE),
            ("edit", ADMINS),
            ("delete", EVERYONE),
        ],
    ),
    (
        "group",
        &[
            ("create", ADMINS),
            ("view", EVERYONE),
            ("edit", ADMINS),
            ("delete", ADMINS),
            ("join", EVERYONE),
            ("leave", EVERYONE),
        ],
    ),
    (
        "post",
        &[
            ("create", EVERYONE),
            ("view", EVERYONE),
            ("edit", ADMINS),
            ("delete", ADMINS),
            ("edit_status", STAFF),
        ],
    ),
    (
        "report",
        &[
            ("create", EVERYONE),
            ("view", STAFF),
            ("edit", ADMINS),
            ("delete", ADMINS),
            ("approve", STAFF),
            ("reject", STAFF),
            ("change_inter_status", STAFF),
        ],
    ),
    (
        "notification",
        &[
            ("create", ADMINS),
            ("view", EVERYONE),
            ("edit", ADMINS),
            ("delete", ADMINS),
        ],
    ),
    (
        "attachment",
        &[
            ("create", EVERYONE),
            ("view", EVERYONE),
            ("edit", ADMINS),
            ("delete", ADMINS),
        ],
    ),
    (
        "message",
        &[
            ("create", EVERYONE),
            ("view", EVERYONE),
            ("edit", ROOT_ONLY),
            ("delete", ADMINS),
        ],
    ),
    (
        "topic",
        &[
            ("create", STAFF),
            ("view", EVERYONE),
            ("edit", ADMINS),
            ("delete", ADMINS),
            ("follow", EVERYONE),
        ],
    ),
    (
        "reaction",
        &[
            ("create", EVERYONE),
            ("view", EVERYONE),
            ("edit", ADMINS),
            ("delete", ADMINS),
        ],
    ),
    (
        "pass",
        &[
            ("create", ADMINS),
            ("view", ADMINS),
            ("edit", ADMINS),
            ("delete", ROOT_ONLY),
        ],
    ),
    (
        "permission",
        &[
            ("create", ADMINS),
            ("view", ADMINS),
            ("edit", ADMINS),
            ("delete", ROOT_ONLY),
        ],
    ),
    ("activity", &[("view", STAFF), ("delete", ROOT_ONLY)]),
    ("analytic", &[("view", ADMINS)]),
    (
        "file",
        &[
            ("create", EVERYONE),
            ("view", EVERYONE),
            ("delete", ADMINS),
        ],
    ),
];

/// True when the matrix defines the `(resource, action)` cell for any role.
pub fn matrix_contains(resource: &str, action: &str) -> bool {
    DEFAULT_MATRIX
        .iter()
        .find(|(res, _)| *res == resource)
        .map(|(_, actions)| actions.iter().any(|(act, _)| *act == action))
        .unwrap_or(false)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Materialize the default matrix. Existing tuples are skipped, never
/// rewritten.
pub async fn seed_permissions(store: &dyn PermissionStore) -> StoreResult<SeedReport> {
    let mut report = SeedReport::default();
    for (resource, actions) in DEFAULT_MATRIX {
        for (action, allowed_roles) in *actions {
            for role in Role::ALL {
                match store.get_permission(role, resource, action).await {
                    Ok(_) => {
                        report.skipped += 1;
                        continue;
                    }
                    Err(StoreError::NotFound(_)) => {}
                    Err(err) => return Err(err),
                }
                let allowed = allowed_roles.contains(&role);
                store
                    .upsert_permission(role, resource, action, allowed)
                    .await?;
                report.inserted += 1;
            }
        }
    }
    metrics::counter!("forumauth_seed_inserted_total").increment(report.inserted as u64);
    tracing::info!(
        inserted = report.inserted,
        skipped = report.skipped,
        "permission matrix seeded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    fn matrix_cells() -> usize {
        DEFAULT_MATRIX
            .iter()
            .map(|(_, actions)| actions.len() * Role::ALL.len())
            .sum()
    }

    #[tokio::test]
    async fn seeder_materializes_every_cell() {
        let store = InMemoryStore::new();
        let report = seed_permissions(&store).await.expect("seed");
        assert_eq!(report.inserted, matrix_cells());
        assert_eq!(report.skipped, 0);
        assert_eq!(
            store.list_permissions().await.expect("list").len(),
            matrix_cells()
        );

        // Spot-check a few cells against the matrix.
        assert!(
            store
                .get_permission(Role::User, "question", "create")
                .await
                .expect("tuple")
                .allowed
        );
        assert!(
            !store
                .get_permission(Role::User, "user", "delete")
                .await
                .expect("tuple")
                .allowed
        );
        assert!(
            store
                .get_permission(Role::Root, "permission", "edit")
                .await
                .expect("tuple")
                .allowed
        );
        assert!(
            !store
                .get_permission(Role::Employee, "permission", "view")
                .await
                .expect("tuple")
                .allowed
        );
    }

    #[tokio::test]
    async fn seeder_is_idempotent() {
        let store = InMemoryStore::new();
        seed_permissions(&store).await.expect("first run");
        let before = store.list_permissions().await.expect("list");

        let report = seed_permissions(&store).await.expect("second run");
        assert_eq!(report.inserted, 0);
        assert_eq!(report.skipped, matrix_cells());

        let after = store.list_permissions().await.expect("list");
        assert_eq!(before.len(), after.len());
        for (lhs, rhs) in before.iter().zip(after.iter()) {
            assert_eq!(lhs.id, rhs.id);
            assert_eq!(lhs.allowed, rhs.allowed);
        }
    }

    #[tokio::test]
    async fn seeder_preserves_administrative_edits() {
        let store = InMemoryStore::new();
        // An admin grant that contradicts the default matrix.
        store
            .upsert_permission(Role::User, "question", "delete", true)
            .await
            .expect("pre-seed edit");

        seed_permissions(&store).await.expect("seed");
        assert!(
            store
                .get_permission(Role::User, "question", "delete")
                .await
                .expect("tuple")
                .allowed
        );
    }

    #[test]
    fn matrix_contains_known_cells() {
        assert!(matrix_contains("question", "create"));
        assert!(matrix_contains("permission", "edit"));
        assert!(matrix_contains("analytic", "view"));
        assert!(!matrix_contains("question", "ban"));
        assert!(!matrix_contains("starship", "launch"));
    }

    #[test]
    fn matrix_keys_are_lowercase_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for (resource, actions) in DEFAULT_MATRIX {
            assert_eq!(*resource, resource.to_lowercase());
            assert!(seen.insert(*resource), "duplicate resource {resource}");
            let mut seen_actions = std::collections::HashSet::new();
            for (action, _) in *actions {
                assert_eq!(*action, action.to_lowercase());
                assert!(
                    seen_actions.insert(*action),
                    "duplicate action {resource}:{action}"
                );
            }
        }
    }
}
