//! Builds access snapshots from the database.

use std::sync::Arc;

use tracing::debug;

use meridian_core::result::AppResult;
use meridian_database::repositories::{GroupRepository, PermissionRepository};
use meridian_entity::user::User;

use super::snapshot::AccessSnapshot;

/// Loads the group/permission graph for a user into an in-memory snapshot.
///
/// The snapshot holds raw rows; effectiveness, expiry, and condition
/// filtering happen at resolve time, so a snapshot stays valid across
/// requests until the underlying rows change.
#[derive(Debug, Clone)]
pub struct SnapshotLoader {
    group_repo: Arc<GroupRepository>,
    permission_repo: Arc<PermissionRepository>,
}

impl SnapshotLoader {
    /// Create a new snapshot loader.
    pub fn new(group_repo: Arc<GroupRepository>, permission_repo: Arc<PermissionRepository>) -> Self {
        Self {
            group_repo,
            permission_repo,
        }
    }

    /// Load everything needed to resolve decisions for a single user:
    /// their membership rows, the groups and permissions visible to
    /// their tenant, and the grants held by those groups.
    pub async fn load_for_user(&self, user: &User) -> AppResult<AccessSnapshot> {
        let mut snapshot = AccessSnapshot::new();

        let memberships = self.group_repo.find_memberships_for_user(user.id).await?;
        let groups = self.group_repo.find_all_for_tenant(user.company_id).await?;
        let permissions = self
            .permission_repo
            .find_all_for_tenant(user.company_id)
            .await?;

        let group_ids: Vec<_> = groups.iter().map(|g| g.id).collect();
        let grants = self.permission_repo.find_grants_for_groups(&group_ids).await?;

        debug!(
            user_id = %user.id,
            groups = groups.len(),
            permissions = permissions.len(),
            memberships = memberships.len(),
            grants = grants.len(),
            "Loaded access snapshot"
        );

        for group in groups {
            snapshot.add_group(group);
        }
        for permission in permissions {
            snapshot.add_permission(permission);
        }
        for membership in memberships {
            snapshot.add_membership(membership);
        }
        for grant in grants {
            snapshot.add_grant(grant);
        }

        Ok(snapshot)
    }
}
