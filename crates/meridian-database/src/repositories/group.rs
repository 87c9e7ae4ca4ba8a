//! Group repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use meridian_core::error::{AppError, ErrorKind};
use meridian_core::result::AppResult;
use meridian_entity::group::Group;
use meridian_entity::permission::GroupMembership;

/// Repository for group and membership queries.
#[derive(Debug, Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    /// Create a new group repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a group by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Group>> {
        sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find group", e))
    }

    /// Load every non-deleted group visible to a tenant in one pass —
    /// the tenant's own groups plus platform-wide ones. Feeds the
    /// resolver's arena snapshot.
    pub async fn find_all_for_tenant(&self, company_id: Option<Uuid>) -> AppResult<Vec<Group>> {
        sqlx::query_as::<_, Group>(
            "SELECT * FROM groups \
             WHERE (company_id IS NOT DISTINCT FROM $1 OR company_id IS NULL) \
               AND deleted_at IS NULL",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load tenant groups", e))
    }

    /// Load all membership rows for a user, including inactive/expired ones;
    /// the resolver filters by effectiveness itself.
    pub async fn find_memberships_for_user(&self, user_id: Uuid) -> AppResult<Vec<GroupMembership>> {
        sqlx::query_as::<_, GroupMembership>("SELECT * FROM user_groups WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to load user memberships", e)
            })
    }

    /// Re-parent a group, rejecting moves that would close a cycle.
    ///
    /// `None` detaches the group to the hierarchy root.
    pub async fn set_parent(&self, group_id: Uuid, parent_id: Option<Uuid>) -> AppResult<()> {
        if let Some(parent) = parent_id {
            if self.would_create_cycle(group_id, parent).await? {
                return Err(AppError::validation(
                    "Group parent change would create a cycle",
                ));
            }
        }

        let result = sqlx::query(
            "UPDATE groups SET parent_id = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(group_id)
        .bind(parent_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update group parent", e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Group not found"));
        }
        Ok(())
    }

    /// Check whether setting `parent_id` on `group_id` would close a cycle.
    ///
    /// Walks the prospective parent's ancestor chain with a recursive CTE
    /// and looks for the group itself.
    pub async fn would_create_cycle(&self, group_id: Uuid, parent_id: Uuid) -> AppResult<bool> {
        let found: Option<Uuid> = sqlx::query_scalar(
            "WITH RECURSIVE chain AS ( \
                 SELECT id, parent_id FROM groups WHERE id = $2 \
                 UNION ALL \
                 SELECT g.id, g.parent_id FROM groups g JOIN chain c ON g.id = c.parent_id \
             ) \
             SELECT id FROM chain WHERE id = $1 LIMIT 1",
        )
        .bind(group_id)
        .bind(parent_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to check group ancestry", e)
        })?;
        Ok(found.is_some())
    }
}
