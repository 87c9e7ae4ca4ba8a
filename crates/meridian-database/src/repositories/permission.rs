//! Permission and grant repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use meridian_core::error::{AppError, ErrorKind};
use meridian_core::result::AppResult;
use meridian_entity::permission::{Permission, PermissionGrant};

/// Repository for permission and grant queries.
#[derive(Debug, Clone)]
pub struct PermissionRepository {
    pool: PgPool,
}

impl PermissionRepository {
    /// Create a new permission repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a permission by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Permission>> {
        sqlx::query_as::<_, Permission>(
            "SELECT * FROM permissions WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find permission", e))
    }

    /// Load every non-deleted permission visible to a tenant in one pass.
    /// Feeds the resolver's arena snapshot.
    pub async fn find_all_for_tenant(&self, company_id: Option<Uuid>) -> AppResult<Vec<Permission>> {
        sqlx::query_as::<_, Permission>(
            "SELECT * FROM permissions \
             WHERE (company_id IS NOT DISTINCT FROM $1 OR company_id IS NULL) \
               AND deleted_at IS NULL",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load tenant permissions", e)
        })
    }

    /// Load all grant rows held by the given groups; the resolver filters
    /// by effectiveness and conditions itself.
    pub async fn find_grants_for_groups(&self, group_ids: &[Uuid]) -> AppResult<Vec<PermissionGrant>> {
        sqlx::query_as::<_, PermissionGrant>(
            "SELECT * FROM group_permissions WHERE group_id = ANY($1)",
        )
        .bind(group_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load group grants", e))
    }
}
