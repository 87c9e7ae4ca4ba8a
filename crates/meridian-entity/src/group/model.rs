//! Group entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::GroupKind;

/// A named collection of principals, the unit of permission assignment.
///
/// Groups may nest through `parent_id`; a member of a child group belongs,
/// for permission purposes, to every ancestor. Cycles in the parent chain
/// are forbidden.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    /// Unique group identifier.
    pub id: Uuid,
    /// Tenant scope; `None` for platform-wide groups.
    pub company_id: Option<Uuid>,
    /// Parent group for hierarchical membership.
    pub parent_id: Option<Uuid>,
    /// Group name, unique within (tenant, kind).
    pub name: String,
    /// Group classification.
    pub kind: GroupKind,
    /// Whether the group currently contributes permissions.
    pub is_active: bool,
    /// When the group was created.
    pub created_at: DateTime<Utc>,
    /// When the group was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Group {
    /// Check whether the group contributes to permission resolution.
    pub fn is_effective(&self) -> bool {
        self.is_active && self.deleted_at.is_none()
    }
}
