//! Permission entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::PermissionKind;

/// A named capability over a (resource, action) pair.
///
/// Permissions may nest through `parent_id`: a grant on an ancestor node
/// covers its descendants unless a more specific grant overrides it. An
/// unset `action` means the permission covers every action on the resource.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    /// Unique permission identifier.
    pub id: Uuid,
    /// Tenant scope; `None` for platform-wide permissions.
    pub company_id: Option<Uuid>,
    /// Parent permission node.
    pub parent_id: Option<Uuid>,
    /// Stable capability name, e.g. `"sales.order.create"`.
    pub name: String,
    /// Target resource, e.g. `"order"`.
    pub resource: String,
    /// Target action, e.g. `"create"`. `None` covers all actions.
    pub action: Option<String>,
    /// Broad category.
    pub kind: PermissionKind,
    /// Contextual predicate (JSON object of string key/values) that must
    /// match the request context for the permission to apply.
    pub conditions: Option<serde_json::Value>,
    /// Whether the permission is currently grantable/applicable.
    pub is_active: bool,
    /// When the permission was created.
    pub created_at: DateTime<Utc>,
    /// When the permission was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Permission {
    /// Check whether the permission participates in resolution at all.
    pub fn is_effective(&self) -> bool {
        self.is_active && self.deleted_at.is_none()
    }

    /// Check whether this node covers the requested (resource, action).
    ///
    /// The resource must match exactly; an unset action on the permission
    /// matches any requested action.
    pub fn matches(&self, resource: &str, action: Option<&str>) -> bool {
        if self.resource != resource {
            return false;
        }
        match (&self.action, action) {
            (None, _) => true,
            (Some(own), Some(req)) => own == req,
            // The permission is action-specific but the request is not.
            (Some(_), None) => false,
        }
    }
}
