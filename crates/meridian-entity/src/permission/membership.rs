//! User-to-group membership (the UserGroup join row).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Membership of a user in a group.
///
/// At most one row exists per (user, group). An inactive or expired row
/// contributes no permissions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupMembership {
    /// Unique membership identifier.
    pub id: Uuid,
    /// Member user.
    pub user_id: Uuid,
    /// Containing group.
    pub group_id: Uuid,
    /// Whether the membership is currently in force.
    pub is_active: bool,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// The admin who assigned the membership.
    pub assigned_by: Option<Uuid>,
    /// When the membership was created.
    pub created_at: DateTime<Utc>,
}

impl GroupMembership {
    /// Check whether the membership is in force at the given instant.
    pub fn is_effective_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.map(|exp| exp > now).unwrap_or(true)
    }
}
