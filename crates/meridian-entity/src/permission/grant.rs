//! Group-to-permission grant (the GroupPermission join row).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Effect of a grant row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "grant_effect", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GrantEffect {
    /// The group is permitted the capability.
    Allow,
    /// The group is forbidden the capability; deny beats allow.
    Deny,
    /// Placeholder meaning "defer to the ancestor group's grant"; the row
    /// itself contributes nothing to resolution.
    Inherit,
}

impl GrantEffect {
    /// Return the effect as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::Inherit => "inherit",
        }
    }
}

impl fmt::Display for GrantEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Grant of a [`Permission`](super::Permission) to a group.
///
/// At most one active row exists per (group, permission) pair, enforced by
/// a partial unique index.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PermissionGrant {
    /// Unique grant identifier.
    pub id: Uuid,
    /// Granted-to group.
    pub group_id: Uuid,
    /// Granted permission.
    pub permission_id: Uuid,
    /// Allow / deny / inherit.
    pub effect: GrantEffect,
    /// Whether the grant is currently in force.
    pub is_active: bool,
    /// Optional expiry; an expired grant contributes nothing.
    pub expires_at: Option<DateTime<Utc>>,
    /// Contextual predicate (JSON object of string key/values) that must
    /// match the request context for the grant to apply.
    pub conditions: Option<serde_json::Value>,
    /// The admin who created the grant.
    pub granted_by: Option<Uuid>,
    /// When the grant was created.
    pub created_at: DateTime<Utc>,
}

impl PermissionGrant {
    /// Check whether the grant is in force at the given instant.
    pub fn is_effective_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.map(|exp| exp > now).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn grant(is_active: bool, expires_at: Option<DateTime<Utc>>) -> PermissionGrant {
        PermissionGrant {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            permission_id: Uuid::new_v4(),
            effect: GrantEffect::Allow,
            is_active,
            expires_at,
            conditions: None,
            granted_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_expired_grant_is_not_effective() {
        let now = Utc::now();
        assert!(!grant(true, Some(now - Duration::seconds(1))).is_effective_at(now));
        assert!(grant(true, Some(now + Duration::hours(1))).is_effective_at(now));
        assert!(grant(true, None).is_effective_at(now));
    }

    #[test]
    fn test_inactive_grant_is_not_effective() {
        assert!(!grant(false, None).is_effective_at(Utc::now()));
    }
}
