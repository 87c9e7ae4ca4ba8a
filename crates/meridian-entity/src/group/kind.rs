//! Group kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a group.
///
/// Group names are unique within a (tenant, kind) scope, so a department
/// and a custom group may share a name without colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "group_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    /// Built-in group seeded by the platform.
    System,
    /// Tenant-defined ad-hoc group.
    Custom,
    /// Group mirroring a coarse role.
    Role,
    /// Organizational department.
    Department,
    /// Team within a department.
    Team,
}

impl GroupKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Custom => "custom",
            Self::Role => "role",
            Self::Department => "department",
            Self::Team => "team",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
