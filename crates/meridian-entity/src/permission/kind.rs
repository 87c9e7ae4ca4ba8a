//! Permission kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad category of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "permission_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PermissionKind {
    /// Read a resource.
    Read,
    /// Create or modify a resource.
    Write,
    /// Delete a resource.
    Delete,
    /// Run an operation (reports, jobs, POS actions).
    Execute,
    /// Administer a resource family.
    Admin,
    /// Tenant-defined capability.
    Custom,
}

impl PermissionKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::Execute => "execute",
            Self::Admin => "admin",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
