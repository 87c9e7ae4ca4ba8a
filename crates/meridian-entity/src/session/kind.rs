//! Session channel kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The channel through which a session was established.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// Browser session against the admin console.
    #[default]
    Web,
    /// Mobile application session.
    Mobile,
    /// Machine-to-machine API session.
    Api,
    /// Point-of-sale terminal session.
    Pos,
    /// Administrative tooling session.
    Admin,
}

impl SessionKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Mobile => "mobile",
            Self::Api => "api",
            Self::Pos => "pos",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
