//! Session status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a session.
///
/// Transitions: `Active → Expired` (time-driven), `Active → Revoked`
/// (explicit), `Active ↔ Suspended` (administrative). `Expired` and
/// `Revoked` are terminal for the session id; a new login creates a new
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Session is live (subject to its expiry time).
    Active,
    /// Session passed its expiry time. Terminal.
    Expired,
    /// Session was explicitly revoked. Terminal.
    Revoked,
    /// Session is administratively suspended; may return to Active.
    Suspended,
}

impl SessionStatus {
    /// Check whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Expired | Self::Revoked)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
            Self::Suspended => "suspended",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
