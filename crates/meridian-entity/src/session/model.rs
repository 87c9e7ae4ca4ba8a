//! Session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::SessionKind;
use super::status::SessionStatus;

/// One authenticated device/channel for a principal.
///
/// Sessions are created on login and become `Revoked` on logout or
/// administrative action, or `Expired` purely by time. Rows are retained
/// for audit, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Unique session identifier.
    pub id: Uuid,
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// Tenant scope, copied from the user at creation.
    pub company_id: Option<Uuid>,
    /// SHA-256 hash of the current access token; swapped on every refresh.
    /// The raw token is exposed only at issuance and never stored.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// SHA-256 hash of the current refresh token; swapped on every rotation.
    #[serde(skip_serializing)]
    pub refresh_token_hash: Option<String>,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Channel kind.
    pub kind: SessionKind,
    /// IP address from which the session was created.
    pub ip_address: Option<String>,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// Parsed device information (JSON).
    pub device_info: Option<serde_json::Value>,
    /// The principal or admin who revoked this session (if revoked).
    pub revoked_by: Option<Uuid>,
    /// Reason for revocation.
    pub revoked_reason: Option<String>,
    /// When the session was revoked.
    pub revoked_at: Option<DateTime<Utc>>,
    /// When the session was created (login time).
    pub created_at: DateTime<Utc>,
    /// Absolute expiry; `None` means no absolute timeout.
    pub expires_at: Option<DateTime<Utc>>,
    /// Last activity timestamp, touched on every authenticated request.
    pub last_activity_at: DateTime<Utc>,
}

impl Session {
    /// Check whether the session is live at the given instant.
    ///
    /// Live means status is Active and expiry is unset or in the future.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SessionStatus::Active
            && self.expires_at.map(|exp| exp > now).unwrap_or(true)
    }

    /// Check whether the session passed its expiry time.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }

    /// Check whether the session was explicitly revoked.
    pub fn is_revoked(&self) -> bool {
        self.status == SessionStatus::Revoked
    }

    /// How long the session has been idle, in seconds.
    pub fn idle_seconds_at(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_activity_at).num_seconds().max(0)
    }

    /// Produce the metadata-only view for self-service session listings.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            user_id: self.user_id,
            status: self.status,
            kind: self.kind,
            ip_address: self.ip_address.clone(),
            user_agent: self.user_agent.clone(),
            device_info: self.device_info.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at,
            last_activity_at: self.last_activity_at,
        }
    }
}

/// Session view for "active sessions" listings.
///
/// Carries device and network metadata only; the token reference hashes are
/// structurally absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Channel kind.
    pub kind: SessionKind,
    /// Origin IP address.
    pub ip_address: Option<String>,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// Parsed device information.
    pub device_info: Option<serde_json::Value>,
    /// Login time.
    pub created_at: DateTime<Utc>,
    /// Absolute expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Last activity timestamp.
    pub last_activity_at: DateTime<Utc>,
}

/// Device and network metadata supplied by the transport layer at login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceMeta {
    /// Client IP address.
    pub ip_address: Option<String>,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// Arbitrary parsed device details.
    pub device_info: Option<serde_json::Value>,
    /// Channel kind.
    pub kind: SessionKind,
}

impl DeviceMeta {
    /// Metadata for a web login with just an IP address.
    pub fn web(ip_address: impl Into<String>) -> Self {
        Self {
            ip_address: Some(ip_address.into()),
            user_agent: None,
            device_info: None,
            kind: SessionKind::Web,
        }
    }
}
