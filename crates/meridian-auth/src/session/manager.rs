//! Session lifecycle manager.
//!
//! Owns the per-session state machine: `Active → Expired` by time,
//! `Active → Revoked` by explicit action, `Active ↔ Suspended` by
//! administrative action. Expired and revoked sessions are terminal and
//! retained for audit; a new login always creates a new session.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use meridian_core::error::AppError;
use meridian_entity::session::{Session, SessionStatus, SessionSummary};

use super::store::SessionStore;

/// Manages the session state machine on top of the store.
#[derive(Debug, Clone)]
pub struct SessionManager {
    /// Session persistence.
    store: Arc<SessionStore>,
}

impl SessionManager {
    /// Creates a new session manager.
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Updates the session's last-activity timestamp.
    ///
    /// Called on every authenticated request; audit/idle support only, no
    /// business meaning.
    pub async fn touch(&self, session_id: Uuid) -> Result<(), AppError> {
        self.store.touch(session_id).await
    }

    /// The liveness gate: returns the session iff it is live right now.
    ///
    /// A session whose expiry has passed is lazily transitioned to
    /// `Expired` here — time drives the state, the row just catches up.
    pub async fn validate(&self, session_id: Uuid) -> Result<Session, AppError> {
        let session = self
            .store
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::session_not_found("Session not found"))?;

        let now = Utc::now();

        match session.status {
            SessionStatus::Revoked => {
                return Err(AppError::session_not_found("Session has been revoked"));
            }
            SessionStatus::Expired => {
                return Err(AppError::session_not_found("Session has expired"));
            }
            SessionStatus::Suspended => {
                return Err(AppError::session_not_found("Session is suspended"));
            }
            SessionStatus::Active => {}
        }

        if session.is_expired_at(now) {
            self.store.mark_expired(session_id).await?;
            return Err(AppError::session_not_found("Session has expired"));
        }

        Ok(session)
    }

    /// Whether the session is live, as a plain boolean.
    pub async fn is_live(&self, session_id: Uuid) -> Result<bool, AppError> {
        match self.store.find_by_id(session_id).await? {
            Some(session) => Ok(session.is_live_at(Utc::now())),
            None => Ok(false),
        }
    }

    /// Revokes a single session.
    pub async fn revoke(
        &self,
        session_id: Uuid,
        revoked_by: Option<Uuid>,
        reason: &str,
    ) -> Result<(), AppError> {
        let session = self
            .store
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::session_not_found("Session not found"))?;

        if session.status.is_terminal() {
            return Err(AppError::conflict("Session is already terminated"));
        }

        self.store.revoke(session_id, revoked_by, reason).await?;

        info!(
            session_id = %session_id,
            user_id = %session.user_id,
            reason = %reason,
            "Session revoked"
        );
        Ok(())
    }

    /// Revokes every non-terminal session for a user.
    ///
    /// Used on password change and explicit "log out everywhere".
    pub async fn revoke_all(
        &self,
        user_id: Uuid,
        revoked_by: Option<Uuid>,
        reason: &str,
    ) -> Result<u64, AppError> {
        let revoked = self
            .store
            .revoke_all_for_user(user_id, revoked_by, reason)
            .await?;

        info!(
            user_id = %user_id,
            revoked = revoked,
            reason = %reason,
            "Revoked all user sessions"
        );
        Ok(revoked)
    }

    /// Administratively suspends an active session.
    pub async fn suspend(&self, session_id: Uuid) -> Result<(), AppError> {
        if !self.store.set_suspended(session_id, true).await? {
            warn!(session_id = %session_id, "Suspend rejected: session not active");
            return Err(AppError::conflict(
                "Only an active session can be suspended",
            ));
        }
        info!(session_id = %session_id, "Session suspended");
        Ok(())
    }

    /// Returns a suspended session to the active state.
    pub async fn resume(&self, session_id: Uuid) -> Result<(), AppError> {
        if !self.store.set_suspended(session_id, false).await? {
            return Err(AppError::conflict(
                "Only a suspended session can be resumed",
            ));
        }
        info!(session_id = %session_id, "Session resumed");
        Ok(())
    }

    /// Lists live sessions for self-service "active sessions" views.
    ///
    /// Summaries carry device/network metadata only; token references are
    /// structurally absent from the view type.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<SessionSummary>, AppError> {
        let sessions = self.store.find_active_by_user(user_id).await?;
        Ok(sessions.iter().map(Session::summary).collect())
    }

    /// Lists every session for a user, terminal states included, for
    /// audit views. Same token-free summary type as [`Self::list`].
    pub async fn history(&self, user_id: Uuid) -> Result<Vec<SessionSummary>, AppError> {
        let sessions = self.store.find_all_by_user(user_id).await?;
        Ok(sessions.iter().map(Session::summary).collect())
    }
}
