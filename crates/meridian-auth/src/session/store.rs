//! Session storage operations wrapping the database repository.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use meridian_core::config::session::SessionConfig;
use meridian_core::error::AppError;
use meridian_database::repositories::session::SessionRepository;
use meridian_entity::session::{DeviceMeta, Session, SessionStatus};
use meridian_entity::user::User;

/// Computes the SHA-256 hex digest of a token string.
///
/// Only this digest is stored server-side; the raw token leaves the
/// process exactly once, at issuance.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Abstracts session persistence operations.
#[derive(Debug, Clone)]
pub struct SessionStore {
    /// Session database repository.
    repo: Arc<SessionRepository>,
    /// Session configuration.
    config: SessionConfig,
}

impl SessionStore {
    /// Creates a new session store.
    pub fn new(repo: Arc<SessionRepository>, config: SessionConfig) -> Self {
        Self { repo, config }
    }

    /// Creates a new session record for an authenticated user.
    ///
    /// The session id is fixed before token issuance so the JWT `sid`
    /// claim and the row agree; the token hashes are supplied by the
    /// caller after minting.
    pub async fn create_session(
        &self,
        user: &User,
        meta: &DeviceMeta,
        token_hash: &str,
        refresh_token_hash: &str,
        session_id: Uuid,
    ) -> Result<Session, AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.config.absolute_timeout_hours as i64);

        let session = Session {
            id: session_id,
            user_id: user.id,
            company_id: user.company_id,
            token_hash: token_hash.to_string(),
            refresh_token_hash: Some(refresh_token_hash.to_string()),
            status: SessionStatus::Active,
            kind: meta.kind,
            ip_address: meta.ip_address.clone(),
            user_agent: meta.user_agent.clone(),
            device_info: meta.device_info.clone(),
            revoked_by: None,
            revoked_reason: None,
            revoked_at: None,
            created_at: now,
            expires_at: Some(expires_at),
            last_activity_at: now,
        };

        self.repo.create(&session).await?;

        Ok(session)
    }

    /// Finds a session by ID.
    pub async fn find_by_id(&self, session_id: Uuid) -> Result<Option<Session>, AppError> {
        self.repo.find_by_id(session_id).await
    }

    /// Finds all live sessions for a user.
    pub async fn find_active_by_user(&self, user_id: Uuid) -> Result<Vec<Session>, AppError> {
        self.repo.find_active_by_user(user_id).await
    }

    /// Finds every session for a user, live or not.
    pub async fn find_all_by_user(&self, user_id: Uuid) -> Result<Vec<Session>, AppError> {
        self.repo.find_all_by_user(user_id).await
    }

    /// Updates the session's last-activity timestamp.
    pub async fn touch(&self, session_id: Uuid) -> Result<(), AppError> {
        self.repo.touch(session_id, Utc::now()).await
    }

    /// Marks a session revoked.
    pub async fn revoke(
        &self,
        session_id: Uuid,
        revoked_by: Option<Uuid>,
        reason: &str,
    ) -> Result<(), AppError> {
        self.repo.revoke(session_id, revoked_by, reason).await
    }

    /// Revokes every non-terminal session for a user. Returns the count.
    pub async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        revoked_by: Option<Uuid>,
        reason: &str,
    ) -> Result<u64, AppError> {
        self.repo.revoke_all_for_user(user_id, revoked_by, reason).await
    }

    /// Suspends or resumes a session. Returns false when the current
    /// status does not permit the transition.
    pub async fn set_suspended(&self, session_id: Uuid, suspended: bool) -> Result<bool, AppError> {
        self.repo.set_suspended(session_id, suspended).await
    }

    /// Lazily records that a session's expiry has passed.
    pub async fn mark_expired(&self, session_id: Uuid) -> Result<(), AppError> {
        self.repo.mark_expired(session_id).await
    }

    /// Sweeps every active session past its expiry into the Expired state.
    pub async fn mark_all_expired(&self) -> Result<u64, AppError> {
        self.repo.mark_all_expired(Utc::now()).await
    }

    /// Sweeps every active session idle beyond the configured timeout into
    /// the Expired state.
    pub async fn mark_all_idle(&self) -> Result<u64, AppError> {
        let cutoff = Utc::now() - Duration::minutes(self.config.idle_timeout_minutes as i64);
        self.repo.mark_all_idle(cutoff).await
    }

    /// Compare-and-set rotation of the stored token hashes. Both hashes
    /// are swapped because refresh mints a whole new pair.
    pub async fn rotate_refresh_token(
        &self,
        session_id: Uuid,
        old_refresh_hash: &str,
        new_token_hash: &str,
        new_refresh_hash: &str,
    ) -> Result<bool, AppError> {
        self.repo
            .rotate_refresh_token(session_id, old_refresh_hash, new_token_hash, new_refresh_hash)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_stable_hex_sha256() {
        let h = hash_token("example-token");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(h, hash_token("example-token"));
        assert_ne!(h, hash_token("example-token2"));
    }
}
