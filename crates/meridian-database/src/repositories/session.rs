//! Session repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use meridian_core::error::{AppError, ErrorKind};
use meridian_core::result::AppResult;
use meridian_entity::session::{Session, SessionStatus};

/// Repository for session lifecycle and query operations.
///
/// Rows are never deleted: expired and revoked sessions are retained for
/// audit.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new session row.
    pub async fn create(&self, session: &Session) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, company_id, token_hash, refresh_token_hash, \
                 status, kind, ip_address, user_agent, device_info, created_at, expires_at, \
                 last_activity_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(session.company_id)
        .bind(&session.token_hash)
        .bind(&session.refresh_token_hash)
        .bind(session.status)
        .bind(session.kind)
        .bind(&session.ip_address)
        .bind(&session.user_agent)
        .bind(&session.device_info)
        .bind(session.created_at)
        .bind(session.expires_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict("Session token reference already exists for this user")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create session", e),
        })?;
        Ok(())
    }

    /// Find a session by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }

    /// List all live sessions for a user.
    pub async fn find_active_by_user(&self, user_id: Uuid) -> AppResult<Vec<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions \
             WHERE user_id = $1 AND status = 'active' \
               AND (expires_at IS NULL OR expires_at > NOW()) \
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find active sessions", e)
        })
    }

    /// List every session for a user, live or not (audit views).
    pub async fn find_all_by_user(&self, user_id: Uuid) -> AppResult<Vec<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list sessions", e))
    }

    /// Update the last-activity timestamp.
    pub async fn touch(&self, session_id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE sessions SET last_activity_at = $2 WHERE id = $1")
            .bind(session_id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update activity", e)
            })?;
        Ok(())
    }

    /// Mark a session revoked with an audit trail.
    pub async fn revoke(
        &self,
        session_id: Uuid,
        revoked_by: Option<Uuid>,
        reason: &str,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE sessions SET \
                 status = 'revoked', revoked_by = $2, revoked_reason = $3, revoked_at = NOW() \
             WHERE id = $1 AND status IN ('active', 'suspended')",
        )
        .bind(session_id)
        .bind(revoked_by)
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke session", e))?;
        Ok(())
    }

    /// Revoke every non-terminal session for a user. Returns the count.
    pub async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        revoked_by: Option<Uuid>,
        reason: &str,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE sessions SET \
                 status = 'revoked', revoked_by = $2, revoked_reason = $3, revoked_at = NOW() \
             WHERE user_id = $1 AND status IN ('active', 'suspended')",
        )
        .bind(user_id)
        .bind(revoked_by)
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke user sessions", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Transition a session between Active and Suspended.
    ///
    /// Returns false when the current status does not permit the move
    /// (terminal states stay terminal).
    pub async fn set_suspended(&self, session_id: Uuid, suspended: bool) -> AppResult<bool> {
        let (from, to) = if suspended {
            (SessionStatus::Active, SessionStatus::Suspended)
        } else {
            (SessionStatus::Suspended, SessionStatus::Active)
        };

        let result = sqlx::query("UPDATE sessions SET status = $3 WHERE id = $1 AND status = $2")
            .bind(session_id)
            .bind(from)
            .bind(to)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update session status", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Lazily mark one time-expired session as Expired.
    pub async fn mark_expired(&self, session_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE sessions SET status = 'expired' \
             WHERE id = $1 AND status = 'active' AND expires_at <= NOW()",
        )
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark session expired", e)
        })?;
        Ok(())
    }

    /// Sweep: mark every active session past its expiry as Expired.
    ///
    /// Uses the partial index on `expires_at`. Returns the number of rows
    /// transitioned; nothing is deleted.
    pub async fn mark_all_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE sessions SET status = 'expired' \
             WHERE status = 'active' AND expires_at IS NOT NULL AND expires_at <= $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to sweep expired sessions", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Sweep: mark every active session idle since before the cutoff as
    /// Expired. Returns the number of rows transitioned.
    pub async fn mark_all_idle(&self, idle_cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE sessions SET status = 'expired' \
             WHERE status = 'active' AND last_activity_at <= $1",
        )
        .bind(idle_cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to sweep idle sessions", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Rotate both token hashes with a compare-and-set.
    ///
    /// Refresh mints a whole new token pair, so the access token hash is
    /// swapped along with the refresh hash. The UPDATE matches only while
    /// the stored refresh hash still equals `old_refresh_hash` and the
    /// session is active, so of two concurrent refresh attempts exactly
    /// one wins; the loser observes `false` and must fail with an
    /// invalid-refresh-token error.
    pub async fn rotate_refresh_token(
        &self,
        session_id: Uuid,
        old_refresh_hash: &str,
        new_token_hash: &str,
        new_refresh_hash: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE sessions SET token_hash = $3, refresh_token_hash = $4, \
                 last_activity_at = NOW() \
             WHERE id = $1 AND refresh_token_hash = $2 AND status = 'active'",
        )
        .bind(session_id)
        .bind(old_refresh_hash)
        .bind(new_token_hash)
        .bind(new_refresh_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to rotate refresh token", e)
        })?;
        Ok(result.rows_affected() > 0)
    }
}
