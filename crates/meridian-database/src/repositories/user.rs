//! User repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use meridian_core::error::{AppError, ErrorKind};
use meridian_core::result::AppResult;
use meridian_entity::user::model::CreateUser;
use meridian_entity::user::{User, UserStatus};

/// Outcome of recording a failed login attempt.
#[derive(Debug, Clone, Copy)]
pub struct FailureRecord {
    /// The counter value after the increment.
    pub failed_login_attempts: i32,
    /// The lock deadline, if the increment tripped the threshold.
    pub locked_until: Option<DateTime<Utc>>,
}

/// Repository for user CRUD and credential-state operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    /// Find a user by username or email (case-insensitive), tenant scoped.
    ///
    /// A `None` tenant matches cross-tenant principals only.
    pub async fn find_by_identifier(
        &self,
        identifier: &str,
        company_id: Option<Uuid>,
    ) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users \
             WHERE (LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1)) \
               AND company_id IS NOT DISTINCT FROM $2 \
               AND deleted_at IS NULL",
        )
        .bind(identifier)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find user by identifier", e)
        })
    }

    /// Insert a new user.
    pub async fn create(&self, data: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (company_id, username, email, password_hash, role, status) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING *",
        )
        .bind(data.company_id)
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(data.role)
        .bind(data.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict("Username or email is already taken")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create user", e),
        })
    }

    /// Record a failed login attempt atomically.
    ///
    /// Increments the counter and, when the incremented value reaches the
    /// threshold, sets `locked_until` in the same statement. The single
    /// UPDATE avoids lost updates under concurrent login attempts; the lock
    /// itself does not reset the counter.
    pub async fn record_failure(
        &self,
        user_id: Uuid,
        threshold: i32,
        locked_until: DateTime<Utc>,
    ) -> AppResult<FailureRecord> {
        let row: (i32, Option<DateTime<Utc>>) = sqlx::query_as(
            "UPDATE users SET \
                 failed_login_attempts = failed_login_attempts + 1, \
                 locked_until = CASE \
                     WHEN failed_login_attempts + 1 >= $2 THEN $3 \
                     ELSE locked_until \
                 END, \
                 status = CASE \
                     WHEN failed_login_attempts + 1 >= $2 AND status = 'active' THEN 'locked'::user_status \
                     ELSE status \
                 END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING failed_login_attempts, locked_until",
        )
        .bind(user_id)
        .bind(threshold)
        .bind(locked_until)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record login failure", e)
        })?;

        Ok(FailureRecord {
            failed_login_attempts: row.0,
            locked_until: row.1,
        })
    }

    /// Reset the failure counter and clear the lock after a successful
    /// authentication, stamping the login audit fields.
    pub async fn record_success(
        &self,
        user_id: Uuid,
        login_at: DateTime<Utc>,
        login_ip: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET \
                 failed_login_attempts = 0, \
                 locked_until = NULL, \
                 status = CASE WHEN status = 'locked' THEN 'active'::user_status ELSE status END, \
                 last_login_at = $2, \
                 last_login_ip = $3, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(login_at)
        .bind(login_ip)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record login success", e)
        })?;
        Ok(())
    }

    /// Replace the password hash and stamp `password_changed_at`.
    pub async fn update_password(&self, user_id: Uuid, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE users SET \
                 password_hash = $2, \
                 password_changed_at = NOW(), \
                 updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update password", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User not found"));
        }
        Ok(())
    }

    /// Update the account status.
    pub async fn set_status(&self, user_id: Uuid, status: UserStatus) -> AppResult<()> {
        sqlx::query("UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update user status", e)
            })?;
        Ok(())
    }
}
