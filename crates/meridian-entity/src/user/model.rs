//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::UserRole;
use super::status::UserStatus;

/// A principal registered in the Meridian ERP system.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Tenant this user belongs to. `None` for cross-tenant principals.
    pub company_id: Option<Uuid>,
    /// Unique login name within the tenant.
    pub username: String,
    /// Email address, unique within the tenant.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When the password was last changed.
    pub password_changed_at: Option<DateTime<Utc>>,
    /// Coarse role tag.
    pub role: UserRole,
    /// Account status.
    pub status: UserStatus,
    /// Number of consecutive failed login attempts.
    pub failed_login_attempts: i32,
    /// Account locked until this time (if locked).
    pub locked_until: Option<DateTime<Utc>>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
    /// IP address of the last successful login.
    pub last_login_ip: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; a deleted user is invisible to every query.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Check if the user account is locked at the given instant.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.map(|until| now < until).unwrap_or(false)
    }

    /// Check if the user can authenticate at the given instant.
    ///
    /// A suspended account or a live lock window always blocks
    /// authentication, regardless of password correctness.
    pub fn can_login_at(&self, now: DateTime<Utc>) -> bool {
        self.status.can_login() && !self.is_locked_at(now)
    }

    /// Check if this user has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Produce the hash-free summary handed back to callers.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            company_id: self.company_id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            status: self.status,
            last_login_at: self.last_login_at,
        }
    }
}

/// Principal summary exposed on login responses — never carries the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    /// Unique user identifier.
    pub id: Uuid,
    /// Tenant this user belongs to.
    pub company_id: Option<Uuid>,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Coarse role tag.
    pub role: UserRole,
    /// Account status.
    pub status: UserStatus,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Tenant scope (optional).
    pub company_id: Option<Uuid>,
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Assigned role.
    pub role: UserRole,
    /// Initial status.
    pub status: UserStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(status: UserStatus, locked_until: Option<DateTime<Utc>>) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            company_id: Some(Uuid::new_v4()),
            username: "jdoe".into(),
            email: "jdoe@example.com".into(),
            password_hash: "$argon2id$stub".into(),
            password_changed_at: None,
            role: UserRole::Staff,
            status,
            failed_login_attempts: 0,
            locked_until,
            last_login_at: None,
            last_login_ip: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_suspended_never_authenticates() {
        let u = user(UserStatus::Suspended, None);
        assert!(!u.can_login_at(Utc::now()));
    }

    #[test]
    fn test_future_lock_blocks_login() {
        let now = Utc::now();
        let u = user(UserStatus::Active, Some(now + Duration::minutes(10)));
        assert!(u.is_locked_at(now));
        assert!(!u.can_login_at(now));
    }

    #[test]
    fn test_elapsed_lock_permits_login() {
        let now = Utc::now();
        let u = user(UserStatus::Locked, Some(now - Duration::minutes(1)));
        assert!(!u.is_locked_at(now));
        assert!(u.can_login_at(now));
    }

    #[test]
    fn test_summary_has_no_hash() {
        let u = user(UserStatus::Active, None);
        let json = serde_json::to_value(u.summary()).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
