//! Brute-force lockout policy.
//!
//! Counter state lives on the `users` row, so the lock survives process
//! restarts and cannot be bypassed by retrying from a different device.
//! The persistence side of `record_failure` is a single atomic UPDATE in
//! the user repository; this type holds the policy decisions.

use chrono::{DateTime, Duration, Utc};

use meridian_core::config::auth::AuthConfig;
use meridian_core::error::AppError;
use meridian_entity::user::User;

/// Failed-attempt threshold and lock-window policy.
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    /// Failures before the account locks.
    max_failed_attempts: i32,
    /// How long a lock lasts.
    lockout_duration: Duration,
}

impl LockoutPolicy {
    /// Creates a policy from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            max_failed_attempts: config.max_failed_attempts,
            lockout_duration: Duration::minutes(config.lockout_duration_minutes as i64),
        }
    }

    /// The failure threshold.
    pub fn max_failed_attempts(&self) -> i32 {
        self.max_failed_attempts
    }

    /// The lock deadline a failure at `now` would impose.
    ///
    /// Passed into the atomic repository update so the deadline is fixed
    /// by policy, not recomputed per retry: a 6th failure during an
    /// existing window re-derives the same configured duration rather than
    /// stacking on the previous deadline.
    pub fn lock_until(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.lockout_duration
    }

    /// True iff the user's lock deadline is set and in the future.
    pub fn is_locked(&self, user: &User, now: DateTime<Utc>) -> bool {
        user.is_locked_at(now)
    }

    /// Gate a login attempt on account status and lock state.
    ///
    /// Suspended/inactive/pending accounts never authenticate; a live lock
    /// window blocks regardless of password correctness.
    pub fn check_user(&self, user: &User, now: DateTime<Utc>) -> Result<(), AppError> {
        use meridian_entity::user::UserStatus;

        match user.status {
            UserStatus::Inactive => {
                return Err(AppError::account_inactive(
                    "Account is deactivated. Contact an administrator.",
                ));
            }
            UserStatus::Pending => {
                return Err(AppError::account_inactive(
                    "Account has not been activated yet.",
                ));
            }
            UserStatus::Suspended => {
                return Err(AppError::account_inactive(
                    "Account is suspended. Contact an administrator.",
                ));
            }
            UserStatus::Active | UserStatus::Locked => {}
        }

        if self.is_locked(user, now) {
            // The deadline is safe to disclose; the row stays locked even
            // if the caller keeps retrying with the correct password.
            let until = user
                .locked_until
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_default();
            return Err(AppError::account_locked(format!(
                "Account is locked until {until}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::error::ErrorKind;
    use meridian_entity::user::{UserRole, UserStatus};
    use uuid::Uuid;

    fn policy() -> LockoutPolicy {
        LockoutPolicy::new(&AuthConfig::default())
    }

    fn user(status: UserStatus, locked_until: Option<DateTime<Utc>>) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            company_id: None,
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
    fn test_active_unlocked_user_passes() {
        let now = Utc::now();
        assert!(policy().check_user(&user(UserStatus::Active, None), now).is_ok());
    }

    #[test]
    fn test_suspended_user_is_rejected_as_inactive() {
        let now = Utc::now();
        let err = policy()
            .check_user(&user(UserStatus::Suspended, None), now)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AccountInactive);
    }

    #[test]
    fn test_live_lock_window_rejects() {
        let now = Utc::now();
        let u = user(UserStatus::Active, Some(now + Duration::minutes(10)));
        let err = policy().check_user(&u, now).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AccountLocked);
    }

    #[test]
    fn test_elapsed_lock_window_passes() {
        let now = Utc::now();
        let u = user(UserStatus::Locked, Some(now - Duration::seconds(1)));
        assert!(policy().check_user(&u, now).is_ok());
    }

    #[test]
    fn test_lock_window_matches_configuration() {
        let now = Utc::now();
        let p = policy();
        assert_eq!(p.lock_until(now), now + Duration::minutes(30));
        assert_eq!(p.max_failed_attempts(), 5);
    }
}
