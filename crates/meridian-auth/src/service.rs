//! Authentication orchestration — login, refresh, logout, password change.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use meridian_core::config::auth::AuthConfig;
use meridian_core::error::{AppError, ErrorKind};
use meridian_database::repositories::user::UserRepository;
use meridian_entity::session::{DeviceMeta, Session, SessionSummary};
use meridian_entity::user::UserSummary;

use crate::jwt::encoder::TokenPair;
use crate::jwt::{Claims, JwtDecoder, JwtEncoder};
use crate::lockout::LockoutPolicy;
use crate::password::{PasswordHasher, PasswordPolicy};
use crate::session::store::hash_token;
use crate::session::SessionManager;

/// Result of a successful login.
///
/// Carries view types only; password and token hashes never appear in a
/// login response.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoginResult {
    /// Generated token pair.
    pub tokens: TokenPair,
    /// Created session.
    pub session: SessionSummary,
    /// The authenticated principal.
    pub user: UserSummary,
}

/// Orchestrates the credential, token, and session flows.
#[derive(Clone)]
pub struct AuthService {
    /// JWT encoder for token generation.
    jwt_encoder: Arc<JwtEncoder>,
    /// JWT decoder for token validation.
    jwt_decoder: Arc<JwtDecoder>,
    /// Session lifecycle manager.
    sessions: Arc<SessionManager>,
    /// User repository.
    user_repo: Arc<UserRepository>,
    /// Password hasher.
    password_hasher: Arc<PasswordHasher>,
    /// Password strength policy.
    password_policy: PasswordPolicy,
    /// Brute-force lockout policy.
    lockout: LockoutPolicy,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService").finish_non_exhaustive()
    }
}

impl AuthService {
    /// Creates a new auth service with all required dependencies.
    pub fn new(
        jwt_encoder: Arc<JwtEncoder>,
        jwt_decoder: Arc<JwtDecoder>,
        sessions: Arc<SessionManager>,
        user_repo: Arc<UserRepository>,
        password_hasher: Arc<PasswordHasher>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            jwt_encoder,
            jwt_decoder,
            sessions,
            user_repo,
            password_hasher,
            password_policy: PasswordPolicy::new(config),
            lockout: LockoutPolicy::new(config),
        }
    }

    /// Performs the complete login flow:
    ///
    /// 1. Find user by username or email
    /// 2. Check account status and lock window
    /// 3. Verify the password
    /// 4. Record the outcome on the user row (atomic counter update)
    /// 5. Create session + generate JWT pair
    ///
    /// Unknown identifier and wrong password produce the same opaque
    /// `InvalidCredentials` error, so responses do not reveal which
    /// accounts exist.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        company_id: Option<Uuid>,
        meta: &DeviceMeta,
    ) -> Result<LoginResult, AppError> {
        let now = Utc::now();

        // Step 1: Find user
        let Some(user) = self.user_repo.find_by_identifier(identifier, company_id).await? else {
            warn!(identifier = %identifier, "Login attempt for unknown identifier");
            return Err(AppError::invalid_credentials());
        };

        // Step 2: Status and lock gate, before any password work
        self.lockout.check_user(&user, now)?;

        // Step 3: Verify password
        let password_valid = self
            .password_hasher
            .verify_password(password, &user.password_hash)?;

        // Step 4: Persist the outcome. The failure path commits even though
        // the login itself fails; a lost increment would defeat the lockout.
        if !password_valid {
            let record = self
                .user_repo
                .record_failure(
                    user.id,
                    self.lockout.max_failed_attempts(),
                    self.lockout.lock_until(now),
                )
                .await?;
            warn!(
                user_id = %user.id,
                failed_attempts = record.failed_login_attempts,
                locked = record.locked_until.is_some(),
                "Login failed: bad password"
            );
            return Err(AppError::invalid_credentials());
        }

        self.user_repo
            .record_success(user.id, now, meta.ip_address.as_deref())
            .await?;

        // Step 5: Fix the session id first so the JWT `sid` claim and the
        // session row agree, then mint and store only digests.
        let session_id = Uuid::new_v4();
        let tokens = self.jwt_encoder.issue_pair(&user, session_id)?;

        let session = self
            .sessions
            .store()
            .create_session(
                &user,
                meta,
                &hash_token(&tokens.access_token),
                &hash_token(&tokens.refresh_token),
                session_id,
            )
            .await?;

        info!(
            user_id = %user.id,
            session_id = %session.id,
            kind = %session.kind,
            "Login successful"
        );

        Ok(LoginResult {
            tokens,
            session: session.summary(),
            user: user.summary(),
        })
    }

    /// Validates an access token and its backing session.
    ///
    /// The signature check is stateless; the session lookup is what makes
    /// revocation effective before the token's `exp`. Touches the session's
    /// last-activity timestamp on success.
    pub async fn authenticate(&self, access_token: &str) -> Result<(Claims, Session), AppError> {
        let claims = self.jwt_decoder.decode_access_token(access_token)?;
        let session = self.sessions.validate(claims.session_id()).await?;

        if session.user_id != claims.user_id() {
            warn!(
                session_id = %session.id,
                "Access token subject does not match session owner"
            );
            return Err(AppError::invalid_token("Token does not match session"));
        }

        self.sessions.touch(session.id).await?;

        Ok((claims, session))
    }

    /// Performs the refresh flow:
    ///
    /// 1. Decode and validate the refresh token
    /// 2. Validate the backing session is live
    /// 3. Rotate the stored refresh hash (compare-and-set)
    /// 4. Issue a fresh token pair
    ///
    /// Rotation is single-use: a replayed refresh token loses the
    /// compare-and-set and is rejected, which also covers two racing
    /// refreshes — exactly one wins.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        // Step 1: Decode
        let claims = self.jwt_decoder.decode_refresh_token(refresh_token)?;
        let session_id = claims.session_id();

        // Step 2: Session must still be live. On the refresh path a dead
        // session means the presented refresh token is no good, so the
        // liveness failure surfaces as InvalidRefreshToken rather than the
        // session-lookup error used by `authenticate`.
        let session = self
            .sessions
            .validate(session_id)
            .await
            .map_err(|e| match e.kind {
                ErrorKind::SessionNotFound => {
                    AppError::invalid_refresh_token("Session is no longer live")
                }
                _ => e,
            })?;

        let Some(user) = self.user_repo.find_by_id(session.user_id).await? else {
            return Err(AppError::invalid_refresh_token("Unknown principal"));
        };
        self.lockout.check_user(&user, Utc::now())?;

        // Step 3 + 4: Mint first, then swap hashes atomically
        let tokens = self.jwt_encoder.issue_pair(&user, session_id)?;

        let rotated = self
            .sessions
            .store()
            .rotate_refresh_token(
                session_id,
                &hash_token(refresh_token),
                &hash_token(&tokens.access_token),
                &hash_token(&tokens.refresh_token),
            )
            .await?;

        if !rotated {
            warn!(
                user_id = %user.id,
                session_id = %session_id,
                "Refresh token replay or rotation race detected"
            );
            return Err(AppError::invalid_refresh_token(
                "Refresh token has already been used",
            ));
        }

        self.sessions.touch(session_id).await?;

        info!(user_id = %user.id, session_id = %session_id, "Token pair refreshed");

        Ok(tokens)
    }

    /// Logs out the current session.
    pub async fn logout(&self, claims: &Claims) -> Result<(), AppError> {
        self.sessions
            .revoke(claims.session_id(), Some(claims.user_id()), "Logout")
            .await?;
        info!(
            user_id = %claims.user_id(),
            session_id = %claims.session_id(),
            "Logout successful"
        );
        Ok(())
    }

    /// Logs out every session of a user. Returns the revoked count.
    pub async fn logout_all(
        &self,
        user_id: Uuid,
        revoked_by: Option<Uuid>,
    ) -> Result<u64, AppError> {
        self.sessions
            .revoke_all(user_id, revoked_by, "Logout from all devices")
            .await
    }

    /// Changes a user's password.
    ///
    /// Requires the current password, enforces the strength policy on the
    /// new one, and revokes every session afterwards so stolen tokens die
    /// with the old credential.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let current_valid = self
            .password_hasher
            .verify_password(current_password, &user.password_hash)?;
        if !current_valid {
            return Err(AppError::invalid_credentials());
        }

        self.password_policy.validate(new_password)?;
        self.password_policy
            .validate_not_same(current_password, new_password)?;

        let new_hash = self.password_hasher.hash_password(new_password)?;
        self.user_repo.update_password(user_id, &new_hash).await?;

        let revoked = self
            .sessions
            .revoke_all(user_id, Some(user_id), "Password changed")
            .await?;

        info!(
            user_id = %user_id,
            sessions_revoked = revoked,
            "Password changed"
        );

        Ok(())
    }
}
