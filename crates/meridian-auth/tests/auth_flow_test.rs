//! Integration tests for the login/refresh/logout flows against a real
//! PostgreSQL database provisioned per test.

use std::sync::Arc;

use sqlx::PgPool;

use meridian_auth::jwt::{JwtDecoder, JwtEncoder};
use meridian_auth::password::PasswordHasher;
use meridian_auth::service::AuthService;
use meridian_auth::session::{SessionManager, SessionStore};
use meridian_core::config::auth::AuthConfig;
use meridian_core::config::session::SessionConfig;
use meridian_core::error::ErrorKind;
use meridian_database::repositories::{SessionRepository, UserRepository};
use meridian_entity::session::DeviceMeta;
use meridian_entity::user::{CreateUser, UserRole, UserStatus};

const PASSWORD: &str = "Tr4verse-Quartz-Lantern";

struct TestHarness {
    service: AuthService,
    sessions: Arc<SessionManager>,
    users: Arc<UserRepository>,
}

impl TestHarness {
    fn new(pool: PgPool) -> Self {
        let auth_config = AuthConfig {
            jwt_secret: "integration-test-secret".into(),
            ..AuthConfig::default()
        };
        let users = Arc::new(UserRepository::new(pool.clone()));
        let store = Arc::new(SessionStore::new(
            Arc::new(SessionRepository::new(pool)),
            SessionConfig::default(),
        ));
        let sessions = Arc::new(SessionManager::new(store));
        let service = AuthService::new(
            Arc::new(JwtEncoder::new(&auth_config)),
            Arc::new(JwtDecoder::new(&auth_config)),
            Arc::clone(&sessions),
            Arc::clone(&users),
            Arc::new(PasswordHasher::new()),
            &auth_config,
        );
        Self {
            service,
            sessions,
            users,
        }
    }

    async fn create_user(&self, username: &str) {
        let hash = PasswordHasher::new().hash_password(PASSWORD).unwrap();
        self.users
            .create(&CreateUser {
                company_id: None,
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: hash,
                role: UserRole::Staff,
                status: UserStatus::Active,
            })
            .await
            .expect("Failed to create user");
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_login_then_authenticate(pool: PgPool) {
    let h = TestHarness::new(pool);
    h.create_user("jdoe").await;

    let result = h
        .service
        .login("jdoe", PASSWORD, None, &DeviceMeta::web("10.0.0.1"))
        .await
        .unwrap();
    assert_eq!(result.user.username, "jdoe");

    let (claims, session) = h
        .service
        .authenticate(&result.tokens.access_token)
        .await
        .unwrap();
    assert_eq!(claims.username, "jdoe");
    assert_eq!(session.id, result.session.id);
    assert!(h.sessions.is_live(session.id).await.unwrap());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_wrong_password_and_unknown_user_are_indistinguishable(pool: PgPool) {
    let h = TestHarness::new(pool);
    h.create_user("jdoe").await;

    let wrong = h
        .service
        .login("jdoe", "Wrong-Passw0rd", None, &DeviceMeta::web("10.0.0.1"))
        .await
        .unwrap_err();
    let unknown = h
        .service
        .login("nobody", PASSWORD, None, &DeviceMeta::web("10.0.0.1"))
        .await
        .unwrap_err();

    assert_eq!(wrong.kind, ErrorKind::InvalidCredentials);
    assert_eq!(unknown.kind, ErrorKind::InvalidCredentials);
    assert_eq!(wrong.message, unknown.message);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_five_failures_lock_out_the_correct_password(pool: PgPool) {
    let h = TestHarness::new(pool);
    h.create_user("bruteforced").await;
    let meta = DeviceMeta::web("10.0.0.1");

    for _ in 0..5 {
        let err = h
            .service
            .login("bruteforced", "Wrong-Passw0rd", None, &meta)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCredentials);
    }

    // The lock now blocks even the correct password.
    let err = h
        .service
        .login("bruteforced", PASSWORD, None, &meta)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccountLocked);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_refresh_rotates_and_rejects_replay(pool: PgPool) {
    let h = TestHarness::new(pool);
    h.create_user("rotator").await;

    let result = h
        .service
        .login("rotator", PASSWORD, None, &DeviceMeta::web("10.0.0.1"))
        .await
        .unwrap();

    let new_pair = h
        .service
        .refresh(&result.tokens.refresh_token)
        .await
        .unwrap();
    assert_ne!(new_pair.refresh_token, result.tokens.refresh_token);

    // Replaying the rotated-away token fails.
    let err = h
        .service
        .refresh(&result.tokens.refresh_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidRefreshToken);

    // The fresh one still works.
    h.service.refresh(&new_pair.refresh_token).await.unwrap();
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_refresh_against_dead_session_is_invalid_refresh_token(pool: PgPool) {
    let h = TestHarness::new(pool);
    h.create_user("loggedout").await;

    let result = h
        .service
        .login("loggedout", PASSWORD, None, &DeviceMeta::web("10.0.0.1"))
        .await
        .unwrap();
    h.sessions
        .revoke(result.session.id, None, "Logout")
        .await
        .unwrap();

    let err = h
        .service
        .refresh(&result.tokens.refresh_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidRefreshToken);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_logout_all_kills_every_session_and_refresh(pool: PgPool) {
    let h = TestHarness::new(pool);
    h.create_user("everywhere").await;
    let meta = DeviceMeta::web("10.0.0.1");

    let first = h.service.login("everywhere", PASSWORD, None, &meta).await.unwrap();
    let second = h.service.login("everywhere", PASSWORD, None, &meta).await.unwrap();

    let revoked = h
        .service
        .logout_all(first.user.id, Some(first.user.id))
        .await
        .unwrap();
    assert_eq!(revoked, 2);

    for session_id in [first.session.id, second.session.id] {
        assert!(!h.sessions.is_live(session_id).await.unwrap());
    }
    for tokens in [&first.tokens, &second.tokens] {
        let err = h.service.refresh(&tokens.refresh_token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRefreshToken);
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_change_password_revokes_sessions_and_swaps_credential(pool: PgPool) {
    let h = TestHarness::new(pool);
    h.create_user("changer").await;
    let meta = DeviceMeta::web("10.0.0.1");

    let result = h.service.login("changer", PASSWORD, None, &meta).await.unwrap();
    let new_password = "Qu4rtz-Lantern-Traverse";

    h.service
        .change_password(result.user.id, PASSWORD, new_password)
        .await
        .unwrap();

    assert!(!h.sessions.is_live(result.session.id).await.unwrap());
    let err = h.service.login("changer", PASSWORD, None, &meta).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCredentials);
    h.service.login("changer", new_password, None, &meta).await.unwrap();
}
