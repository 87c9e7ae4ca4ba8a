//! Stateless JWT validation.
//!
//! The decoder checks signature, expiry, and token type only — it performs
//! no storage I/O, so it can be replicated freely. Whether the bound
//! session is still live is the session manager's concern; callers must
//! cross-check.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use meridian_core::config::auth::AuthConfig;
use meridian_core::error::AppError;

use super::claims::{Claims, TokenType};

/// Validates JWT tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // 5 seconds leeway for clock skew
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode_token(token)?;

        if claims.token_type != TokenType::Access {
            return Err(AppError::invalid_token(
                "Invalid token type: expected access token",
            ));
        }

        Ok(claims)
    }

    /// Decodes and validates a refresh token string.
    pub fn decode_refresh_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode_token(token)?;

        if claims.token_type != TokenType::Refresh {
            return Err(AppError::invalid_refresh_token(
                "Invalid token type: expected refresh token",
            ));
        }

        Ok(claims)
    }

    /// Internal decode without type checking.
    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::token_expired("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::invalid_token("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::invalid_token("Invalid token signature")
                    }
                    _ => AppError::invalid_token(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::encoder::JwtEncoder;
    use chrono::Utc;
    use meridian_core::error::ErrorKind;
    use meridian_entity::user::{User, UserRole, UserStatus};
    use uuid::Uuid;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "unit-test-secret-not-for-production".into(),
            ..AuthConfig::default()
        }
    }

    fn test_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            company_id: Some(Uuid::new_v4()),
            username: "jdoe".into(),
            email: "jdoe@example.com".into(),
            password_hash: "$argon2id$stub".into(),
            password_changed_at: None,
            role: UserRole::Manager,
            status: UserStatus::Active,
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            last_login_ip: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_issue_then_decode_round_trips_claims() {
        let config = test_config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);
        let user = test_user();
        let session_id = Uuid::new_v4();

        let pair = encoder.issue_pair(&user, session_id).unwrap();
        let claims = decoder.decode_access_token(&pair.access_token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.sid, session_id);
        assert_eq!(claims.company_id, user.company_id);
        assert_eq!(claims.role, UserRole::Manager);
        assert_eq!(claims.username, "jdoe");
        assert_eq!(claims.email.as_deref(), Some("jdoe@example.com"));
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_refresh_token_decodes_as_refresh_only() {
        let config = test_config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);

        let pair = encoder.issue_pair(&test_user(), Uuid::new_v4()).unwrap();

        let claims = decoder.decode_refresh_token(&pair.refresh_token).unwrap();
        assert_eq!(claims.token_type, TokenType::Refresh);
        assert_eq!(claims.email, None);

        // Type confusion is rejected in both directions.
        let err = decoder.decode_access_token(&pair.refresh_token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
        let err = decoder.decode_refresh_token(&pair.access_token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRefreshToken);
    }

    #[test]
    fn test_tampered_signature_is_invalid() {
        let config = test_config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);

        let pair = encoder.issue_pair(&test_user(), Uuid::new_v4()).unwrap();
        let mut tampered = pair.access_token.clone();
        // Flip the last signature character.
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        let err = decoder.decode_access_token(&tampered).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let encoder = JwtEncoder::new(&test_config());
        let other = AuthConfig {
            jwt_secret: "a-different-secret".into(),
            ..AuthConfig::default()
        };
        let decoder = JwtDecoder::new(&other);

        let pair = encoder.issue_pair(&test_user(), Uuid::new_v4()).unwrap();
        let err = decoder.decode_access_token(&pair.access_token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[test]
    fn test_expired_token_fails_with_token_expired() {
        let config = AuthConfig {
            jwt_secret: "unit-test-secret-not-for-production".into(),
            // Negative TTL is not expressible; encode with a past exp by hand.
            ..AuthConfig::default()
        };
        let decoder = JwtDecoder::new(&config);

        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            sid: Uuid::new_v4(),
            company_id: None,
            role: UserRole::Staff,
            username: "jdoe".into(),
            email: None,
            iat: (now - chrono::Duration::hours(2)).timestamp(),
            exp: (now - chrono::Duration::hours(1)).timestamp(),
            jti: Uuid::new_v4(),
            token_type: TokenType::Access,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        let err = decoder.decode_access_token(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TokenExpired);
    }
}
