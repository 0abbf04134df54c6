use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::models::User;

/// Claims carried by a short-lived access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject of the token: the user's unique identifier.
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Claims carried by a long-lived refresh token. Identity only; the token is
/// also checked against the stored per-user value before it is honored.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
}

/// Issues and verifies both token classes.
///
/// Built once at startup from `AuthConfig` and shared via `web::Data`; the
/// two classes use distinct secrets, so a token of one class never verifies
/// as the other.
pub struct TokenManager {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenManager {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_token_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_token_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            access_ttl: Duration::minutes(config.access_token_ttl_minutes),
            refresh_ttl: Duration::days(config.refresh_token_ttl_days),
        }
    }

    /// Signs a short-lived access token carrying the user's identity claims.
    pub fn issue_access_token(&self, user: &User) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            iat: now.timestamp() as usize,
            exp: (now + self.access_ttl).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|e| ApiError::InternalServerError(format!("failed to sign access token: {}", e)))
    }

    /// Signs a long-lived refresh token for the given user id.
    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user_id,
            iat: now.timestamp() as usize,
            exp: (now + self.refresh_ttl).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.refresh_encoding).map_err(|e| {
            ApiError::InternalServerError(format!("failed to sign refresh token: {}", e))
        })
    }

    /// Verifies signature and expiry of an access token.
    ///
    /// Any failure (malformed token, wrong signature, expired) is reported as
    /// an authentication failure, never a server error.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, ApiError> {
        decode::<AccessClaims>(token, &self.access_decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| ApiError::Unauthorized(format!("access token expired or invalid: {}", e)))
    }

    /// Verifies signature and expiry of a refresh token.
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, ApiError> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| ApiError::Unauthorized(format!("refresh token expired or invalid: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use pretty_assertions::assert_eq;

    fn test_config() -> AuthConfig {
        AuthConfig {
            access_token_secret: "access-test-secret".to_string(),
            refresh_token_secret: "refresh-test-secret".to_string(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 7,
        }
    }

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Token Tester".to_string(),
            email: "tokens@example.com".to_string(),
            password: "irrelevant".to_string(),
            role: Role::User,
            refresh_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_token_roundtrip() {
        let manager = TokenManager::new(&test_config());
        let user = test_user();

        let token = manager.issue_access_token(&user).unwrap();
        let claims = manager.verify_access_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.name, user.name);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_token_roundtrip() {
        let manager = TokenManager::new(&test_config());
        let user_id = Uuid::new_v4();

        let token = manager.issue_refresh_token(user_id).unwrap();
        let claims = manager.verify_refresh_token(&token).unwrap();

        assert_eq!(claims.sub, user_id);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let manager = TokenManager::new(&test_config());
        let other = TokenManager::new(&AuthConfig {
            access_token_secret: "a completely different secret".to_string(),
            ..test_config()
        });

        let token = other.issue_access_token(&test_user()).unwrap();

        match manager.verify_access_token(&token) {
            Err(ApiError::Unauthorized(msg)) => {
                assert!(msg.contains("InvalidSignature") || msg.contains("InvalidToken"));
            }
            Ok(_) => panic!("token signed with another secret must not verify"),
            Err(e) => panic!("unexpected error type: {:?}", e),
        }
    }

    #[test]
    fn test_expired_access_token_is_rejected() {
        let manager = TokenManager::new(&test_config());
        let user = test_user();

        // Sign with the same secret but an expiry well past the default
        // 60-second validation leeway.
        let past = Utc::now() - Duration::hours(2);
        let claims = AccessClaims {
            sub: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            iat: (past - Duration::minutes(15)).timestamp() as usize,
            exp: past.timestamp() as usize,
        };
        let expired = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("access-test-secret".as_bytes()),
        )
        .unwrap();

        match manager.verify_access_token(&expired) {
            Err(ApiError::Unauthorized(msg)) => {
                assert!(msg.contains("ExpiredSignature"), "unexpected message: {}", msg);
            }
            Ok(_) => panic!("expired token must not verify"),
            Err(e) => panic!("unexpected error type: {:?}", e),
        }
    }

    #[test]
    fn test_token_classes_are_not_interchangeable() {
        let manager = TokenManager::new(&test_config());
        let user = test_user();

        let access = manager.issue_access_token(&user).unwrap();
        let refresh = manager.issue_refresh_token(user.id).unwrap();

        assert!(manager.verify_refresh_token(&access).is_err());
        // The refresh payload lacks the access claims and is signed with the
        // other secret, so it must not pass access verification either.
        assert!(manager.verify_access_token(&refresh).is_err());
    }

    #[test]
    fn test_malformed_token_is_rejected() {
        let manager = TokenManager::new(&test_config());
        assert!(matches!(
            manager.verify_access_token("definitely.not.a.jwt"),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
