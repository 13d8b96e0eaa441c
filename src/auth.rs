use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::stores::User;

/// Claims embedded in every minted credential
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id
    pub sub: String,
    pub email: String,
    /// Expiration time (Unix epoch seconds)
    pub exp: i64,
    /// Issued at (Unix epoch seconds)
    pub iat: i64,
    pub iss: String,
}

/// Mints and verifies signed, time-bounded credentials (HS256).
///
/// There is no refresh mechanism: an expired credential forces re-login.
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_hours: i64,
    issuer: String,
}

impl AuthManager {
    pub fn new(config: &Config) -> Result<Self> {
        if config.jwt_secret.len() < 32 {
            anyhow::bail!("JWT secret must be at least 32 characters long");
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.jwt_issuer.clone()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            ttl_hours: config.jwt_ttl_hours,
            issuer: config.jwt_issuer.clone(),
        })
    }

    /// Mints a credential for a verified user. Returns the token together
    /// with its expiry timestamp (Unix epoch seconds).
    pub fn create_token(&self, user: &User) -> Result<(String, i64)> {
        let now = Utc::now();
        let expires_at = (now + Duration::hours(self.ttl_hours)).timestamp();

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            exp: expires_at,
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok((token, expires_at))
    }

    /// Verifies signature, expiry and issuer. The caller is responsible for
    /// resolving the subject against the user store.
    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn manager_with_ttl(ttl_hours: i64) -> AuthManager {
        let mut config = Config::for_tests(SECRET);
        config.jwt_ttl_hours = ttl_hours;
        AuthManager::new(&config).unwrap()
    }

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "test@test.com".to_string(),
            password_hash: String::new(),
            roles: vec!["admin".to_string()],
        }
    }

    #[test]
    fn mint_and_verify_round_trip() {
        let manager = manager_with_ttl(1);
        let user = test_user();

        let (token, expires_at) = manager.create_token(&user).unwrap();
        assert!(!token.is_empty());
        assert!(expires_at > Utc::now().timestamp());

        let claims = manager.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.iss, "staybook-test");
    }

    #[test]
    fn expired_token_is_rejected() {
        let manager = manager_with_ttl(-1);
        let (token, _) = manager.create_token(&test_user()).unwrap();
        assert!(manager.verify_token(&token).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let minted_by = manager_with_ttl(1);
        let (token, _) = minted_by.create_token(&test_user()).unwrap();

        let config = Config::for_tests("ffffffffffffffffffffffffffffffff");
        let verifier = AuthManager::new(&config).unwrap();
        assert!(verifier.verify_token(&token).is_err());
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let manager = manager_with_ttl(1);
        let (token, _) = manager.create_token(&test_user()).unwrap();

        let mut config = Config::for_tests(SECRET);
        config.jwt_issuer = "someone-else".to_string();
        let verifier = AuthManager::new(&config).unwrap();
        assert!(verifier.verify_token(&token).is_err());
    }
}
