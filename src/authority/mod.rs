// ============================================================================
// Authentication Authority
// ============================================================================
//
// Owns credential issuance and verification. One core, four frontends:
// HTTP routes (login/register), the framed-TCP server, the Redis queue
// worker and the gRPC AuthService, all answering from the same logic,
// so swapping a client transport never changes the outcome.
//
// ============================================================================

pub mod grpc;
pub mod queue;
pub mod tcp;

use std::sync::Arc;

use bcrypt::{hash, verify, DEFAULT_COST};
use uuid::Uuid;

use crate::auth::AuthManager;
use crate::error::AppError;
use crate::identity::Identity;
use crate::stores::{StoreError, User, UserStore};

pub struct AuthorityCore {
    store: Arc<dyn UserStore>,
    auth: AuthManager,
}

impl AuthorityCore {
    pub fn new(store: Arc<dyn UserStore>, auth: AuthManager) -> Self {
        Self { store, auth }
    }

    /// Creates a user with a bcrypt-hashed password. Fresh accounts carry
    /// no elevated roles.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AppError> {
        if !email.contains('@') {
            return Err(AppError::Validation("email is not valid".to_string()));
        }
        if password.len() < 8 {
            return Err(AppError::Validation(
                "password must be at least 8 characters".to_string(),
            ));
        }

        let password_hash = hash(password, DEFAULT_COST)?;

        match self.store.create(email, &password_hash, &[]).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "User registered");
                Ok(user)
            }
            Err(StoreError::Conflict(msg)) => Err(AppError::Conflict(msg)),
            Err(e) => Err(e.into()),
        }
    }

    /// Validates a login and mints a signed, time-bounded credential.
    ///
    /// Unknown email and wrong password are indistinguishable in the
    /// result to avoid user enumeration.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, i64, User), AppError> {
        let user = match self.store.find_by_email(email).await? {
            Some(user) => user,
            None => {
                tracing::warn!("Login failed: unknown email");
                return Err(AppError::Unauthorized);
            }
        };

        if !verify(password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AppError::Unauthorized);
        }

        let (token, expires_at) = self.auth.create_token(&user)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok((token, expires_at, user))
    }

    /// Verifies a presented credential and resolves its subject.
    /// Invalid signature, expiry and unknown subject all collapse to
    /// `Unauthorized`; verifying the same valid credential twice yields
    /// the same identity.
    pub async fn authenticate(&self, credential: &str) -> Result<Identity, AppError> {
        let claims = self.auth.verify_token(credential).map_err(|e| {
            tracing::debug!(error = %e, "Credential rejected");
            AppError::Unauthorized
        })?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
            tracing::warn!("Credential carries a malformed subject");
            AppError::Unauthorized
        })?;

        let user = self.store.find_by_id(&user_id).await?.ok_or_else(|| {
            tracing::warn!(user_id = %user_id, "Credential subject no longer exists");
            AppError::Unauthorized
        })?;

        Ok(Identity::from(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::stores::InMemoryUserStore;

    fn core() -> AuthorityCore {
        let config = Config::for_tests("0123456789abcdef0123456789abcdef");
        AuthorityCore::new(
            Arc::new(InMemoryUserStore::new()),
            AuthManager::new(&config).unwrap(),
        )
    }

    #[tokio::test]
    async fn register_login_authenticate_round_trip() {
        let core = core();
        let user = core
            .register("test@test.com", "StrongPassword123!@")
            .await
            .unwrap();

        let (token, _, logged_in) = core
            .login("test@test.com", "StrongPassword123!@")
            .await
            .unwrap();
        assert!(!token.is_empty());
        assert_eq!(logged_in.id, user.id);

        let identity = core.authenticate(&token).await.unwrap();
        assert_eq!(identity.id, user.id);
        assert_eq!(identity.email, "test@test.com");

        // Idempotent within the validity window
        let again = core.authenticate(&token).await.unwrap();
        assert_eq!(again, identity);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_are_indistinguishable() {
        let core = core();
        core.register("real@test.com", "StrongPassword123!@")
            .await
            .unwrap();

        let unknown = core.login("ghost@test.com", "whatever123").await;
        let wrong = core.login("real@test.com", "wrong-password").await;

        assert!(matches!(unknown, Err(AppError::Unauthorized)));
        assert!(matches!(wrong, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn garbage_credential_is_unauthorized() {
        let core = core();
        assert!(matches!(
            core.authenticate("not-a-jwt").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let core = core();
        core.register("dup@test.com", "StrongPassword123!@")
            .await
            .unwrap();
        assert!(matches!(
            core.register("dup@test.com", "OtherPassword456!@").await,
            Err(AppError::Conflict(_))
        ));
    }
}
