//! Authentication service.
//!
//! Provides account registration, password login, and bearer token
//! resolution.

mod error;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use password::PasswordHasher;
pub use token::TokenService;

use order_desk_core::Email;

use crate::db::{RepositoryError, UserStore};
use crate::models::{NewUser, User};

/// Data for creating an account.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub active: bool,
    pub is_admin: bool,
}

/// Authentication service.
///
/// Borrows the request's unit of work for account lookups.
pub struct AuthService<'a, U> {
    users: &'a mut U,
    hasher: &'a PasswordHasher,
    tokens: &'a TokenService,
}

impl<'a, U: UserStore + Send> AuthService<'a, U> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        users: &'a mut U,
        hasher: &'a PasswordHasher,
        tokens: &'a TokenService,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::EmailExists` if the email is already registered.
    pub async fn register(&mut self, registration: Registration) -> Result<User, AuthError> {
        let email = Email::parse(&registration.email)?;
        password::validate_password(&registration.password)?;

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailExists);
        }

        let password_hash = self.hasher.hash(&registration.password)?;

        let user = self
            .users
            .insert_user(NewUser {
                name: registration.name,
                email,
                password_hash,
                active: registration.active,
                is_admin: registration.is_admin,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, is_admin = user.is_admin, "account created");
        Ok(user)
    }

    /// Check an email/password pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if no account matches the email
    /// or the password is wrong.
    pub async fn authenticate_credentials(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        // No stored account can have an unparseable email.
        let Ok(email) = Email::parse(email) else {
            return Err(AuthError::InvalidCredentials);
        };

        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.hasher.verify(password, &user.password_hash) {
            tracing::debug!(user_id = %user.id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Resolve a bearer token to its user.
    ///
    /// Performs exactly one account read.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token does not verify.
    /// Returns `AuthError::UnknownUser` if the subject has no account.
    pub async fn authenticate_bearer(&mut self, token: &str) -> Result<User, AuthError> {
        let user_id = self.tokens.verify(token)?;

        self.users
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| {
                tracing::debug!(user_id = %user_id, "token subject has no account");
                AuthError::UnknownUser
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::Algorithm;
    use secrecy::SecretString;

    use order_desk_core::UserId;

    use super::*;
    use crate::config::{PasswordHashConfig, TokenConfig};
    use crate::db::{MemoryStore, Store, UnitOfWork};

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(&PasswordHashConfig {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    fn tokens() -> TokenService {
        TokenService::new(&TokenConfig {
            secret: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%"),
            algorithm: Algorithm::HS256,
            access_token_ttl: Duration::minutes(30),
        })
    }

    fn registration(email: &str) -> Registration {
        Registration {
            name: "Maria".to_string(),
            email: email.to_string(),
            password: "hunter2hunter2".to_string(),
            active: true,
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let (hasher, tokens) = (hasher(), tokens());
        let mut unit = store.begin().await.unwrap();
        let mut auth = AuthService::new(&mut unit, &hasher, &tokens);

        let user = auth.register(registration("maria@example.com")).await.unwrap();
        assert_ne!(user.password_hash, "hunter2hunter2");

        let logged_in = auth
            .authenticate_credentials("Maria@Example.com", "hunter2hunter2")
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_second_registration_conflicts() {
        let store = MemoryStore::new();
        let (hasher, tokens) = (hasher(), tokens());

        let mut unit = store.begin().await.unwrap();
        AuthService::new(&mut unit, &hasher, &tokens)
            .register(registration("maria@example.com"))
            .await
            .unwrap();
        unit.commit().await.unwrap();

        let mut unit = store.begin().await.unwrap();
        let err = AuthService::new(&mut unit, &hasher, &tokens)
            .register(registration(" MARIA@example.com "))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailExists));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let store = MemoryStore::new();
        let (hasher, tokens) = (hasher(), tokens());
        let mut unit = store.begin().await.unwrap();
        let mut auth = AuthService::new(&mut unit, &hasher, &tokens);

        let err = auth.register(registration("not-an-email")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail(_)));

        let mut weak = registration("maria@example.com");
        weak.password = "short".to_string();
        let err = auth.register(weak).await.unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(_)));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let store = MemoryStore::new();
        let (hasher, tokens) = (hasher(), tokens());
        let mut unit = store.begin().await.unwrap();
        let mut auth = AuthService::new(&mut unit, &hasher, &tokens);
        auth.register(registration("maria@example.com")).await.unwrap();

        for (email, password) in [
            ("maria@example.com", "wrong password"),
            ("nobody@example.com", "hunter2hunter2"),
            ("garbage", "hunter2hunter2"),
        ] {
            let err = auth
                .authenticate_credentials(email, password)
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }
    }

    #[tokio::test]
    async fn test_bearer_resolves_user() {
        let store = MemoryStore::new();
        let (hasher, tokens) = (hasher(), tokens());
        let mut unit = store.begin().await.unwrap();
        let mut auth = AuthService::new(&mut unit, &hasher, &tokens);
        let user = auth.register(registration("maria@example.com")).await.unwrap();

        let token = tokens.issue_access(user.id).unwrap();
        let resolved = auth.authenticate_bearer(&token).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn test_bearer_for_missing_user_is_unknown_user() {
        let store = MemoryStore::new();
        let (hasher, tokens) = (hasher(), tokens());
        let mut unit = store.begin().await.unwrap();
        let mut auth = AuthService::new(&mut unit, &hasher, &tokens);

        let token = tokens.issue_access(UserId::new(404)).unwrap();
        let err = auth.authenticate_bearer(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::UnknownUser));
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_bearer_garbage_is_invalid_token() {
        let store = MemoryStore::new();
        let (hasher, tokens) = (hasher(), tokens());
        let mut unit = store.begin().await.unwrap();
        let mut auth = AuthService::new(&mut unit, &hasher, &tokens);

        let err = auth.authenticate_bearer("garbage").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }
}
