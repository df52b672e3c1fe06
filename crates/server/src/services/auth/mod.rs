//! Authentication service.
//!
//! Students log in with their student id and password and receive an opaque
//! bearer token. Only a SHA-256 digest of the token is stored, so a leaked
//! token table cannot be replayed.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::RngCore;
use secrecy::SecretString;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use afterschool_core::{StudentId, UserId};

use crate::db::{Store, StoreError};
use crate::models::{AuthToken, CurrentUser, NewUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Random bytes in a bearer token (256 bits).
const TOKEN_BYTES: usize = 32;

/// A freshly issued bearer token.
///
/// The plaintext is only ever held here, on its way to the client.
#[derive(Debug)]
pub struct IssuedToken {
    pub token: SecretString,
    pub user_id: UserId,
    pub expires_at: chrono::DateTime<Utc>,
}

/// Authentication service.
///
/// Handles login, token verification, logout and user creation.
pub struct AuthService<'a> {
    store: &'a dyn Store,
    token_ttl: Duration,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store, token_ttl: Duration) -> Self {
        Self { store, token_ttl }
    }

    /// Create a user with a student id and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidStudentId` if the student id format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the student id is already registered.
    #[instrument(skip(self, password))]
    pub async fn create_user(&self, student_id: &str, password: &str) -> Result<User, AuthError> {
        let student_id = StudentId::parse(student_id)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .store
            .insert_user(NewUser {
                student_id,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Store(other),
            })?;

        info!(user_id = %user.id, "User created");
        Ok(user)
    }

    /// Login with student id and password, issuing a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the student id is unknown or
    /// malformed, or the password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, student_id: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let student_id =
            StudentId::parse(student_id).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .store
            .get_user_by_student_id(&student_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;

        let now = Utc::now();
        let purged = self.store.purge_expired_tokens(now).await?;
        if purged > 0 {
            debug!(purged, "Purged expired tokens");
        }

        let token = generate_token();
        let expires_at = now + self.token_ttl;
        self.store
            .put_token(&AuthToken {
                token_hash: digest_token(&token),
                user_id: user.id,
                created_at: now,
                expires_at,
            })
            .await?;

        info!(user_id = %user.id, "User logged in");
        Ok(IssuedToken {
            token: SecretString::from(token),
            user_id: user.id,
            expires_at,
        })
    }

    /// Resolve a bearer token to the user it was issued to.
    ///
    /// Expired tokens are deleted on sight.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown.
    /// Returns `AuthError::TokenExpired` if the token is past its expiry.
    pub async fn authenticate(&self, token: &str) -> Result<CurrentUser, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        let token_hash = digest_token(token);
        let stored = self
            .store
            .get_token(&token_hash)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if stored.is_expired(Utc::now()) {
            self.store.delete_token(&token_hash).await?;
            return Err(AuthError::TokenExpired);
        }

        Ok(CurrentUser {
            id: stored.user_id,
            token_hash,
        })
    }

    /// Revoke the token the current request authenticated with.
    ///
    /// # Returns
    ///
    /// Returns `true` if the token was revoked, `false` if it was already gone.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Store` if the store operation fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn logout(&self, user: &CurrentUser) -> Result<bool, AuthError> {
        let revoked = self.store.delete_token(&user.token_hash).await?;
        info!(revoked, "User logged out");
        Ok(revoked)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate a random URL-safe bearer token.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest under which a token is stored.
fn digest_token(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;
    use crate::db::{MemoryStore, TokenStore};

    const STUDENT: &str = "M00123456";
    const PASSWORD: &str = "correct horse";

    async fn store_with_user() -> MemoryStore {
        let store = MemoryStore::new();
        AuthService::new(&store, Duration::hours(1))
            .create_user(STUDENT, PASSWORD)
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password(PASSWORD).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(PASSWORD, &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_tokens_are_unique_and_digest_is_stable() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert_eq!(digest_token(&a), digest_token(&a));
        assert_ne!(digest_token(&a), a);
    }

    #[tokio::test]
    async fn test_login_and_authenticate() {
        let store = store_with_user().await;
        let auth = AuthService::new(&store, Duration::hours(1));

        let issued = auth.login(STUDENT, PASSWORD).await.unwrap();
        let user = auth
            .authenticate(issued.token.expose_secret())
            .await
            .unwrap();
        assert_eq!(user.id, issued.user_id);

        // Only the digest is stored.
        assert!(
            store
                .get_token(issued.token.expose_secret())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = store_with_user().await;
        let auth = AuthService::new(&store, Duration::hours(1));

        for (student, password) in [
            (STUDENT, "wrong password"),
            ("M99999999", PASSWORD),
            ("not-an-id", PASSWORD),
        ] {
            assert!(matches!(
                auth.login(student, password).await.unwrap_err(),
                AuthError::InvalidCredentials
            ));
        }
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let store = store_with_user().await;
        let auth = AuthService::new(&store, Duration::hours(1));

        let issued = auth.login(STUDENT, PASSWORD).await.unwrap();
        let user = auth
            .authenticate(issued.token.expose_secret())
            .await
            .unwrap();
        assert!(auth.logout(&user).await.unwrap());
        assert!(!auth.logout(&user).await.unwrap());
        assert!(matches!(
            auth.authenticate(issued.token.expose_secret())
                .await
                .unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected_and_deleted() {
        let store = store_with_user().await;
        let auth = AuthService::new(&store, Duration::zero());

        let issued = auth.login(STUDENT, PASSWORD).await.unwrap();
        assert!(matches!(
            auth.authenticate(issued.token.expose_secret())
                .await
                .unwrap_err(),
            AuthError::TokenExpired
        ));
        assert!(matches!(
            auth.authenticate(issued.token.expose_secret())
                .await
                .unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[tokio::test]
    async fn test_login_purges_expired_tokens() {
        let store = store_with_user().await;

        let stale = AuthService::new(&store, Duration::zero())
            .login(STUDENT, PASSWORD)
            .await
            .unwrap();
        let fresh = AuthService::new(&store, Duration::hours(1))
            .login(STUDENT, PASSWORD)
            .await
            .unwrap();

        let stale_hash = digest_token(stale.token.expose_secret());
        let fresh_hash = digest_token(fresh.token.expose_secret());
        assert!(store.get_token(&stale_hash).await.unwrap().is_none());
        assert!(store.get_token(&fresh_hash).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_user_validation() {
        let store = store_with_user().await;
        let auth = AuthService::new(&store, Duration::hours(1));

        assert!(matches!(
            auth.create_user("00123456", PASSWORD).await.unwrap_err(),
            AuthError::InvalidStudentId(_)
        ));
        assert!(matches!(
            auth.create_user("M00654321", "short").await.unwrap_err(),
            AuthError::WeakPassword(_)
        ));
        assert!(matches!(
            auth.create_user(STUDENT, PASSWORD).await.unwrap_err(),
            AuthError::UserAlreadyExists
        ));
    }
}
