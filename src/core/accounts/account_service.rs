// Account service - registration, login and session lifecycle.
//
// anonymous -> authenticated (login) -> anonymous (logout or expiry)
//
// Passwords are hashed with Argon2id and a random salt. Login re-hashes the
// supplied password against the stored PHC string; plaintext is never stored
// or compared.

use super::account_models::{NewUser, Registration, Session, User};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Username or email already exists")]
    DuplicateAccount,

    #[error("User not found")]
    UnknownUser,

    #[error("Incorrect password")]
    WrongPassword,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAITS (PORTS)
// ============================================================================

/// Credential store: the only owner of user rows.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AccountError>;

    /// True when either the username or the email is already taken.
    async fn exists(&self, username: &str, email: &str) -> Result<bool, AccountError>;

    /// Insert a new user. A uniqueness violation must surface as `DuplicateAccount`.
    async fn insert(&self, user: NewUser) -> Result<User, AccountError>;
}

/// Where live sessions are kept.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: Session) -> Result<(), AccountError>;

    async fn get(&self, token: &str) -> Result<Option<Session>, AccountError>;

    async fn remove(&self, token: &str) -> Result<(), AccountError>;

    /// Drop every session that expired before `now`. Returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AccountError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct AccountService<U: UserStore, S: SessionStore> {
    users: U,
    sessions: S,
    session_ttl: Duration,
}

impl<U: UserStore, S: SessionStore> AccountService<U, S> {
    pub fn new(users: U, sessions: S, session_ttl: Duration) -> Self {
        Self {
            users,
            sessions,
            session_ttl,
        }
    }

    /// Create a user from a registration form.
    pub async fn register(&self, form: &Registration) -> Result<User, AccountError> {
        let username = form.username.trim();
        let email = form.email.trim();

        if username.is_empty() || email.is_empty() || form.password.is_empty() {
            return Err(AccountError::Validation(
                "Username, email and password are required.".to_string(),
            ));
        }

        if form.password != form.confirm_password {
            return Err(AccountError::PasswordMismatch);
        }

        if self.users.exists(username, email).await? {
            return Err(AccountError::DuplicateAccount);
        }

        let password_hash = hash_password(&form.password)?;
        let user = self
            .users
            .insert(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check credentials and open a session.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AccountError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AccountError::Validation(
                "Username and password are required.".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(AccountError::UnknownUser)?;

        verify_password(password, &user.password_hash)?;

        let now = Utc::now();
        let session = Session {
            token: new_session_token(),
            username: user.username,
            created_at: now,
            expires_at: now + self.session_ttl,
        };
        self.sessions.insert(session.clone()).await?;

        tracing::info!(username = %session.username, "User logged in");
        Ok(session)
    }

    /// Resolve a cookie token to a live session. Expired sessions are removed.
    pub async fn current_session(&self, token: &str) -> Result<Option<Session>, AccountError> {
        let Some(session) = self.sessions.get(token).await? else {
            return Ok(None);
        };

        if session.is_expired(Utc::now()) {
            self.sessions.remove(token).await?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    pub async fn logout(&self, token: &str) -> Result<(), AccountError> {
        self.sessions.remove(token).await
    }

    /// Remove expired sessions (called periodically).
    pub async fn purge_expired_sessions(&self) -> Result<usize, AccountError> {
        self.sessions.purge_expired(Utc::now()).await
    }
}

fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountError::Hashing(e.to_string()))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<(), AccountError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AccountError::Hashing(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AccountError::WrongPassword)
}

/// 32 random bytes, URL-safe base64 so it can go straight into a cookie.
fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// In-memory stores for testing
    struct MockUserStore {
        users: DashMap<String, User>,
        next_id: AtomicI64,
    }

    impl MockUserStore {
        fn new() -> Self {
            Self {
                users: DashMap::new(),
                next_id: AtomicI64::new(1),
            }
        }
    }

    #[async_trait]
    impl UserStore for MockUserStore {
        async fn find_by_username(&self, username: &str) -> Result<Option<User>, AccountError> {
            Ok(self.users.get(username).map(|u| u.clone()))
        }

        async fn exists(&self, username: &str, email: &str) -> Result<bool, AccountError> {
            Ok(self
                .users
                .iter()
                .any(|u| u.username == username || u.email == email))
        }

        async fn insert(&self, user: NewUser) -> Result<User, AccountError> {
            let user = User {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
            };
            self.users.insert(user.username.clone(), user.clone());
            Ok(user)
        }
    }

    struct MockSessionStore {
        sessions: DashMap<String, Session>,
    }

    #[async_trait]
    impl SessionStore for MockSessionStore {
        async fn insert(&self, session: Session) -> Result<(), AccountError> {
            self.sessions.insert(session.token.clone(), session);
            Ok(())
        }

        async fn get(&self, token: &str) -> Result<Option<Session>, AccountError> {
            Ok(self.sessions.get(token).map(|s| s.clone()))
        }

        async fn remove(&self, token: &str) -> Result<(), AccountError> {
            self.sessions.remove(token);
            Ok(())
        }

        async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AccountError> {
            let before = self.sessions.len();
            self.sessions.retain(|_, s| !s.is_expired(now));
            Ok(before - self.sessions.len())
        }
    }

    fn make_service(ttl: Duration) -> AccountService<MockUserStore, MockSessionStore> {
        AccountService::new(
            MockUserStore::new(),
            MockSessionStore {
                sessions: DashMap::new(),
            },
            ttl,
        )
    }

    fn registration(username: &str, email: &str, password: &str) -> Registration {
        Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let service = make_service(Duration::hours(1));

        let user = service
            .register(&registration("alice", "a@x.com", "pw123"))
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "pw123");
        assert!(user.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_register_rejects_mismatched_confirmation() {
        let service = make_service(Duration::hours(1));
        let mut form = registration("alice", "a@x.com", "pw123");
        form.confirm_password = "pw124".to_string();

        let result = service.register(&form).await;

        assert!(matches!(result, Err(AccountError::PasswordMismatch)));
        assert!(service.users.users.is_empty());
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_username_or_email() {
        let service = make_service(Duration::hours(1));
        service
            .register(&registration("alice", "a@x.com", "pw123"))
            .await
            .unwrap();

        let same_name = service
            .register(&registration("alice", "other@x.com", "pw"))
            .await;
        let same_email = service
            .register(&registration("bob", "a@x.com", "pw"))
            .await;

        assert!(matches!(same_name, Err(AccountError::DuplicateAccount)));
        assert!(matches!(same_email, Err(AccountError::DuplicateAccount)));
        assert_eq!(service.users.users.len(), 1);
    }

    #[tokio::test]
    async fn test_register_requires_all_fields() {
        let service = make_service(Duration::hours(1));

        let result = service.register(&registration("  ", "a@x.com", "pw")).await;

        assert!(matches!(result, Err(AccountError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_opens_session() {
        let service = make_service(Duration::hours(1));
        service
            .register(&registration("alice", "a@x.com", "pw123"))
            .await
            .unwrap();

        let session = service.login("alice", "pw123").await.unwrap();
        let current = service.current_session(&session.token).await.unwrap();

        assert_eq!(current.map(|s| s.username), Some("alice".to_string()));
        assert!(session.token.len() >= 43);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let service = make_service(Duration::hours(1));
        service
            .register(&registration("alice", "a@x.com", "pw123"))
            .await
            .unwrap();

        assert!(matches!(
            service.login("alice", "wrong").await,
            Err(AccountError::WrongPassword)
        ));
        assert!(matches!(
            service.login("mallory", "pw123").await,
            Err(AccountError::UnknownUser)
        ));
        assert!(matches!(
            service.login("alice", "").await,
            Err(AccountError::Validation(_))
        ));
        assert!(service.sessions.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let service = make_service(Duration::hours(1));
        service
            .register(&registration("alice", "a@x.com", "pw123"))
            .await
            .unwrap();
        let session = service.login("alice", "pw123").await.unwrap();

        service.logout(&session.token).await.unwrap();

        assert_eq!(service.current_session(&session.token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_session_is_anonymous() {
        let service = make_service(Duration::zero());
        service
            .register(&registration("alice", "a@x.com", "pw123"))
            .await
            .unwrap();
        let session = service.login("alice", "pw123").await.unwrap();

        assert_eq!(service.current_session(&session.token).await.unwrap(), None);
        assert!(service.sessions.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_purge_expired_sessions() {
        let service = make_service(Duration::zero());
        service
            .register(&registration("alice", "a@x.com", "pw123"))
            .await
            .unwrap();
        service.login("alice", "pw123").await.unwrap();
        service.login("alice", "pw123").await.unwrap();

        assert_eq!(service.purge_expired_sessions().await.unwrap(), 2);
    }

    #[test]
    fn test_session_tokens_are_unique() {
        assert_ne!(new_session_token(), new_session_token());
    }
}
