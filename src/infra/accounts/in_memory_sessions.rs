// In-memory implementation of SessionStore.
//
// Sessions live only as long as the process, so a restart logs everyone out.

use crate::core::accounts::{AccountError, Session, SessionStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Maps session token -> session.
pub struct InMemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: Session) -> Result<(), AccountError> {
        self.sessions.insert(session.token.clone(), session);
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<Session>, AccountError> {
        Ok(self.sessions.get(token).map(|entry| entry.clone()))
    }

    async fn remove(&self, token: &str) -> Result<(), AccountError> {
        self.sessions.remove(token);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AccountError> {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(now));
        Ok(before.saturating_sub(self.sessions.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(token: &str, expires_in: Duration) -> Session {
        let now = Utc::now();
        Session {
            token: token.to_string(),
            username: "alice".to_string(),
            created_at: now,
            expires_at: now + expires_in,
        }
    }

    #[tokio::test]
    async fn test_insert_get_remove() {
        let store = InMemorySessionStore::new();
        store.insert(session("t1", Duration::hours(1))).await.unwrap();

        assert_eq!(
            store.get("t1").await.unwrap().map(|s| s.username),
            Some("alice".to_string())
        );

        store.remove("t1").await.unwrap();
        assert_eq!(store.get("t1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_purge_only_drops_expired() {
        let store = InMemorySessionStore::new();
        store.insert(session("old", Duration::hours(-1))).await.unwrap();
        store.insert(session("live", Duration::hours(1))).await.unwrap();

        let removed = store.purge_expired(Utc::now()).await.unwrap();

        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("live").await.unwrap().is_some());
    }
}
