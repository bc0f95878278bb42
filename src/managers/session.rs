use std::sync::Arc;
use std::time::Duration;

use super::bounded;
use crate::context::UserId;
use crate::crypto::token::generate_token;
use crate::error::ManagerError;
use crate::models::session::SessionRecord;
use crate::store::KeyValueStore;

/// Key prefix of session records.
pub const SESSION_KEY_PREFIX: &str = "session:";

fn session_key(session_id: &str) -> String {
    format!("{}{}", SESSION_KEY_PREFIX, session_id)
}

/// Creates, validates and revokes sessions.
///
/// A session is either present (valid) or absent (expired or deleted); there
/// is no refresh. A new login produces a new record with a new id.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
    deadline: Duration,
}

impl SessionManager {
    /// Creates a new `SessionManager`.
    ///
    /// # Arguments
    ///
    /// * `store` - The store holding session records, not shared with CSRF tokens.
    /// * `ttl` - How long a session lives.
    /// * `deadline` - The upper bound for each store call.
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration, deadline: Duration) -> Self {
        Self {
            store,
            ttl,
            deadline,
        }
    }

    /// How long a new session lives.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Starts a session for `user_id` and returns its id.
    pub async fn create(&self, user_id: &UserId) -> Result<String, ManagerError> {
        let session_id = generate_token();
        let record = SessionRecord::new(user_id.clone(), self.ttl);
        let record_json = sonic_rs::to_string(&record).map_err(|e| {
            ManagerError::StoreUnavailable(format!("Session serialization failed: {}", e))
        })?;

        bounded(
            self.deadline,
            self.store.put(&session_key(&session_id), &record_json, self.ttl),
        )
        .await?;

        tracing::info!("✅ Session created for user: {}", user_id);
        Ok(session_id)
    }

    /// Resolves a session id to the user it authenticates.
    ///
    /// Does not extend the session.
    pub async fn check(&self, session_id: &str) -> Result<UserId, ManagerError> {
        if session_id.is_empty() {
            return Err(ManagerError::SessionNotFound);
        }

        let record_json = bounded(self.deadline, self.store.get(&session_key(session_id)))
            .await?
            .ok_or(ManagerError::SessionNotFound)?;

        let record: SessionRecord = sonic_rs::from_str(&record_json).map_err(|e| {
            tracing::warn!("❌ Invalid session JSON: {}", e);
            ManagerError::SessionNotFound
        })?;

        if record.is_expired() {
            tracing::debug!("Session expired for user: {}", record.user_id);
            self.delete(session_id).await.ok();
            return Err(ManagerError::SessionNotFound);
        }

        Ok(record.user_id)
    }

    /// Removes a session. Deleting an absent session succeeds.
    pub async fn delete(&self, session_id: &str) -> Result<(), ManagerError> {
        bounded(self.deadline, self.store.delete(&session_key(session_id))).await?;
        tracing::debug!("Session deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managers::test_stores::{DownStore, HungStore};
    use crate::store::MemoryStore;

    const DAY: Duration = Duration::from_secs(24 * 3600);
    const DEADLINE: Duration = Duration::from_secs(1);

    fn manager() -> SessionManager {
        SessionManager::new(Arc::new(MemoryStore::new()), DAY, DEADLINE)
    }

    #[tokio::test]
    async fn create_then_check_returns_user() {
        let sessions = manager();
        let user = UserId::from("42");

        let session_id = sessions.create(&user).await.unwrap();

        assert_eq!(sessions.check(&session_id).await.unwrap(), user);
    }

    #[tokio::test]
    async fn every_session_gets_a_fresh_id() {
        let sessions = manager();
        let user = UserId::from("42");

        let first = sessions.create(&user).await.unwrap();
        let second = sessions.create(&user).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(sessions.check(&first).await.unwrap(), user);
        assert_eq!(sessions.check(&second).await.unwrap(), user);
    }

    #[tokio::test]
    async fn check_after_delete_is_not_found() {
        let sessions = manager();
        let session_id = sessions.create(&UserId::from("7")).await.unwrap();

        sessions.delete(&session_id).await.unwrap();
        sessions.delete(&session_id).await.unwrap();

        assert!(matches!(
            sessions.check(&session_id).await,
            Err(ManagerError::SessionNotFound)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn check_after_ttl_is_not_found() {
        let sessions = manager();
        let session_id = sessions.create(&UserId::from("7")).await.unwrap();

        tokio::time::advance(DAY + Duration::from_secs(1)).await;

        assert!(matches!(
            sessions.check(&session_id).await,
            Err(ManagerError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn unknown_and_empty_ids_are_not_found() {
        let sessions = manager();
        assert!(matches!(sessions.check("nope").await, Err(ManagerError::SessionNotFound)));
        assert!(matches!(sessions.check("").await, Err(ManagerError::SessionNotFound)));
    }

    #[tokio::test]
    async fn garbage_record_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        store.put("session:bad", "not json", DAY).await.unwrap();
        let sessions = SessionManager::new(store, DAY, DEADLINE);

        assert!(matches!(sessions.check("bad").await, Err(ManagerError::SessionNotFound)));
    }

    #[tokio::test]
    async fn store_failure_is_unavailable() {
        let sessions = SessionManager::new(Arc::new(DownStore), DAY, DEADLINE);

        assert!(matches!(
            sessions.create(&UserId::from("1")).await,
            Err(ManagerError::StoreUnavailable(_))
        ));
        assert!(matches!(
            sessions.check("abc").await,
            Err(ManagerError::StoreUnavailable(_))
        ));
        assert!(matches!(
            sessions.delete("abc").await,
            Err(ManagerError::StoreUnavailable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_store_hits_deadline() {
        let sessions = SessionManager::new(Arc::new(HungStore), DAY, DEADLINE);

        assert!(matches!(
            sessions.check("abc").await,
            Err(ManagerError::StoreUnavailable(_))
        ));
    }
}
