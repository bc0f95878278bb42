use std::sync::Arc;
use std::time::Duration;

use subtle::ConstantTimeEq;

use super::bounded;
use crate::context::UserId;
use crate::crypto::token::generate_token;
use crate::error::ManagerError;
use crate::models::session::CsrfRecord;
use crate::store::KeyValueStore;

/// Key prefix of CSRF token records.
pub const CSRF_KEY_PREFIX: &str = "csrf:";

fn csrf_key(token: &str) -> String {
    format!("{}{}", CSRF_KEY_PREFIX, token)
}

/// Whether a CSRF token survives a successful verification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CsrfPolicy {
    /// Valid until its TTL elapses.
    #[default]
    Reusable,
    /// Consumed by the first verification attempt, whatever its outcome.
    SingleUse,
}

/// Issues and validates per-user anti-forgery tokens.
#[derive(Clone)]
pub struct CsrfManager {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
    deadline: Duration,
    policy: CsrfPolicy,
}

impl CsrfManager {
    /// Creates a new `CsrfManager`.
    ///
    /// # Arguments
    ///
    /// * `store` - The store holding tokens, not shared with sessions.
    /// * `ttl` - How long a token lives.
    /// * `deadline` - The upper bound for each store call.
    /// * `policy` - Whether tokens are single-use.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        ttl: Duration,
        deadline: Duration,
        policy: CsrfPolicy,
    ) -> Self {
        Self {
            store,
            ttl,
            deadline,
            policy,
        }
    }

    /// Issues a token bound to `user_id`.
    pub async fn create(&self, user_id: &UserId) -> Result<String, ManagerError> {
        let token = generate_token();
        let record_json = sonic_rs::to_string(&CsrfRecord::new(user_id.clone(), self.ttl))
            .map_err(|e| {
                ManagerError::StoreUnavailable(format!("CSRF serialization failed: {}", e))
            })?;

        bounded(
            self.deadline,
            self.store.put(&csrf_key(&token), &record_json, self.ttl),
        )
        .await?;

        tracing::debug!("🔐 Issued CSRF token for user: {}", user_id);
        Ok(token)
    }

    /// Resolves a token to the user it was issued to.
    pub async fn check(&self, token: &str) -> Result<UserId, ManagerError> {
        if token.is_empty() {
            return Err(ManagerError::TokenNotFound);
        }

        let record_json = bounded(self.deadline, self.store.get(&csrf_key(token))).await?;
        decode(record_json)
    }

    /// Requires `token` to be bound to `expected`, the caller's session identity.
    ///
    /// Under [`CsrfPolicy::SingleUse`] the record is read and removed in one
    /// store call, so concurrent requests carrying the same token cannot both
    /// pass.
    pub async fn verify(&self, token: &str, expected: &UserId) -> Result<(), ManagerError> {
        let bound = match self.policy {
            CsrfPolicy::Reusable => self.check(token).await?,
            CsrfPolicy::SingleUse => {
                if token.is_empty() {
                    return Err(ManagerError::TokenNotFound);
                }
                let record_json =
                    bounded(self.deadline, self.store.take(&csrf_key(token))).await?;
                decode(record_json)?
            }
        };

        let same_user: bool = bound
            .as_str()
            .as_bytes()
            .ct_eq(expected.as_str().as_bytes())
            .into();
        if !same_user {
            tracing::warn!("❌ CSRF: token of user {} presented by user {}", bound, expected);
            return Err(ManagerError::TokenMismatch);
        }

        Ok(())
    }

    /// Removes a token. Revoking an absent token succeeds.
    pub async fn revoke(&self, token: &str) -> Result<(), ManagerError> {
        bounded(self.deadline, self.store.delete(&csrf_key(token))).await
    }
}

fn decode(record_json: Option<String>) -> Result<UserId, ManagerError> {
    let record_json = record_json.ok_or(ManagerError::TokenNotFound)?;

    let record: CsrfRecord = sonic_rs::from_str(&record_json).map_err(|e| {
        tracing::warn!("❌ CSRF: invalid token record: {}", e);
        ManagerError::TokenNotFound
    })?;

    if record.is_expired() {
        return Err(ManagerError::TokenNotFound);
    }

    Ok(record.user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managers::test_stores::DownStore;
    use crate::store::MemoryStore;

    const HOUR: Duration = Duration::from_secs(3600);
    const DEADLINE: Duration = Duration::from_secs(1);

    fn manager(policy: CsrfPolicy) -> CsrfManager {
        CsrfManager::new(Arc::new(MemoryStore::new()), HOUR, DEADLINE, policy)
    }

    #[tokio::test]
    async fn check_returns_bound_user() {
        let csrf = manager(CsrfPolicy::Reusable);
        let token = csrf.create(&UserId::from("42")).await.unwrap();

        assert_eq!(csrf.check(&token).await.unwrap(), UserId::from("42"));
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let csrf = manager(CsrfPolicy::Reusable);

        assert!(matches!(csrf.check("wrong").await, Err(ManagerError::TokenNotFound)));
        assert!(matches!(csrf.check("").await, Err(ManagerError::TokenNotFound)));
    }

    #[tokio::test(start_paused = true)]
    async fn token_expires_with_ttl() {
        let csrf = manager(CsrfPolicy::Reusable);
        let token = csrf.create(&UserId::from("42")).await.unwrap();

        tokio::time::advance(HOUR + Duration::from_secs(1)).await;

        assert!(matches!(csrf.check(&token).await, Err(ManagerError::TokenNotFound)));
    }

    #[tokio::test]
    async fn verify_rejects_other_users_token() {
        let csrf = manager(CsrfPolicy::Reusable);
        let token = csrf.create(&UserId::from("42")).await.unwrap();

        assert!(matches!(
            csrf.verify(&token, &UserId::from("43")).await,
            Err(ManagerError::TokenMismatch)
        ));
    }

    #[tokio::test]
    async fn reusable_token_survives_verification() {
        let csrf = manager(CsrfPolicy::Reusable);
        let user = UserId::from("42");
        let token = csrf.create(&user).await.unwrap();

        csrf.verify(&token, &user).await.unwrap();
        csrf.verify(&token, &user).await.unwrap();
    }

    #[tokio::test]
    async fn single_use_token_is_revoked_after_verification() {
        let csrf = manager(CsrfPolicy::SingleUse);
        let user = UserId::from("42");
        let token = csrf.create(&user).await.unwrap();

        csrf.verify(&token, &user).await.unwrap();

        assert!(matches!(
            csrf.verify(&token, &user).await,
            Err(ManagerError::TokenNotFound)
        ));
    }

    #[tokio::test]
    async fn single_use_token_passes_only_one_concurrent_verification() {
        let csrf = manager(CsrfPolicy::SingleUse);
        let user = UserId::from("42");
        let token = csrf.create(&user).await.unwrap();

        let (first, second) =
            tokio::join!(csrf.verify(&token, &user), csrf.verify(&token, &user));

        assert_ne!(first.is_ok(), second.is_ok());
        assert!(matches!(first.and(second), Err(ManagerError::TokenNotFound)));
    }

    #[tokio::test]
    async fn single_use_token_is_consumed_by_mismatched_attempt() {
        let csrf = manager(CsrfPolicy::SingleUse);
        let token = csrf.create(&UserId::from("42")).await.unwrap();

        assert!(matches!(
            csrf.verify(&token, &UserId::from("43")).await,
            Err(ManagerError::TokenMismatch)
        ));
        assert!(matches!(csrf.check(&token).await, Err(ManagerError::TokenNotFound)));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_tokens_do_not_accumulate_in_memory() {
        let store = Arc::new(MemoryStore::new());
        let csrf = CsrfManager::new(
            store.clone(),
            Duration::from_secs(60),
            DEADLINE,
            CsrfPolicy::Reusable,
        );
        let user = UserId::from("42");
        for _ in 0..1000 {
            csrf.create(&user).await.unwrap();
        }

        tokio::time::advance(HOUR).await;
        csrf.create(&user).await.unwrap();

        assert_eq!(store.live_entries().await, 1);
        assert_eq!(store.held_entries().await, 1);
    }

    #[tokio::test]
    async fn revoked_token_is_not_found() {
        let csrf = manager(CsrfPolicy::Reusable);
        let token = csrf.create(&UserId::from("42")).await.unwrap();

        csrf.revoke(&token).await.unwrap();
        csrf.revoke(&token).await.unwrap();

        assert!(matches!(csrf.check(&token).await, Err(ManagerError::TokenNotFound)));
    }

    #[tokio::test]
    async fn tokens_and_sessions_do_not_share_a_keyspace() {
        let shared = Arc::new(MemoryStore::new());
        let csrf = CsrfManager::new(shared.clone(), HOUR, DEADLINE, CsrfPolicy::Reusable);
        let sessions = crate::managers::SessionManager::new(shared, HOUR, DEADLINE);

        let session_id = sessions.create(&UserId::from("42")).await.unwrap();
        let token = csrf.create(&UserId::from("42")).await.unwrap();

        assert!(matches!(csrf.check(&session_id).await, Err(ManagerError::TokenNotFound)));
        assert!(matches!(
            sessions.check(&token).await,
            Err(ManagerError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn store_failure_is_unavailable() {
        let csrf = CsrfManager::new(Arc::new(DownStore), HOUR, DEADLINE, CsrfPolicy::Reusable);

        assert!(matches!(
            csrf.check("t1").await,
            Err(ManagerError::StoreUnavailable(_))
        ));
    }
}
