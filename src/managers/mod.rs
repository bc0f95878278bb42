//! Session and CSRF token lifecycles on top of the key-value stores.

use std::future::Future;
use std::time::Duration;

use crate::error::{ManagerError, StoreError};

pub mod csrf;
pub mod session;

pub use csrf::{CsrfManager, CsrfPolicy};
pub use session::SessionManager;

/// Runs a store call, failing with `StoreUnavailable` once `deadline` passes.
async fn bounded<T>(
    deadline: Duration,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, ManagerError> {
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result.map_err(ManagerError::from),
        Err(_) => {
            tracing::error!("❌ Store call exceeded deadline of {:?}", deadline);
            Err(ManagerError::StoreUnavailable("store call timed out".to_string()))
        }
    }
}

#[cfg(test)]
pub(crate) mod test_stores {
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::error::StoreError;
    use crate::store::KeyValueStore;

    /// Fails every call as if the server were down.
    pub struct DownStore;

    #[async_trait]
    impl KeyValueStore for DownStore {
        async fn put(&self, _: &str, _: &str, _: Duration) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn get(&self, _: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn delete(&self, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn take(&self, _: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    /// Never answers.
    pub struct HungStore;

    #[async_trait]
    impl KeyValueStore for HungStore {
        async fn put(&self, _: &str, _: &str, _: Duration) -> Result<(), StoreError> {
            std::future::pending().await
        }

        async fn get(&self, _: &str) -> Result<Option<String>, StoreError> {
            std::future::pending().await
        }

        async fn delete(&self, _: &str) -> Result<(), StoreError> {
            std::future::pending().await
        }

        async fn take(&self, _: &str) -> Result<Option<String>, StoreError> {
            std::future::pending().await
        }
    }
}
