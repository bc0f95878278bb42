//! Key-value stores with per-key expiry.
//!
//! Sessions and CSRF tokens each get their own [`KeyValueStore`] instance so
//! the two keyspaces stay independent failure domains.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

pub mod memory;
pub mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// A durable key→value mapping that evicts entries after their TTL.
///
/// Implementations must make each call atomic per key. A key whose TTL has
/// elapsed is indistinguishable from one that was never written.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Reads the value under `key`, `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Removes `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Reads and removes `key` in one atomic step. Of several concurrent
    /// callers at most one sees the value.
    async fn take(&self, key: &str) -> Result<Option<String>, StoreError>;
}
