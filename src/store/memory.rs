use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::KeyValueStore;
use crate::error::StoreError;

/// Longest time a `put` goes without sweeping expired entries.
const SWEEP_PERIOD: Duration = Duration::from_secs(60);
/// Map size that forces a sweep regardless of the period.
const MIN_SWEEP_AT: usize = 1024;
/// Longer TTLs are shortened to this so the expiry instant cannot overflow.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

struct Entry {
    value: String,
    expires_at: Instant,
}

struct Inner {
    entries: HashMap<String, Entry>,
    last_sweep: Instant,
    sweep_at: usize,
}

impl Inner {
    fn sweep_if_due(&mut self, now: Instant) {
        let overdue = now.duration_since(self.last_sweep) >= SWEEP_PERIOD;
        if !overdue && self.entries.len() < self.sweep_at {
            return;
        }

        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at > now);
        self.last_sweep = now;
        self.sweep_at = (self.entries.len() * 2).max(MIN_SWEEP_AT);

        let swept = before - self.entries.len();
        if swept > 0 {
            tracing::debug!(swept, held = self.entries.len(), "memory store sweep");
        }
    }
}

/// An in-process [`KeyValueStore`] used in local mode and tests.
///
/// A read evicts its own key once expired. Writes also sweep the whole map,
/// at least once per [`SWEEP_PERIOD`] or whenever it doubles since the last
/// sweep, so keys that are never read again do not pile up. The clock is
/// tokio's, so a paused test runtime can advance past a TTL.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
                sweep_at: MIN_SWEEP_AT,
            }),
        }
    }

    /// Number of entries that have not expired yet.
    pub async fn live_entries(&self) -> usize {
        let now = Instant::now();
        self.inner
            .read()
            .await
            .entries
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    /// Number of entries held in memory, expired or not.
    pub async fn held_entries(&self) -> usize {
        self.inner.read().await.entries.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let now = Instant::now();
        let entry = Entry {
            value: value.to_string(),
            expires_at: now + ttl.min(MAX_TTL),
        };

        let mut inner = self.inner.write().await;
        inner.sweep_if_due(now);
        inner.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        {
            let inner = self.inner.read().await;
            match inner.entries.get(key) {
                None => return Ok(None),
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        let mut inner = self.inner.write().await;
        if inner.entries.get(key).is_some_and(|e| e.expires_at <= now) {
            inner.entries.remove(key);
        }
        Ok(None)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.write().await.entries.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let removed = self.inner.write().await.entries.remove(key);
        Ok(removed.filter(|e| e.expires_at > now).map(|e| e.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get() {
        let store = MemoryStore::new();
        store.put("k", "v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemoryStore::new();
        store.put("k", "v", Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(store.get("k").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.live_entries().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_swept_on_put() {
        let store = MemoryStore::new();
        for i in 0..1000 {
            store
                .put(&format!("k{i}"), "v", Duration::from_secs(60))
                .await
                .unwrap();
        }
        assert_eq!(store.held_entries().await, 1000);

        tokio::time::advance(Duration::from_secs(3600)).await;
        store.put("fresh", "v", Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.live_entries().await, 1);
        assert_eq!(store.held_entries().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn growth_past_threshold_triggers_sweep() {
        let store = MemoryStore::new();
        for i in 0..MIN_SWEEP_AT {
            store
                .put(&format!("short{i}"), "v", Duration::from_secs(1))
                .await
                .unwrap();
        }

        // Still inside the sweep period, so only the size threshold applies.
        tokio::time::advance(Duration::from_secs(2)).await;
        store.put("long", "v", Duration::from_secs(600)).await.unwrap();

        assert_eq!(store.held_entries().await, 1);
    }

    #[tokio::test]
    async fn sweep_keeps_live_entries() {
        let store = MemoryStore::new();
        for i in 0..(MIN_SWEEP_AT + 10) {
            store
                .put(&format!("k{i}"), "v", Duration::from_secs(60))
                .await
                .unwrap();
        }
        assert_eq!(store.held_entries().await, MIN_SWEEP_AT + 10);
        assert_eq!(store.get("k0").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn huge_ttl_does_not_overflow() {
        let store = MemoryStore::new();
        store.put("k", "v", Duration::MAX).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        store.put("k", "v", Duration::from_secs(60)).await.unwrap();
        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn take_returns_value_once() {
        let store = MemoryStore::new();
        store.put("k", "v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.take("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.take("k").await.unwrap(), None);
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn take_ignores_expired_entry() {
        let store = MemoryStore::new();
        store.put("k", "v", Duration::from_secs(1)).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.take("k").await.unwrap(), None);
        assert_eq!(store.held_entries().await, 0);
    }
}
