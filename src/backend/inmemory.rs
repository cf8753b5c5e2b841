//! In-memory store backend (default, thread-safe, async).
//!
//! Stands in for memcached in tests and local development.
//! Uses DashMap for lock-free concurrent access with per-key sharding.
//! Expired items are dropped when they are next read.

use super::CacheBackend;
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Stored bytes with optional expiration.
struct StoredItem {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredItem {
    fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        // memcached treats a zero expiration as "never expires"
        let expires_at = ttl.filter(|d| !d.is_zero()).map(|d| Instant::now() + d);
        StoredItem { data, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() > exp)
    }
}

/// Thread-safe async in-memory store.
///
/// Clones share the same underlying map, mirroring how clones of a
/// `MemcachedBackend` share one connection pool.
///
/// # Example
///
/// ```no_run
/// use memcache_typed::backend::{CacheBackend, InMemoryBackend};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new();
///
///     backend.set("default#foo", b"bytes".to_vec(), Some(Duration::from_secs(60))).await?;
///     assert!(backend.get("default#foo").await?.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, StoredItem>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Number of stored items, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(item) = self.store.get(key) {
            if !item.is_expired() {
                debug!("✓ InMemory GET {} -> HIT", key);
                return Ok(Some(item.data.clone()));
            }
        }

        self.store.remove_if(key, |_, item| item.is_expired());
        debug!("✓ InMemory GET {} -> MISS", key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        self.store
            .insert(key.to_string(), StoredItem::new(value, ttl));

        if let Some(d) = ttl {
            debug!("✓ InMemory SET {} (TTL: {:?})", key, d);
        } else {
            debug!("✓ InMemory SET {}", key);
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        debug!("✓ InMemory DELETE {}", key);
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        self.store.clear();
        warn!("⚠ InMemory FLUSH_ALL executed - all entries cleared!");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inmemory_backend_set_get() {
        let backend = InMemoryBackend::new();

        backend
            .set("default#foo", b"bar".to_vec(), None)
            .await
            .expect("Failed to set");

        let result = backend.get("default#foo").await.expect("Failed to get");
        assert_eq!(result, Some(b"bar".to_vec()));
        assert!(backend.get("default#other").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn test_inmemory_backend_delete() {
        let backend = InMemoryBackend::new();

        backend
            .set("default#foo", b"bar".to_vec(), None)
            .await
            .expect("Failed to set");
        backend.delete("default#foo").await.expect("Failed to delete");

        assert!(backend.is_empty());
        // Deleting a missing key is not an error
        backend.delete("default#foo").await.expect("Failed to delete");
    }

    #[tokio::test]
    async fn test_inmemory_backend_ttl_expiration() {
        let backend = InMemoryBackend::new();

        backend
            .set("default#foo", b"bar".to_vec(), Some(Duration::from_millis(100)))
            .await
            .expect("Failed to set");
        assert!(backend.get("default#foo").await.expect("get").is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(backend.get("default#foo").await.expect("get").is_none());
        assert_eq!(backend.len(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_inmemory_backend_miss_does_not_drop_concurrent_set() {
        let backend = InMemoryBackend::new();

        for i in 0..200 {
            let key = format!("default#race{}", i);
            let reader = {
                let b = backend.clone();
                let key = key.clone();
                tokio::spawn(async move { b.get(&key).await.expect("get") })
            };
            let writer = {
                let b = backend.clone();
                let key = key.clone();
                tokio::spawn(async move { b.set(&key, vec![1], None).await.expect("set") })
            };

            reader.await.expect("Task failed");
            writer.await.expect("Task failed");

            assert!(
                backend.get(&key).await.expect("get").is_some(),
                "{} lost its value",
                key
            );
        }
    }

    #[tokio::test]
    async fn test_inmemory_backend_zero_ttl_never_expires() {
        let backend = InMemoryBackend::new();

        backend
            .set("default#foo", b"bar".to_vec(), Some(Duration::ZERO))
            .await
            .expect("Failed to set");
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(backend.get("default#foo").await.expect("get").is_some());
    }

    #[tokio::test]
    async fn test_inmemory_backend_clones_share_store() {
        let backend = InMemoryBackend::new();
        let other = backend.clone();

        backend
            .set("default#foo", b"bar".to_vec(), None)
            .await
            .expect("Failed to set");

        assert_eq!(other.len(), 1);
        other.clear_all().await.expect("Failed to clear");
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_inmemory_backend_thread_safe() {
        let backend = InMemoryBackend::new();
        let mut handles = vec![];

        for i in 0..10 {
            let b = backend.clone();
            handles.push(tokio::spawn(async move {
                b.set(&format!("default#{}", i), vec![i as u8], None)
                    .await
                    .expect("Failed to set");
            }));
        }

        for handle in handles {
            handle.await.expect("Task failed");
        }

        assert_eq!(backend.len(), 10);
    }
}
