//! Named cache over a shared store - the main entry point for cache operations.
//!
//! Error containment is asymmetric:
//!
//! | Failure | What the caller sees |
//! |---------|----------------------|
//! | Store unavailable / protocol error / timeout | `Ok(None)` on reads, `Ok(())` on writes, logged |
//! | Backend failure that is not a transport error (e.g. `NotImplemented`) | `Err(..)` on reads |
//! | Stored entry undecodable (unknown tag, bad body, bad frame) | `Err(..)` |
//! | Loader passed to [`Cache::get_or_load`] fails | `Ok(None)`, logged |

use crate::backend::CacheBackend;
use crate::codec;
use crate::error::{Error, Result};
use crate::key::CacheKeyBuilder;
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::registry::TypeRegistry;
use crate::value::{CacheValue, Cacheable};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of a store read before it is collapsed for the caller.
enum Lookup {
    Hit(CacheValue),
    Miss,
    TransportError(Error),
}

/// A named cache storing typed values in a shared store.
///
/// Every key is namespaced as `"{name}#{key}"` and every write carries the
/// cache's TTL. The cache holds no mutable state of its own, so it can be
/// cloned and shared freely; concurrency guarantees are the backend's.
///
/// # Example
///
/// ```
/// use memcache_typed::{backend::InMemoryBackend, Cache};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> memcache_typed::Result<()> {
/// let cache = Cache::new("default", Duration::from_secs(86400), InMemoryBackend::new());
///
/// cache.put("foo", &"bar".to_string()).await?;
/// assert_eq!(cache.get_as::<String, _>("foo").await?, Some("bar".to_string()));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Cache<B: CacheBackend> {
    name: String,
    ttl: Duration,
    backend: B,
    registry: Arc<TypeRegistry>,
    metrics: Arc<dyn CacheMetrics>,
}

impl<B: CacheBackend> Cache<B> {
    /// Create a cache using the built-in type registry.
    pub fn new(name: impl Into<String>, ttl: Duration, backend: B) -> Self {
        Cache {
            name: name.into(),
            ttl,
            backend,
            registry: Arc::new(TypeRegistry::with_defaults()),
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Use a registry that knows the application's own types.
    pub fn with_registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Arc<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The underlying store handle, shared with every other cache built on it.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn namespaced<K: Display + ?Sized>(&self, key: &K) -> String {
        CacheKeyBuilder::namespaced(&self.name, key)
    }

    async fn lookup(&self, store_key: &str) -> Result<Lookup> {
        let bytes = match self.backend.get(store_key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(Lookup::Miss),
            Err(e) if e.is_transport() => return Ok(Lookup::TransportError(e)),
            Err(e) => return Err(e),
        };

        let entry = codec::from_bytes(&bytes)?;
        Ok(match codec::decode(Some(&entry), &self.registry)? {
            Some(value) => Lookup::Hit(value),
            None => Lookup::Miss,
        })
    }

    /// Read the value stored under `key`.
    ///
    /// # Returns
    /// - `Ok(Some(value))` - Entry found and decoded
    /// - `Ok(None)` - No entry, or the store could not be reached
    ///
    /// # Errors
    ///
    /// Transport failures (`BackendError`, `Timeout`) never surface. Other
    /// backend errors are returned as is, and so are decode failures:
    /// - `Error::TypeResolutionError`: Stored tag is not in the registry
    /// - `Error::DeserializationError`: Stored body or frame is corrupted
    /// - `Error::InvalidCacheEntry` / `Error::VersionMismatch`: Foreign or outdated entry
    pub async fn get<K: Display + ?Sized>(&self, key: &K) -> Result<Option<CacheValue>> {
        let store_key = self.namespaced(key);
        let timer = Instant::now();

        match self.lookup(&store_key).await {
            Ok(Lookup::Hit(value)) => {
                self.metrics.record_hit(&store_key, timer.elapsed());
                Ok(Some(value))
            }
            Ok(Lookup::Miss) => {
                self.metrics.record_miss(&store_key, timer.elapsed());
                Ok(None)
            }
            Ok(Lookup::TransportError(e)) => {
                error!("Unable to resolve {} from Cache#{}: {}", store_key, self.name, e);
                self.metrics.record_error(&store_key, &e.to_string());
                self.metrics.record_miss(&store_key, timer.elapsed());
                Ok(None)
            }
            Err(e) => {
                self.metrics.record_error(&store_key, &e.to_string());
                Err(e)
            }
        }
    }

    /// Read the value stored under `key` if it is a `T`.
    ///
    /// A stored value of another type yields `Ok(None)`, not an error.
    ///
    /// # Errors
    /// Same as [`Cache::get`]
    pub async fn get_as<T, K>(&self, key: &K) -> Result<Option<T>>
    where
        T: Cacheable,
        K: Display + ?Sized,
    {
        Ok(self.get(key).await?.and_then(|value| {
            let typed = value.downcast::<T>();
            if typed.is_none() {
                debug!(
                    "Cache#{} entry {} is a '{}', not a '{}'",
                    self.name,
                    key,
                    value.type_tag(),
                    T::type_tag()
                );
            }
            typed
        }))
    }

    /// Read `key`, computing and storing it with `loader` on a miss.
    ///
    /// - Hit of type `T`: returned, loader not called.
    /// - Miss (or a stored value of another type): loader is awaited once.
    ///   `Ok(Some(v))` is stored and returned, `Ok(None)` is returned without
    ///   storing, and `Err(_)` is logged and turned into `Ok(None)`.
    ///
    /// There is no stampede protection: concurrent callers that miss at the same
    /// time each run their loader and each write, and the last write wins.
    ///
    /// # Errors
    /// Same as [`Cache::get`]; loader and store failures never surface
    pub async fn get_or_load<T, K, F, Fut, E>(&self, key: &K, loader: F) -> Result<Option<T>>
    where
        T: Cacheable,
        K: Display + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Option<T>, E>>,
        E: Display,
    {
        if let Some(value) = self.get(key).await? {
            match value.downcast::<T>() {
                Some(typed) => return Ok(Some(typed)),
                None => debug!(
                    "Cache#{} entry {} is a '{}', reloading as '{}'",
                    self.name,
                    key,
                    value.type_tag(),
                    T::type_tag()
                ),
            }
        }

        match loader().await {
            Ok(Some(loaded)) => {
                if let Err(e) = self.put(key, &loaded).await {
                    warn!("Unable to cache loaded {} in Cache#{}: {}", key, self.name, e);
                }
                Ok(Some(loaded))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!("Loader for {} in Cache#{} failed: {}", key, self.name, e);
                Ok(None)
            }
        }
    }

    /// Store `value` under `key` with the cache's TTL.
    ///
    /// Store failures are logged and swallowed.
    ///
    /// # Errors
    /// Returns `Error::SerializationError` if the value cannot be encoded
    pub async fn put<T, K>(&self, key: &K, value: &T) -> Result<()>
    where
        T: Cacheable,
        K: Display + ?Sized,
    {
        self.put_optional(key, Some(value)).await
    }

    /// Store an optional value. `None` stores nothing and makes no store call.
    ///
    /// # Errors
    /// Returns `Error::SerializationError` if the value cannot be encoded
    pub async fn put_optional<T, K>(&self, key: &K, value: Option<&T>) -> Result<()>
    where
        T: Cacheable,
        K: Display + ?Sized,
    {
        let store_key = self.namespaced(key);
        let Some(entry) = codec::encode(value)? else {
            debug!("Nothing to store for {} in Cache#{}", store_key, self.name);
            return Ok(());
        };
        let bytes = codec::to_bytes(&entry)?;

        let timer = Instant::now();
        match self.backend.set(&store_key, bytes, Some(self.ttl)).await {
            Ok(()) => self.metrics.record_set(&store_key, timer.elapsed()),
            Err(e) => {
                error!("Unable to put {} into Cache#{}: {}", store_key, self.name, e);
                self.metrics.record_error(&store_key, &e.to_string());
            }
        }

        Ok(())
    }

    /// Store `value` unless `key` already holds a value.
    ///
    /// # Returns
    /// - `Ok(Some(existing))` - A value was already cached; nothing was written
    /// - `Ok(None)` - No value was cached; `value` was stored
    ///
    /// # Errors
    /// Same as [`Cache::get`] and [`Cache::put`]
    pub async fn put_if_absent<T, K>(&self, key: &K, value: &T) -> Result<Option<CacheValue>>
    where
        T: Cacheable,
        K: Display + ?Sized,
    {
        if let Some(existing) = self.get(key).await? {
            return Ok(Some(existing));
        }

        self.put(key, value).await?;
        Ok(None)
    }

    /// Remove the entry stored under `key`. Store failures are logged and swallowed.
    pub async fn evict<K: Display + ?Sized>(&self, key: &K) {
        let store_key = self.namespaced(key);
        let timer = Instant::now();

        match self.backend.delete(&store_key).await {
            Ok(()) => self.metrics.record_delete(&store_key, timer.elapsed()),
            Err(e) => {
                error!("Unable to delete {} from Cache#{}: {}", store_key, self.name, e);
                self.metrics.record_error(&store_key, &e.to_string());
            }
        }
    }

    /// Flush the whole store.
    ///
    /// This is not scoped to this cache's name: every cache sharing the
    /// backend loses its entries too. Store failures are logged and swallowed.
    pub async fn clear(&self) {
        warn!("Cache#{} flushing the entire store", self.name);

        if let Err(e) = self.backend.clear_all().await {
            error!("Unable to flush from Cache#{}: {}", self.name, e);
            self.metrics.record_error(&self.name, &e.to_string());
        }
    }
}
