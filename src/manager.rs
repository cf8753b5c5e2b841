//! Named caches over one shared store.
//!
//! Provides a convenient way to hand out [`Cache`] instances that share a
//! backend, a type registry and a metrics sink.

use crate::backend::CacheBackend;
use crate::cache::Cache;
use crate::health::HealthProbe;
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::registry::TypeRegistry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// TTL for caches without an explicit one: one day.
pub const DEFAULT_TTL: Duration = Duration::from_secs(86400);

/// Factory and registry of named caches.
///
/// Configure it once with the `with_*` methods, then clone it freely: clones
/// share the same set of created caches.
///
/// # Example
///
/// ```
/// use memcache_typed::{backend::InMemoryBackend, CacheManager};
/// use std::time::Duration;
///
/// let manager = CacheManager::new(InMemoryBackend::new())
///     .with_ttl("sessions", Duration::from_secs(1800));
///
/// let sessions = manager.cache("sessions");
/// assert_eq!(sessions.ttl(), Duration::from_secs(1800));
/// assert_eq!(manager.cache("users").ttl(), Duration::from_secs(86400));
/// ```
#[derive(Clone)]
pub struct CacheManager<B: CacheBackend> {
    backend: B,
    registry: Arc<TypeRegistry>,
    metrics: Arc<dyn CacheMetrics>,
    default_ttl: Duration,
    ttls: HashMap<String, Duration>,
    caches: Arc<DashMap<String, Cache<B>>>,
}

impl<B: CacheBackend> CacheManager<B> {
    /// Create a manager with the built-in type registry and a one-day TTL.
    pub fn new(backend: B) -> Self {
        CacheManager {
            backend,
            registry: Arc::new(TypeRegistry::with_defaults()),
            metrics: Arc::new(NoOpMetrics),
            default_ttl: DEFAULT_TTL,
            ttls: HashMap::new(),
            caches: Arc::new(DashMap::new()),
        }
    }

    pub fn with_registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// TTL for caches without their own.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// TTL for one named cache.
    pub fn with_ttl(mut self, name: impl Into<String>, ttl: Duration) -> Self {
        self.ttls.insert(name.into(), ttl);
        self
    }

    /// Get the cache called `name`, creating it on first use.
    pub fn cache(&self, name: &str) -> Cache<B> {
        if let Some(cache) = self.caches.get(name) {
            return cache.value().clone();
        }

        self.caches
            .entry(name.to_string())
            .or_insert_with(|| {
                let ttl = self.ttls.get(name).copied().unwrap_or(self.default_ttl);
                debug!("Creating Cache#{} (TTL: {:?})", name, ttl);
                Cache::new(name, ttl, self.backend.clone())
                    .with_registry(Arc::clone(&self.registry))
                    .with_metrics(Arc::clone(&self.metrics))
            })
            .value()
            .clone()
    }

    /// Names of the caches created so far, sorted.
    pub fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.iter().map(|c| c.key().clone()).collect();
        names.sort();
        names
    }

    /// Health probe over the shared backend.
    pub fn health_probe(&self) -> HealthProbe<B> {
        HealthProbe::new(self.backend.clone())
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
