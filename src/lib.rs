//! # memcache-typed
//!
//! Typed values in memcached: every value is stored with a type tag so it can be
//! reconstructed on read, behind a small cache interface that keeps an
//! unavailable store from ever breaking the caller.
//!
//! ## Features
//!
//! - **Typed entries:** values are stored as `{type_tag, body}` and decoded through
//!   an explicit [`TypeRegistry`]; unknown tags fail closed
//! - **Namespaced caches:** keys are stored as `"{cache_name}#{key}"`
//! - **Failure containment:** store outages degrade to cache misses; only corrupt
//!   or unresolvable data is reported as an error
//! - **Compute-if-absent:** [`Cache::get_or_load`] fills the cache from a loader
//! - **Backends:** memcached (feature `memcached`) and in-memory (feature `inmemory`)
//!
//! ## Quick Start
//!
//! ```ignore
//! use memcache_typed::{
//!     backend::{MemcachedBackend, MemcachedConfig},
//!     CacheManager, Cacheable, TypeRegistry,
//! };
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//!
//! // 1. Define your value type
//! #[derive(Clone, Serialize, Deserialize)]
//! struct User {
//!     id: String,
//!     name: String,
//! }
//!
//! // 2. Give it a type tag
//! impl Cacheable for User {
//!     fn type_tag() -> &'static str { "user" }
//! }
//!
//! // 3. Register it and build caches over one memcached pool
//! let backend = MemcachedBackend::new(MemcachedConfig::from_env()?).await?;
//! let registry = Arc::new(TypeRegistry::with_defaults().with::<User>());
//! let manager = CacheManager::new(backend).with_registry(registry);
//!
//! // 4. Use it
//! let users = manager.cache("users");
//! let user = users
//!     .get_or_load("user_1", || load_user("user_1"))
//!     .await?;
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod cache;
pub mod codec;
pub mod error;
pub mod health;
pub mod key;
pub mod manager;
pub mod observability;
pub mod registry;
pub mod value;

// Re-exports for convenience
pub use backend::CacheBackend;
pub use cache::Cache;
pub use codec::CacheEntry;
pub use error::{Error, Result};
pub use health::{Health, HealthProbe, HealthStatus};
pub use manager::CacheManager;
pub use registry::TypeRegistry;
pub use value::{CacheValue, Cacheable, TypeKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
