//! Memcached store backend.

use super::CacheBackend;
use crate::error::{Error, Result};
use async_memcached::AsciiProtocol;
use deadpool_memcached::{Manager, Pool};
use std::time::Duration;

/// Default Memcached connection pool size.
/// Formula: (CPU cores × 2) + 1
/// For 8-core systems: 16 connections is optimal
/// Override with MEMCACHED_POOL_SIZE environment variable
const DEFAULT_POOL_SIZE: u32 = 16;

/// Default bound on acquiring a pooled connection.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(100);

/// Configuration for Memcached backend.
#[derive(Clone, Debug)]
pub struct MemcachedConfig {
    pub servers: Vec<String>, // e.g., ["localhost:11211", "cache2:11211"]
    pub connection_timeout: Duration,
    pub pool_size: u32,
}

impl Default for MemcachedConfig {
    fn default() -> Self {
        MemcachedConfig {
            servers: vec!["localhost:11211".to_string()],
            connection_timeout: DEFAULT_CONNECT_TIMEOUT,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl MemcachedConfig {
    /// Configuration for a comma- or whitespace-separated server list.
    ///
    /// ```
    /// # use memcache_typed::backend::MemcachedConfig;
    /// let config = MemcachedConfig::with_servers("cache1:11211, cache2:11211");
    /// assert_eq!(config.servers, vec!["cache1:11211", "cache2:11211"]);
    /// ```
    pub fn with_servers(addresses: &str) -> Self {
        MemcachedConfig {
            servers: parse_servers(addresses),
            ..Default::default()
        }
    }

    /// Load configuration from the environment.
    ///
    /// - `MEMCACHED_SERVERS`: server list (default `localhost:11211`)
    /// - `MEMCACHED_POOL_SIZE`: pool size (default 16)
    /// - `MEMCACHED_CONNECT_TIMEOUT_MS`: connection checkout timeout (default 100)
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if a variable is set but cannot be parsed
    pub fn from_env() -> Result<Self> {
        let mut config = MemcachedConfig::default();

        if let Ok(servers) = std::env::var("MEMCACHED_SERVERS") {
            config.servers = parse_servers(&servers);
        }
        if let Ok(size) = std::env::var("MEMCACHED_POOL_SIZE") {
            config.pool_size = size.trim().parse().map_err(|e| {
                Error::ConfigError(format!("Invalid MEMCACHED_POOL_SIZE {:?}: {}", size, e))
            })?;
        }
        if let Ok(millis) = std::env::var("MEMCACHED_CONNECT_TIMEOUT_MS") {
            let millis: u64 = millis.trim().parse().map_err(|e| {
                Error::ConfigError(format!(
                    "Invalid MEMCACHED_CONNECT_TIMEOUT_MS {:?}: {}",
                    millis, e
                ))
            })?;
            config.connection_timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }
}

fn parse_servers(addresses: &str) -> Vec<String> {
    addresses
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Memcached backend with connection pooling and async operations.
///
/// Clones share the pool, so one backend can serve every cache of an application.
///
/// # Example
///
/// ```no_run
/// # use memcache_typed::backend::{MemcachedBackend, MemcachedConfig, CacheBackend};
/// # use memcache_typed::error::Result;
/// # async fn example() -> Result<()> {
/// let backend = MemcachedBackend::new(MemcachedConfig::with_servers("localhost:11211")).await?;
/// backend.set("default#foo", b"value".to_vec(), None).await?;
/// let value = backend.get("default#foo").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MemcachedBackend {
    pool: Pool,
    timeout: Duration,
}

impl MemcachedBackend {
    /// Create new Memcached backend from configuration.
    ///
    /// # Errors
    /// Returns `Err` if no server is configured or pool creation fails
    pub async fn new(config: MemcachedConfig) -> Result<Self> {
        // deadpool-memcached Manager takes a single server address
        let addr = config
            .servers
            .first()
            .ok_or_else(|| Error::ConfigError("No memcached servers specified".to_string()))?
            .clone();

        if config.servers.len() > 1 {
            warn!(
                "Memcached backend uses only the first of {} configured servers ({})",
                config.servers.len(),
                addr
            );
        }

        let manager = Manager::new(addr.clone());

        let pool = Pool::builder(manager)
            .max_size(config.pool_size as usize)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to create connection pool: {}", e)))?;

        info!(
            "✓ Memcached backend initialized with server: {} (pool size: {}, timeout: {:?})",
            addr, config.pool_size, config.connection_timeout
        );

        Ok(MemcachedBackend {
            pool,
            timeout: config.connection_timeout,
        })
    }

    /// Create from server address directly, with pool size and timeout from the environment.
    ///
    /// # Errors
    /// Returns `Err` if the environment is invalid or pool creation fails
    pub async fn from_server(addr: String) -> Result<Self> {
        let config = MemcachedConfig {
            servers: vec![addr],
            ..MemcachedConfig::from_env()?
        };
        Self::new(config).await
    }
}

impl CacheBackend for MemcachedBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = tokio::time::timeout(self.timeout, self.pool.get())
            .await
            .map_err(|_| Error::Timeout(format!("Memcached connection for GET {}", key)))?
            .map_err(|e| {
                Error::BackendError(format!("Failed to get Memcached connection: {}", e))
            })?;

        match conn.get(key).await {
            Ok(Some(value)) => {
                debug!("✓ Memcached GET {} -> HIT", key);
                Ok(value.data)
            }
            Ok(None) => {
                debug!("✓ Memcached GET {} -> MISS", key);
                Ok(None)
            }
            Err(e) => Err(Error::BackendError(format!(
                "Memcached GET failed for key {}: {}",
                key, e
            ))),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let mut conn = tokio::time::timeout(self.timeout, self.pool.get())
            .await
            .map_err(|_| Error::Timeout(format!("Memcached connection for SET {}", key)))?
            .map_err(|e| {
                Error::BackendError(format!("Failed to get Memcached connection: {}", e))
            })?;

        // Values < 2592000 (30 days) are interpreted as seconds from now
        let expiration = ttl.map(|d| d.as_secs() as i64);

        conn.set(key, value.as_slice(), expiration, None)
            .await
            .map_err(|e| {
                Error::BackendError(format!("Memcached SET failed for key {}: {}", key, e))
            })?;

        if let Some(d) = ttl {
            debug!("✓ Memcached SET {} (TTL: {:?})", key, d);
        } else {
            debug!("✓ Memcached SET {}", key);
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = tokio::time::timeout(self.timeout, self.pool.get())
            .await
            .map_err(|_| Error::Timeout(format!("Memcached connection for DELETE {}", key)))?
            .map_err(|e| {
                Error::BackendError(format!("Failed to get Memcached connection: {}", e))
            })?;

        conn.delete(key).await.map_err(|e| {
            Error::BackendError(format!("Memcached DELETE failed for key {}: {}", key, e))
        })?;

        debug!("✓ Memcached DELETE {}", key);
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        let mut conn = tokio::time::timeout(self.timeout, self.pool.get())
            .await
            .map_err(|_| Error::Timeout("Memcached connection for FLUSH_ALL".to_string()))?
            .map_err(|e| {
                Error::BackendError(format!("Failed to get Memcached connection: {}", e))
            })?;

        conn.flush_all()
            .await
            .map_err(|e| Error::BackendError(format!("Memcached FLUSH_ALL failed: {}", e)))?;

        warn!("⚠ Memcached FLUSH_ALL executed - all cache cleared!");
        Ok(())
    }
}
