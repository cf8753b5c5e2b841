//! Cache key management utilities.

use std::fmt::Display;

/// Separator between a cache name and the caller's key.
pub const NAMESPACE_SEPARATOR: char = '#';

/// Builder for store keys.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Build the store key for a caller key in a named cache.
    ///
    /// Format: `"{cache_name}#{key}"`.
    pub fn namespaced<K: Display + ?Sized>(cache_name: &str, key: &K) -> String {
        format!("{}{}{}", cache_name, NAMESPACE_SEPARATOR, key)
    }
}
