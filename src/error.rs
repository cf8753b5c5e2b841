//! Error types for the typed cache.

use std::fmt;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the typed cache.
///
/// Only a subset of these ever reaches callers of [`crate::Cache`]: transport
/// failures (`BackendError`, `Timeout`) are contained at the adapter boundary and
/// turned into misses or no-ops, while decode failures propagate.
#[derive(Debug, Clone)]
pub enum Error {
    /// Serialization failed when converting a value into an entry body.
    SerializationError(String),

    /// Deserialization failed when converting a stored entry back into a value.
    ///
    /// Common causes:
    /// - Entry body is not valid JSON for the registered type
    /// - Scalar body cannot be read as the registered scalar type
    /// - Truncated bytes read from the store
    ///
    /// **Recovery:** Evict the entry and recompute.
    DeserializationError(String),

    /// The stored type tag does not map to any registered type.
    ///
    /// Decoding fails closed: there is no fallback to a generic representation.
    /// Register the type with [`crate::TypeRegistry::register`] at startup.
    TypeResolutionError(String),

    /// Backend storage error (Memcached connection, protocol, etc).
    ///
    /// Common causes:
    /// - Memcached connection lost
    /// - Connection pool exhausted
    /// - Protocol error
    BackendError(String),

    /// Operation exceeded the configured timeout.
    Timeout(String),

    /// Configuration error during initialization.
    ///
    /// Common causes:
    /// - Empty server list
    /// - Unparsable pool size or timeout
    ConfigError(String),

    /// Operation not supported by the backend.
    NotImplemented(String),

    /// Stored bytes are not a cache entry written by this crate.
    ///
    /// Returned when the envelope magic is wrong.
    InvalidCacheEntry(String),

    /// Envelope version differs from [`crate::codec::CURRENT_ENVELOPE_VERSION`].
    VersionMismatch {
        /// Expected version (from compiled code)
        expected: u32,
        /// Found version (from stored entry)
        found: u32,
    },

    /// Generic error with custom message.
    Other(String),
}

impl Error {
    /// Whether this error comes from talking to the store rather than from its data.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::BackendError(_) | Error::Timeout(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::TypeResolutionError(tag) => write!(f, "Unknown type tag: {}", tag),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::Timeout(msg) => write!(f, "Timeout: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache entry version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}
