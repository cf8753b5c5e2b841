//! Registry mapping stored type tags to decode functions.
//!
//! Every type that may be read back from the cache has to be registered before
//! the first read. Unregistered tags fail closed with
//! [`Error::TypeResolutionError`].

use crate::codec;
use crate::error::{Error, Result};
use crate::value::{CacheValue, Cacheable, TypeKind};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Type alias for a body decoder.
type DecodeFn = dyn Fn(&str) -> Result<CacheValue> + Send + Sync;

/// A registered type: its body kind and how to decode it.
pub struct RegisteredType {
    kind: TypeKind,
    decode: Box<DecodeFn>,
}

impl RegisteredType {
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Decode an entry body into a value of this type.
    pub fn decode(&self, body: &str) -> Result<CacheValue> {
        (self.decode)(body)
    }
}

/// Registry of decodable types, keyed by type tag.
///
/// # Example
///
/// ```
/// use memcache_typed::TypeRegistry;
///
/// let registry = TypeRegistry::with_defaults();
/// assert!(registry.contains("string"));
/// assert!(registry.resolve("com.example.Unknown").is_err());
/// ```
pub struct TypeRegistry {
    types: HashMap<String, RegisteredType>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        TypeRegistry {
            types: HashMap::new(),
        }
    }

    /// Create a registry holding all built-in [`Cacheable`] types.
    pub fn with_defaults() -> Self {
        TypeRegistry::new()
            .with::<String>()
            .with::<bool>()
            .with::<i8>()
            .with::<i16>()
            .with::<i32>()
            .with::<i64>()
            .with::<u8>()
            .with::<u16>()
            .with::<u32>()
            .with::<u64>()
            .with::<f32>()
            .with::<f64>()
            .with::<HashMap<String, String>>()
            .with::<BTreeMap<String, String>>()
            .with::<Vec<String>>()
            .with::<Value>()
    }

    /// Register a type under its tag.
    ///
    /// A type registered later under the same tag replaces the earlier one.
    pub fn register<T: Cacheable>(&mut self) {
        let tag = T::type_tag();
        let registered = RegisteredType {
            kind: T::kind(),
            decode: Box::new(|body: &str| codec::decode_body::<T>(body).map(CacheValue::new)),
        };

        if self.types.insert(tag.to_string(), registered).is_some() {
            warn!("Type tag '{}' was registered twice, keeping the latest", tag);
        } else {
            debug!("Registered cache type '{}'", tag);
        }
    }

    /// Builder-style [`TypeRegistry::register`].
    pub fn with<T: Cacheable>(mut self) -> Self {
        self.register::<T>();
        self
    }

    /// Look up the decoder for a tag.
    ///
    /// # Errors
    /// Returns `Error::TypeResolutionError` if the tag is not registered
    pub fn resolve(&self, type_tag: &str) -> Result<&RegisteredType> {
        self.types
            .get(type_tag)
            .ok_or_else(|| Error::TypeResolutionError(type_tag.to_string()))
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.types.contains_key(type_tag)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
