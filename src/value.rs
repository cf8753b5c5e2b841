//! Values that can be stored in the cache.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// How an entry body is written and read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKind {
    /// Body is the literal textual form of the value (strings, numbers, booleans).
    Scalar,
    /// Body is a JSON document of the value's fields.
    Structured,
}

/// Trait that all values stored in the cache must implement.
///
/// The type tag is written next to every stored body and is how the reading
/// side finds the decoder in its [`crate::TypeRegistry`]. Tags must be unique
/// across every type registered in one registry.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use memcache_typed::Cacheable;
///
/// #[derive(Clone, Serialize, Deserialize)]
/// pub struct Profile {
///     pub first_name: String,
///     #[serde(default)]
///     pub nicknames: Vec<String>,
/// }
///
/// impl Cacheable for Profile {
///     fn type_tag() -> &'static str {
///         "profile"
///     }
/// }
/// ```
///
/// Fields that are null or empty collections are left out of stored bodies, so
/// structured types should mark optional and collection fields `#[serde(default)]`.
pub trait Cacheable: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Globally resolvable identifier for this type.
    fn type_tag() -> &'static str;

    /// Body encoding kind. Structured unless overridden.
    fn kind() -> TypeKind {
        TypeKind::Structured
    }
}

macro_rules! scalar_cacheable {
    ($($ty:ty => $tag:expr),* $(,)?) => {
        $(
            impl Cacheable for $ty {
                fn type_tag() -> &'static str {
                    $tag
                }

                fn kind() -> TypeKind {
                    TypeKind::Scalar
                }
            }
        )*
    };
}

scalar_cacheable! {
    String => "string",
    bool => "bool",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    f32 => "f32",
    f64 => "f64",
}

impl Cacheable for HashMap<String, String> {
    fn type_tag() -> &'static str {
        "map"
    }
}

impl Cacheable for BTreeMap<String, String> {
    fn type_tag() -> &'static str {
        "sorted_map"
    }
}

impl Cacheable for Vec<String> {
    fn type_tag() -> &'static str {
        "string_list"
    }
}

impl Cacheable for serde_json::Value {
    fn type_tag() -> &'static str {
        "json"
    }
}

/// A decoded value whose concrete type is only known at runtime.
///
/// Cheap to clone. Use [`CacheValue::downcast`] to get the typed value back.
#[derive(Clone)]
pub struct CacheValue {
    type_tag: String,
    inner: Arc<dyn Any + Send + Sync>,
}

impl CacheValue {
    pub fn new<T: Cacheable>(value: T) -> Self {
        CacheValue {
            type_tag: T::type_tag().to_string(),
            inner: Arc::new(value),
        }
    }

    /// Tag of the type this value was decoded as.
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// Check whether the value is a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Clone the value out as a `T`, or `None` if it is some other type.
    pub fn downcast<T: Clone + 'static>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }
}

impl fmt::Debug for CacheValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheValue")
            .field("type_tag", &self.type_tag)
            .finish_non_exhaustive()
    }
}
