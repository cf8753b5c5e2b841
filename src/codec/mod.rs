//! Cache entry codec: typed values to tagged text entries, and entries to stored bytes.
//!
//! A value is stored in two layers:
//!
//! ```text
//! CacheEntry { type_tag: "string", body: "\"bar\"" }        <- encode / decode
//!        │
//!        ▼
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│VERSION (varint) │ POSTCARD CacheEntry      │  <- to_bytes / from_bytes
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "MCTE"
//! ```
//!
//! The body is JSON for structured types and the literal textual form for
//! scalars. Null and empty-collection fields are left out of bodies, so readers
//! must tolerate missing fields. Unknown fields are ignored on read.
//!
//! # Example
//!
//! ```rust
//! use memcache_typed::codec::{decode, encode, from_bytes, to_bytes};
//! use memcache_typed::TypeRegistry;
//!
//! # fn main() -> memcache_typed::Result<()> {
//! let registry = TypeRegistry::with_defaults();
//!
//! let entry = encode(Some(&"bar".to_string()))?.expect("value present");
//! assert_eq!(entry.type_tag, "string");
//! assert_eq!(entry.body, "\"bar\"");
//!
//! let bytes = to_bytes(&entry)?;
//! let value = decode(Some(&from_bytes(&bytes)?), &registry)?.expect("entry present");
//! assert_eq!(value.downcast::<String>(), Some("bar".to_string()));
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use crate::registry::TypeRegistry;
use crate::value::{CacheValue, Cacheable, TypeKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Magic header for stored entries: b"MCTE"
pub const ENTRY_MAGIC: [u8; 4] = *b"MCTE";

/// Current envelope version.
///
/// Bump when the `CacheEntry` layout changes. Entries written under another
/// version are rejected with `Error::VersionMismatch`.
pub const CURRENT_ENVELOPE_VERSION: u32 = 1;

/// The stored envelope pairing a type tag with a textual value encoding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Registry tag of the value's type
    pub type_tag: String,
    /// JSON body, or the literal text of a scalar
    pub body: String,
}

impl CacheEntry {
    pub fn new(type_tag: impl Into<String>, body: impl Into<String>) -> Self {
        CacheEntry {
            type_tag: type_tag.into(),
            body: body.into(),
        }
    }
}

/// Versioned frame around a stored entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEnvelope<T> {
    /// Magic header: must be b"MCTE"
    pub magic: [u8; 4],
    /// Envelope version: must match CURRENT_ENVELOPE_VERSION
    pub version: u32,
    pub payload: T,
}

impl<T> CacheEnvelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            magic: ENTRY_MAGIC,
            version: CURRENT_ENVELOPE_VERSION,
            payload,
        }
    }
}

/// Encode a value into a cache entry.
///
/// Returns `Ok(None)` when there is no value, meaning nothing should be stored.
///
/// Null and empty-collection fields are left out of the body only when `T`
/// still decodes without them; otherwise the full JSON is kept. A value that
/// cannot be read back at all (a non-finite float, for one) is rejected here,
/// so nothing unreadable ever reaches the store.
///
/// # Errors
///
/// Returns `Error::SerializationError` if the value cannot be written as JSON
/// or would not decode back as a `T`.
pub fn encode<T: Cacheable>(value: Option<&T>) -> Result<Option<CacheEntry>> {
    let Some(value) = value else {
        return Ok(None);
    };

    let json = to_json(value)?;
    let mut pruned = json.clone();
    prune_empty(&mut pruned);

    let body = to_text(&pruned)?;
    if parse_body::<T>(&body).is_ok() {
        return Ok(Some(CacheEntry::new(T::type_tag(), body)));
    }

    let body = to_text(&json)?;
    if parse_body::<T>(&body).is_ok() {
        debug!("'{}' needs its empty fields, storing them", T::type_tag());
        return Ok(Some(CacheEntry::new(T::type_tag(), body)));
    }

    error!("Cache entry for '{}' would not decode, refusing to store it", T::type_tag());
    Err(Error::SerializationError(format!(
        "{} value does not survive encoding (body {:?})",
        T::type_tag(),
        body
    )))
}

/// Write a value as compact JSON, leaving out null and empty-collection fields.
///
/// # Errors
///
/// Returns `Error::SerializationError` if serde_json rejects the value.
pub fn encode_body<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut json = to_json(value)?;
    prune_empty(&mut json);
    to_text(&json)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| {
        error!("Cache entry serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

fn to_text(json: &Value) -> Result<String> {
    serde_json::to_string(json).map_err(|e| Error::SerializationError(e.to_string()))
}

fn prune_empty(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.values_mut().for_each(prune_empty);
            map.retain(|_, v| !is_empty_value(v));
        }
        Value::Array(items) => items.iter_mut().for_each(prune_empty),
        _ => {}
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Decode a cache entry into a value using the registry.
///
/// Returns `Ok(None)` when there is no entry.
///
/// # Errors
///
/// - `Error::TypeResolutionError`: the entry's tag is not registered
/// - `Error::DeserializationError`: the body does not fit the registered type
pub fn decode(entry: Option<&CacheEntry>, registry: &TypeRegistry) -> Result<Option<CacheValue>> {
    let Some(entry) = entry else {
        return Ok(None);
    };

    let registered = registry.resolve(&entry.type_tag)?;
    registered.decode(&entry.body).map(Some)
}

/// Decode an entry body as a `T`.
///
/// Scalars are read as a JSON literal first, then as the raw body text, so a
/// string entry with the unquoted body `2` decodes to `"2"`.
///
/// # Errors
///
/// Returns `Error::DeserializationError` if the body cannot be read as a `T`.
pub fn decode_body<T: Cacheable>(body: &str) -> Result<T> {
    parse_body::<T>(body).map_err(|e| {
        if T::kind() == TypeKind::Structured {
            error!("Cache entry body for '{}' is malformed: {}", T::type_tag(), e);
        }
        e
    })
}

fn parse_body<T: Cacheable>(body: &str) -> Result<T> {
    match T::kind() {
        TypeKind::Scalar => serde_json::from_str::<T>(body)
            .or_else(|_| serde_json::from_value::<T>(Value::String(body.to_string())))
            .map_err(|_| {
                Error::DeserializationError(format!(
                    "body {:?} is not a valid {}",
                    body,
                    T::type_tag()
                ))
            }),
        TypeKind::Structured => serde_json::from_str::<T>(body)
            .map_err(|e| Error::DeserializationError(e.to_string())),
    }
}

/// Frame an entry for the store.
///
/// # Errors
///
/// Returns `Error::SerializationError` if Postcard serialization fails.
pub fn to_bytes(entry: &CacheEntry) -> Result<Vec<u8>> {
    let envelope = CacheEnvelope::new(entry);
    postcard::to_allocvec(&envelope).map_err(|e| {
        error!("Cache entry framing failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Read an entry back from stored bytes with validation.
///
/// # Errors
///
/// - `Error::InvalidCacheEntry`: Invalid magic header
/// - `Error::VersionMismatch`: Envelope version mismatch
/// - `Error::DeserializationError`: Corrupted Postcard payload
pub fn from_bytes(bytes: &[u8]) -> Result<CacheEntry> {
    let envelope: CacheEnvelope<CacheEntry> = postcard::from_bytes(bytes).map_err(|e| {
        error!("Cache entry unframing failed: {}", e);
        Error::DeserializationError(e.to_string())
    })?;

    if envelope.magic != ENTRY_MAGIC {
        warn!(
            "Invalid cache entry: expected magic {:?}, got {:?}",
            ENTRY_MAGIC, envelope.magic
        );
        return Err(Error::InvalidCacheEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            ENTRY_MAGIC, envelope.magic
        )));
    }

    if envelope.version != CURRENT_ENVELOPE_VERSION {
        warn!(
            "Cache entry version mismatch: expected {}, got {}",
            CURRENT_ENVELOPE_VERSION, envelope.version
        );
        return Err(Error::VersionMismatch {
            expected: CURRENT_ENVELOPE_VERSION,
            found: envelope.version,
        });
    }

    Ok(envelope.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
    struct Person {
        first_name: String,
        #[serde(default)]
        last_name: Option<String>,
        #[serde(default)]
        tags: Vec<String>,
    }

    impl Cacheable for Person {
        fn type_tag() -> &'static str {
            "person"
        }
    }

    fn registry() -> TypeRegistry {
        TypeRegistry::with_defaults().with::<Person>()
    }

    #[test]
    fn test_encode_absent_yields_nothing() {
        assert_eq!(encode::<String>(None).unwrap(), None);
    }

    #[test]
    fn test_encode_string_is_quoted() {
        let entry = encode(Some(&"bar".to_string())).unwrap().unwrap();
        assert_eq!(entry, CacheEntry::new("string", "\"bar\""));
    }

    #[test]
    fn test_encode_omits_null_and_empty_fields() {
        let person = Person {
            first_name: "yo".to_string(),
            last_name: None,
            tags: vec![],
        };

        let entry = encode(Some(&person)).unwrap().unwrap();
        assert_eq!(entry.type_tag, "person");
        assert_eq!(entry.body, r#"{"first_name":"yo"}"#);

        let decoded = decode(Some(&entry), &registry()).unwrap().unwrap();
        assert_eq!(decoded.downcast::<Person>(), Some(person));
    }

    #[test]
    fn test_encode_prunes_nested_objects() {
        let json = serde_json::json!({
            "outer": { "keep": 1, "drop": null, "none": [] },
            "list": [ { "x": null, "y": 2 } ],
            "empty": {},
            "gone": { "x": null, "y": [] }
        });

        assert_eq!(
            encode_body(&json).unwrap(),
            r#"{"list":[{"y":2}],"outer":{"keep":1}}"#
        );
    }

    #[test]
    fn test_encode_keeps_empty_fields_the_type_requires() {
        #[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
        struct Order {
            id: u32,
            items: Vec<String>,
        }

        impl Cacheable for Order {
            fn type_tag() -> &'static str {
                "order"
            }
        }

        let order = Order { id: 1, items: vec![] };
        let entry = encode(Some(&order)).unwrap().unwrap();
        assert_eq!(entry.body, r#"{"id":1,"items":[]}"#);

        let registry = TypeRegistry::with_defaults().with::<Order>();
        let decoded = decode(Some(&entry), &registry).unwrap().unwrap();
        assert_eq!(decoded.downcast::<Order>(), Some(order));
    }

    #[test]
    fn test_encode_rejects_non_finite_floats() {
        for value in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            match encode(Some(&value)) {
                Err(Error::SerializationError(_)) => {}
                other => panic!("Expected SerializationError for {}, got {:?}", value, other),
            }
        }
        assert!(matches!(
            encode(Some(&f32::NAN)),
            Err(Error::SerializationError(_))
        ));
        assert_eq!(
            encode(Some(&1.5f64)).unwrap(),
            Some(CacheEntry::new("f64", "1.5"))
        );
    }

    #[test]
    fn test_decode_absent_entry() {
        assert!(decode(None, &registry()).unwrap().is_none());
    }

    #[test]
    fn test_decode_unknown_tag_fails_closed() {
        let entry = CacheEntry::new("java.util.Date", "0");
        match decode(Some(&entry), &registry()) {
            Err(Error::TypeResolutionError(tag)) => assert_eq!(tag, "java.util.Date"),
            other => panic!("Expected TypeResolutionError, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_integer_from_text() {
        let entry = CacheEntry::new("i32", "2");
        let value = decode(Some(&entry), &registry()).unwrap().unwrap();
        assert_eq!(value.downcast::<i32>(), Some(2));
    }

    #[test]
    fn test_decode_unquoted_string_body() {
        let entry = CacheEntry::new("string", "2");
        let value = decode(Some(&entry), &registry()).unwrap().unwrap();
        assert_eq!(value.downcast::<String>(), Some("2".to_string()));
    }

    #[test]
    fn test_decode_bad_scalar_body() {
        let entry = CacheEntry::new("u8", "not-a-number");
        let result = decode(Some(&entry), &registry());
        assert!(matches!(result, Err(Error::DeserializationError(_))));
    }

    #[test]
    fn test_decode_map_ignores_layout() {
        let entry = CacheEntry::new(
            "map",
            "{\n  \"firstName\": \"yo\",\n  \"lastName\": \"man\"\n}",
        );
        let value = decode(Some(&entry), &registry()).unwrap().unwrap();
        let map = value.downcast::<HashMap<String, String>>().unwrap();
        assert_eq!(map["firstName"], "yo");
        assert_eq!(map["lastName"], "man");
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let entry = CacheEntry::new("person", r#"{"first_name":"yo","age":42}"#);
        let value = decode(Some(&entry), &registry()).unwrap().unwrap();
        let person = value.downcast::<Person>().unwrap();
        assert_eq!(person.first_name, "yo");
        assert!(person.tags.is_empty());
    }

    #[test]
    fn test_bytes_roundtrip() {
        let entry = CacheEntry::new("string", "\"bar\"");
        let bytes = to_bytes(&entry).unwrap();
        assert_eq!(&bytes[0..4], b"MCTE");
        assert_eq!(from_bytes(&bytes).unwrap(), entry);
    }

    #[test]
    fn test_invalid_magic_rejected() {
        let mut bytes = vec![0u8; 100];
        bytes[0..4].copy_from_slice(b"XXXX"); // Wrong magic
        bytes[4..8].copy_from_slice(&1u32.to_le_bytes()); // Valid version

        match from_bytes(&bytes) {
            Err(Error::InvalidCacheEntry(_)) => {}
            other => panic!("Expected InvalidCacheEntry, got {:?}", other),
        }
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let entry = CacheEntry::new("string", "\"bar\"");
        let mut envelope = CacheEnvelope::new(&entry);
        envelope.version = 999;

        let bytes = postcard::to_allocvec(&envelope).unwrap();
        match from_bytes(&bytes) {
            Err(Error::VersionMismatch { expected, found }) => {
                assert_eq!(expected, CURRENT_ENVELOPE_VERSION);
                assert_eq!(found, 999);
            }
            other => panic!("Expected VersionMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_bytes_rejected() {
        let entry = CacheEntry::new("string", "\"bar\"");
        let mut bytes = to_bytes(&entry).unwrap();
        let len = bytes.len();
        bytes.truncate(len / 2);

        assert!(matches!(
            from_bytes(&bytes),
            Err(Error::DeserializationError(_))
        ));
    }
}
