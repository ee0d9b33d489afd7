//! # Canonical Serialization
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! that are hashed into certificate ids, transaction ids, and change-record
//! digests, or signed by a caller's key.
//!
//! ## Invariant
//!
//! The inner field is private. The only constructor is
//! `CanonicalBytes::new()`, which rejects floats, sorts object keys at every
//! depth, and emits compact JSON with no insignificant whitespace. Any
//! function that needs hashable bytes takes `&CanonicalBytes`, so a digest
//! over an ad hoc serialization cannot be written.
//!
//! Two values that serialize to the same JSON tree always produce the same
//! bytes, independent of struct field order or map insertion order.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by canonical JSON serialization.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - Object keys are sorted lexicographically at every depth.
/// - Separators are compact (`,` and `:`).
/// - Numbers are integers; floats are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::FloatRejected` if the value contains a
    /// non-integer number. Returns `CanonicalizationError::SerializationFailed`
    /// if the value cannot be represented as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let normalized = normalize(value)?;
        let bytes = serde_json::to_vec(&normalized)?;
        Ok(Self(bytes))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Recursively reject floats and rebuild objects in sorted key order.
///
/// Sorting happens here rather than relying on `serde_json::Map` ordering,
/// which switches to insertion order when any crate in the build enables
/// `preserve_order`.
fn normalize(value: Value) -> Result<Value, CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(value),
        Value::Number(ref n) => {
            if !n.is_i64() && !n.is_u64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(value)
        }
        Value::Object(map) => {
            let mut sorted = BTreeMap::new();
            for (k, v) in map {
                sorted.insert(k, normalize(v)?);
            }
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k, v);
            }
            Ok(Value::Object(out))
        }
        Value::Array(arr) => {
            let items: Result<Vec<_>, _> = arr.into_iter().map(normalize).collect();
            Ok(Value::Array(items?))
        }
    }
}
