//! Canonical JSON and SHA-256 fingerprints
//!
//! Fingerprints make normalization determinism checkable and tie every
//! forecast resource back to the exact UDM record it was built from.

use crate::domain::{AegisError, Result};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Serializes a value to canonical JSON (recursively sorted keys, compact)
///
/// # Examples
///
/// ```
/// use aegis::core::fingerprint::canonical_json;
/// use serde_json::json;
///
/// let a = canonical_json(&json!({"b": 1, "a": {"d": 2, "c": 3}})).unwrap();
/// assert_eq!(a, r#"{"a":{"c":3,"d":2},"b":1}"#);
/// ```
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value)
        .map_err(|e| AegisError::Serialization(e.to_string()))?;
    let normalized = normalize_json(&value);
    serde_json::to_string(&normalized).map_err(|e| AegisError::Serialization(e.to_string()))
}

/// Hex-encoded SHA-256 of a value's canonical JSON (64 characters)
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(sha256_hex(canonical_json(value)?.as_bytes()))
}

/// Hex-encoded SHA-256 of raw bytes
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn normalize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, normalize_json(v))).collect();
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        Value::Array(arr) => Value::Array(arr.iter().map(normalize_json).collect()),
        _ => value.clone(),
    }
}
