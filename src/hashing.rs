//! Hashing - SHA-256 fingerprints for records and captures.
//!
//! Fingerprints let repeat exports be compared: the same record and the same
//! rendered pixels must hash identically.

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};

use crate::ENGINE_VERSION;

/// Compute SHA-256 of bytes, returned as a hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex_encode(&hasher.finalize())
}

/// Canonical JSON: sorted keys, no whitespace. Serialization order never
/// changes the hash.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    to_string(&sort_value(&v))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_value(v)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// Fingerprint of a serializable record, bound to the engine version:
/// `sha256(canonical_record + ":" + engine_version)`.
pub fn record_fingerprint<T: Serialize>(record: &T) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(record)?;
    Ok(sha256_hex(
        format!("{}:{}", canonical, ENGINE_VERSION).as_bytes(),
    ))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
