//! Deterministic source tokens
//!
//! A token is the truncated SHA256 of the canonical JSON form of a
//! source's identity. Object keys are sorted before hashing so the
//! token does not depend on insertion order.

use crate::container::DataSource;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Digest bytes kept in a token (hex doubles the length)
const TOKEN_BYTES: usize = 16;

/// Token for an identity value
pub fn fingerprint(identity: &Value) -> String {
    let canonical = canonicalize(identity).to_string();
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(&digest[..TOKEN_BYTES])
}

/// Token for a source
pub fn token_of(source: &dyn DataSource) -> String {
    fingerprint(&source.identity())
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::with_capacity(map.len());
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key.as_str()]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
