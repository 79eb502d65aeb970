//! MessagePack codec for the catalog wire format

use crate::error::{CatalinkError, CatalinkResult};
use serde::Serialize;
use serde_json::{Map, Value};

/// Encode a payload as a MessagePack map (field names preserved)
pub fn encode<T: Serialize + ?Sized>(payload: &T) -> CatalinkResult<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(payload)?)
}

/// Decode a MessagePack body that must hold a map at the top level
pub fn decode_map(bytes: &[u8]) -> CatalinkResult<Map<String, Value>> {
    match rmp_serde::from_slice::<Value>(bytes)? {
        Value::Object(map) => Ok(map),
        other => Err(CatalinkError::Serialization(format!(
            "expected a map, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "nil",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}
