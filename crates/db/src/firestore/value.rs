//! Mapping between plain JSON and Firestore's typed value encoding.
//!
//! Firestore's REST surface wraps every field in a single-key object naming
//! its type (`{"stringValue": "x"}`, `{"integerValue": "42"}`, ...). Integers
//! travel as strings. Timestamps, references and bytes decode to strings.

use serde_json::{json, Map, Number, Value};

use crate::error::ClientError;

/// Encode a JSON object as a Firestore `fields` map.
pub fn encode_fields(fields: &Map<String, Value>) -> Value {
    let encoded: Map<String, Value> = fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect();
    Value::Object(encoded)
}

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => encode_number(n),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

fn encode_number(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        json!({ "integerValue": i.to_string() })
    } else {
        // u64 beyond i64::MAX and all floats
        json!({ "doubleValue": n.as_f64().unwrap_or(f64::NAN) })
    }
}

/// Decode a Firestore `fields` map into plain JSON.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, ClientError> {
    fields
        .iter()
        .map(|(key, value)| Ok::<_, ClientError>((key.clone(), decode_value(value)?)))
        .collect()
}

pub fn decode_value(value: &Value) -> Result<Value, ClientError> {
    let Some(object) = value.as_object() else {
        return Err(ClientError::Decode(format!("expected typed value, got {value}")));
    };
    let Some((kind, inner)) = object.iter().next() else {
        return Err(ClientError::Decode("empty typed value".to_string()));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| unexpected(kind, inner)),
        "integerValue" => decode_integer(inner).ok_or_else(|| unexpected(kind, inner)),
        "doubleValue" => decode_double(inner).ok_or_else(|| unexpected(kind, inner)),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| unexpected(kind, inner)),
        "geoPointValue" => Ok(json!({
            "latitude": inner.get("latitude").cloned().unwrap_or(json!(0.0)),
            "longitude": inner.get("longitude").cloned().unwrap_or(json!(0.0)),
        })),
        "arrayValue" => {
            // An empty array comes back as `{}` with no `values` key.
            let items = match inner.get("values") {
                Some(Value::Array(items)) => items
                    .iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>, _>>()?,
                Some(other) => return Err(unexpected(kind, other)),
                None => Vec::new(),
            };
            Ok(Value::Array(items))
        }
        "mapValue" => match inner.get("fields") {
            Some(Value::Object(fields)) => Ok(Value::Object(decode_fields(fields)?)),
            Some(other) => Err(unexpected(kind, other)),
            None => Ok(Value::Object(Map::new())),
        },
        other => Err(ClientError::Decode(format!("unsupported value type '{other}'"))),
    }
}

fn decode_integer(inner: &Value) -> Option<Value> {
    match inner {
        Value::String(s) => s.parse::<i64>().ok().map(Value::from),
        Value::Number(n) => n.as_i64().map(Value::from),
        _ => None,
    }
}

fn decode_double(inner: &Value) -> Option<Value> {
    match inner {
        Value::Number(n) => Some(Value::Number(n.clone())),
        // NaN and Infinity arrive as strings and have no JSON representation.
        Value::String(_) => Some(Value::Null),
        _ => None,
    }
}

fn unexpected(kind: &str, inner: &Value) -> ClientError {
    ClientError::Decode(format!("malformed {kind}: {inner}"))
}
