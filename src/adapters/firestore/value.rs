//! Conversion between plain JSON and Firestore's typed `Value` wire format.

use crate::utils::error::{Result, SyncError};
use serde_json::{json, Map, Value};

/// Encodes a JSON value as a Firestore `Value`.
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else {
                // u64 above i64::MAX and every float land here; as_f64 is only
                // None with serde_json's arbitrary_precision, which sends null.
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            if items.is_empty() {
                json!({ "arrayValue": {} })
            } else {
                let values: Vec<Value> = items.iter().map(encode).collect();
                json!({ "arrayValue": { "values": values } })
            }
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map.iter()) } }),
    }
}

/// Encodes a field map, as used in a document's `fields` member.
pub fn encode_fields<'a, I>(fields: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    fields
        .into_iter()
        .map(|(key, value)| (key.clone(), encode(value)))
        .collect()
}

/// Decodes a Firestore `Value` back into plain JSON.
pub fn decode(value: &Value) -> Result<Value> {
    let object = value
        .as_object()
        .ok_or_else(|| SyncError::decode(format!("expected a typed value object, got {}", value)))?;

    let (kind, inner) = object
        .iter()
        .next()
        .ok_or_else(|| SyncError::decode("empty typed value"))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| SyncError::decode("booleanValue is not a bool")),
        "integerValue" => decode_integer(inner),
        "doubleValue" => decode_double(inner),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| SyncError::decode(format!("{} is not a string", kind))),
        "geoPointValue" => Ok(json!({
            "latitude": inner.get("latitude").cloned().unwrap_or(json!(0.0)),
            "longitude": inner.get("longitude").cloned().unwrap_or(json!(0.0)),
        })),
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(values)) => values.iter().map(decode).collect::<Result<Vec<_>>>()?,
                Some(other) => {
                    return Err(SyncError::decode(format!("arrayValue.values is not an array: {}", other)))
                }
                None => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => {
            let fields = match inner.get("fields") {
                Some(Value::Object(fields)) => decode_fields(fields)?,
                Some(other) => {
                    return Err(SyncError::decode(format!("mapValue.fields is not an object: {}", other)))
                }
                None => Map::new(),
            };
            Ok(Value::Object(fields))
        }
        other => Err(SyncError::decode(format!("unsupported value kind '{}'", other))),
    }
}

pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>> {
    fields
        .iter()
        .map(|(key, value)| decode(value).map(|decoded| (key.clone(), decoded)))
        .collect()
}

fn decode_integer(inner: &Value) -> Result<Value> {
    // Firestore sends int64 as a decimal string; accept a bare number too.
    match inner {
        Value::String(s) => s
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| SyncError::decode(format!("integerValue '{}': {}", s, e))),
        Value::Number(n) if n.is_i64() => Ok(Value::Number(n.clone())),
        other => Err(SyncError::decode(format!("integerValue is not an integer: {}", other))),
    }
}

fn decode_double(inner: &Value) -> Result<Value> {
    match inner {
        Value::Number(n) => Ok(Value::Number(n.clone())),
        // NaN and the infinities arrive as strings and have no JSON form.
        Value::String(s) => Ok(Value::String(s.clone())),
        other => Err(SyncError::decode(format!("doubleValue is not a number: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode(&json!(null)), json!({"nullValue": null}));
        assert_eq!(encode(&json!(true)), json!({"booleanValue": true}));
        assert_eq!(encode(&json!(5)), json!({"integerValue": "5"}));
        assert_eq!(encode(&json!(4.5)), json!({"doubleValue": 4.5}));
        assert_eq!(encode(&json!("clay")), json!({"stringValue": "clay"}));
    }

    #[test]
    fn test_encode_u64_beyond_i64_as_double() {
        assert_eq!(
            encode(&json!(u64::MAX)),
            json!({"doubleValue": u64::MAX as f64})
        );
    }

    #[test]
    fn test_encode_nested() {
        let encoded = encode(&json!({"tags": ["wood", 2], "empty": []}));
        assert_eq!(
            encoded,
            json!({"mapValue": {"fields": {
                "tags": {"arrayValue": {"values": [
                    {"stringValue": "wood"},
                    {"integerValue": "2"}
                ]}},
                "empty": {"arrayValue": {}}
            }}})
        );
    }

    #[test]
    fn test_decode_server_document_fields() {
        let fields = json!({
            "name": {"stringValue": "Salma"},
            "rating": {"integerValue": "4"},
            "score": {"doubleValue": 4.25},
            "createdAt": {"timestampValue": "2024-03-01T10:00:00Z"},
            "location": {"geoPointValue": {"latitude": 30.04, "longitude": 31.23}},
            "skills": {"arrayValue": {}},
            "meta": {"mapValue": {}}
        });

        let decoded = decode_fields(fields.as_object().unwrap()).unwrap();
        assert_eq!(
            Value::Object(decoded),
            json!({
                "name": "Salma",
                "rating": 4,
                "score": 4.25,
                "createdAt": "2024-03-01T10:00:00Z",
                "location": {"latitude": 30.04, "longitude": 31.23},
                "skills": [],
                "meta": {}
            })
        );
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        let err = decode(&json!({"vectorValue": {}})).unwrap_err();
        assert!(matches!(err, SyncError::DecodeError { .. }));
        assert!(decode(&json!({"integerValue": "four"})).is_err());
    }
}
