//! Firestore Value Encoding
//!
//! Firestore's REST API wraps every field in a typed envelope
//! (`{"stringValue": "..."}`, `{"integerValue": "42"}`, ...). The rest of the
//! crate works with plain JSON; these helpers convert in both directions.

use serde_json::{json, Map, Number, Value};

use super::traits::StoreError;

/// Plain JSON fields from a Firestore `fields` map
pub fn fields_to_plain(fields: &Map<String, Value>) -> Result<Map<String, Value>, StoreError> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.clone(), to_plain(value)?)))
        .collect()
}

/// Firestore `fields` map from plain JSON fields
pub fn fields_from_plain(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), from_plain(value)))
        .collect()
}

/// Unwrap one typed Firestore value
pub fn to_plain(value: &Value) -> Result<Value, StoreError> {
    let (kind, raw) = value
        .as_object()
        .and_then(|map| map.iter().next())
        .ok_or_else(|| StoreError::Protocol(format!("not a Firestore value: {value}")))?;

    match (kind.as_str(), raw) {
        ("nullValue", _) => Ok(Value::Null),
        ("booleanValue", v @ Value::Bool(_)) => Ok(v.clone()),
        ("integerValue", Value::String(s)) => s
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .map_err(|e| StoreError::Protocol(format!("bad integerValue {s}: {e}"))),
        ("integerValue", v @ Value::Number(_)) => Ok(v.clone()),
        ("doubleValue", Value::Number(n)) => Ok(Value::Number(n.clone())),
        // Firestore encodes NaN and infinities as strings; plain JSON has no room for them
        ("doubleValue", Value::String(s)) => Ok(Value::String(s.clone())),
        ("timestampValue", Value::String(s))
        | ("stringValue", Value::String(s))
        | ("referenceValue", Value::String(s))
        | ("bytesValue", Value::String(s)) => Ok(Value::String(s.clone())),
        ("geoPointValue", v @ Value::Object(_)) => Ok(v.clone()),
        ("mapValue", Value::Object(inner)) => {
            let empty = Map::new();
            let fields = match inner.get("fields") {
                Some(Value::Object(fields)) => fields,
                _ => &empty,
            };
            fields_to_plain(fields).map(Value::Object)
        }
        ("arrayValue", Value::Object(inner)) => match inner.get("values") {
            Some(Value::Array(values)) => values.iter().map(to_plain).collect::<Result<Vec<_>, _>>().map(Value::Array),
            _ => Ok(Value::Array(Vec::new())),
        },
        (kind, raw) => Err(StoreError::Protocol(format!("unsupported Firestore value {kind}: {raw}"))),
    }
}

/// Wrap a plain JSON value in its Firestore envelope
pub fn from_plain(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => number_value(n),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => {
            let values: Vec<Value> = values.iter().map(from_plain).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": fields_from_plain(fields) } }),
    }
}

fn number_value(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        json!({ "integerValue": i.to_string() })
    } else if let Some(u) = n.as_u64() {
        json!({ "integerValue": u.to_string() })
    } else {
        json!({ "doubleValue": n })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_typed_document_fields() {
        let typed = json!({
            "sku": { "stringValue": "トップス-002" },
            "price": { "integerValue": "6800" },
            "marketplaces": { "mapValue": { "fields": {
                "mercari": { "booleanValue": true }
            } } },
            "createdAt": { "timestampValue": "2024-04-01T10:00:00.123Z" },
            "image": { "nullValue": null },
            "tags": { "arrayValue": {} }
        });
        let plain = fields_to_plain(typed.as_object().unwrap()).unwrap();
        assert_eq!(
            Value::Object(plain),
            json!({
                "sku": "トップス-002",
                "price": 6800,
                "marketplaces": { "mercari": true },
                "createdAt": "2024-04-01T10:00:00.123Z",
                "image": null,
                "tags": []
            })
        );
    }

    #[test]
    fn test_encode_plain_fields() {
        let plain = json!({ "title": "Coat", "price": 6800, "ratio": 0.5, "flags": { "yahoo": false } });
        let typed = fields_from_plain(plain.as_object().unwrap());
        assert_eq!(typed["title"], json!({ "stringValue": "Coat" }));
        assert_eq!(typed["price"], json!({ "integerValue": "6800" }));
        assert_eq!(typed["ratio"], json!({ "doubleValue": 0.5 }));
        assert_eq!(
            typed["flags"],
            json!({ "mapValue": { "fields": { "yahoo": { "booleanValue": false } } } })
        );
    }

    #[test]
    fn test_empty_map_value_decodes_to_empty_object() {
        let plain = to_plain(&json!({ "mapValue": {} })).unwrap();
        assert_eq!(plain, json!({}));
    }

    #[test]
    fn test_rejects_unknown_envelopes() {
        assert!(to_plain(&json!("bare")).is_err());
        assert!(to_plain(&json!({ "integerValue": "twelve" })).is_err());
        assert!(to_plain(&json!({ "mysteryValue": 1 })).is_err());
    }
}
