//! Conversions between `serde_json::Value` and `google.protobuf.Value`.
//!
//! Protobuf structs only carry doubles, so integers are checked to fit the
//! 53-bit mantissa on the way in and whole doubles are turned back into
//! integers on the way out (otherwise `u32` fields would fail to decode).

use std::collections::BTreeMap;

use prost_types::value::Kind;
use prost_types::{ListValue, Struct, Value};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub fn to_value(json: serde_json::Value) -> Result<Value> {
    let kind = match json {
        serde_json::Value::Null => Kind::NullValue(0),
        serde_json::Value::Bool(b) => Kind::BoolValue(b),
        serde_json::Value::Number(n) => Kind::NumberValue(number_to_f64(&n)?),
        serde_json::Value::String(s) => Kind::StringValue(s),
        serde_json::Value::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(to_value).collect::<Result<_>>()?,
        }),
        serde_json::Value::Object(map) => Kind::StructValue(Struct {
            fields: map
                .into_iter()
                .map(|(k, v)| to_value(v).map(|v| (k, v)))
                .collect::<Result<BTreeMap<_, _>>>()?,
        }),
    };
    Ok(Value { kind: Some(kind) })
}

fn number_to_f64(n: &serde_json::Number) -> Result<f64> {
    if let Some(i) = n.as_i64() {
        if (i as f64).abs() > MAX_SAFE_INTEGER {
            return Err(Error::Encode(format!("integer {i} is out of range")));
        }
        return Ok(i as f64);
    }
    if let Some(u) = n.as_u64() {
        if u as f64 > MAX_SAFE_INTEGER {
            return Err(Error::Encode(format!("integer {u} is out of range")));
        }
        return Ok(u as f64);
    }
    n.as_f64()
        .ok_or_else(|| Error::Encode(format!("number {n} is not representable")))
}

/// Serializes `v` into a struct-typed `Value`. Anything other than a JSON
/// object at the top level is rejected.
pub fn to_struct_value<T: Serialize + ?Sized>(v: &T) -> Result<Value> {
    let json = serde_json::to_value(v).map_err(|e| Error::Encode(e.to_string()))?;
    if !json.is_object() {
        return Err(Error::Encode("top-level value must be an object".to_string()));
    }
    to_value(json)
}

pub fn from_value(value: &Value) -> Result<serde_json::Value> {
    let Some(kind) = &value.kind else {
        return Ok(serde_json::Value::Null);
    };

    Ok(match kind {
        Kind::NullValue(_) => serde_json::Value::Null,
        Kind::BoolValue(b) => serde_json::Value::Bool(*b),
        Kind::NumberValue(f) => number_from_f64(*f)?,
        Kind::StringValue(s) => serde_json::Value::String(s.clone()),
        Kind::ListValue(list) => serde_json::Value::Array(
            list.values.iter().map(from_value).collect::<Result<_>>()?,
        ),
        Kind::StructValue(s) => serde_json::Value::Object(from_struct_fields(s)?),
    })
}

pub fn from_struct_fields(s: &Struct) -> Result<serde_json::Map<String, serde_json::Value>> {
    s.fields
        .iter()
        .map(|(k, v)| from_value(v).map(|v| (k.clone(), v)))
        .collect()
}

fn number_from_f64(f: f64) -> Result<serde_json::Value> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        return Ok(serde_json::Value::from(f as i64));
    }
    serde_json::Number::from_f64(f)
        .map(serde_json::Value::Number)
        .ok_or_else(|| Error::Decode(format!("number {f} is not representable")))
}

/// Decodes a structured value into a typed shape.
pub fn decode<T: DeserializeOwned>(value: &Value) -> Result<T> {
    let json = from_value(value)?;
    serde_json::from_value(json).map_err(|e| Error::Decode(e.to_string()))
}
