//! Wire dictionary ↔ internal object conversion
//!
//! Keys are camelCase on the wire and snake_case internally. A key is only
//! renamed when the rename is reversible; anything else is kept verbatim so
//! `to_wire(from_wire(d)) == d` holds key for key.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Number, Value as Json};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::Duration;

use super::schema::{FieldKind, Schema};
use super::value::{Object, Value};
use crate::types::check_range;
use crate::{ProtectError, Result};

pub(crate) fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

pub(crate) fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Internal key for a wire key under `schema`.
pub(crate) fn internal_key(schema: &Schema, wire_key: &str) -> String {
    if let Some(internal) = schema.remap_to_internal(wire_key) {
        return internal.to_string();
    }
    let snake = to_snake_case(wire_key);
    if to_camel_case(&snake) == wire_key { snake } else { wire_key.to_string() }
}

/// Wire key for an internal key under `schema`.
pub(crate) fn wire_key(schema: &Schema, internal_key: &str) -> String {
    if let Some(wire) = schema.remap_to_wire(internal_key) {
        return wire.to_string();
    }
    let camel = to_camel_case(internal_key);
    if to_snake_case(&camel) == internal_key { camel } else { internal_key.to_string() }
}

/// Convert a complete or partial wire dictionary to an object of `schema`.
pub fn object_from_wire(schema: &'static Schema, data: &Map<String, Json>) -> Result<Object> {
    let mut fields = BTreeMap::new();
    for (key, value) in data {
        let internal = internal_key(schema, key);
        let converted = field_from_wire(schema.field_kind(&internal), &internal, value)?;
        fields.insert(internal, converted);
    }
    Ok(Object::with_fields(schema, fields))
}

/// Convert an object back to its wire dictionary, dropping internal-only fields.
pub fn object_to_wire(object: &Object) -> Map<String, Json> {
    let schema = object.schema();
    object
        .fields()
        .iter()
        .filter(|(key, _)| !schema.is_internal_only(key))
        .map(|(key, value)| (wire_key(schema, key), field_to_wire(schema.field_kind(key), value)))
        .collect()
}

fn field_from_wire(kind: Option<FieldKind>, field: &str, value: &Json) -> Result<Value> {
    let Some(kind) = kind else {
        return Ok(plain_from_wire(value));
    };

    let converted = match (kind, value) {
        (FieldKind::Timestamp, Json::Number(n)) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .map(Value::Timestamp),
        (FieldKind::DurationMs, Json::Number(n)) => {
            n.as_u64().map(|ms| Value::Duration(Duration::from_millis(ms)))
        }
        (FieldKind::DurationSecs, Json::Number(n)) => {
            n.as_u64().map(|secs| Value::Duration(Duration::from_secs(secs)))
        }
        (FieldKind::Ip, Json::String(s)) => s
            .parse::<IpAddr>()
            .ok()
            .filter(|ip| ip.to_string() == *s)
            .map(Value::Ip),
        (FieldKind::Ranged { min, max }, Json::Number(n)) => {
            let v = n.as_i64().ok_or_else(|| {
                ProtectError::validation(field, format!("{} is not an integer", n))
            })?;
            check_range(field, v, min, max)?;
            Some(Value::Number(n.clone()))
        }
        (FieldKind::Object(schema), Json::Object(map)) => {
            Some(Value::Object(object_from_wire(schema, map)?))
        }
        (FieldKind::ObjectOrEmpty(_), Json::Object(map)) if map.is_empty() => Some(Value::Null),
        (FieldKind::ObjectOrEmpty(schema), Json::Object(map)) => {
            Some(Value::Object(object_from_wire(schema, map)?))
        }
        (FieldKind::List(schema), Json::Array(items)) => Some(Value::List(
            items
                .iter()
                .map(|item| match item {
                    Json::Object(map) => object_from_wire(schema, map).map(Value::Object),
                    other => Ok(plain_from_wire(other)),
                })
                .collect::<Result<_>>()?,
        )),
        (FieldKind::Map(schema), Json::Object(map)) => Some(Value::Map(
            map.iter()
                .map(|(k, item)| {
                    let converted = match item {
                        Json::Object(inner) => Value::Object(object_from_wire(schema, inner)?),
                        other => plain_from_wire(other),
                    };
                    Ok((k.clone(), converted))
                })
                .collect::<Result<_>>()?,
        )),
        _ => None,
    };

    Ok(converted.unwrap_or_else(|| plain_from_wire(value)))
}

fn field_to_wire(kind: Option<FieldKind>, value: &Value) -> Json {
    match (kind, value) {
        (Some(FieldKind::ObjectOrEmpty(_)), Value::Null) => Json::Object(Map::new()),
        (Some(FieldKind::DurationSecs), Value::Duration(d)) => Json::Number(d.as_secs().into()),
        (_, value) => value_to_wire(value),
    }
}

fn value_to_wire(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => Json::Number(n.clone()),
        Value::String(s) => Json::String(s.clone()),
        Value::Timestamp(t) => Json::Number(timestamp_to_wire(t)),
        Value::Duration(d) => Json::Number(Number::from(d.as_millis() as u64)),
        Value::Ip(ip) => Json::String(ip.to_string()),
        Value::List(items) => Json::Array(items.iter().map(value_to_wire).collect()),
        Value::Map(map) => {
            Json::Object(map.iter().map(|(k, v)| (k.clone(), value_to_wire(v))).collect())
        }
        Value::Object(obj) => Json::Object(object_to_wire(obj)),
    }
}

fn timestamp_to_wire(t: &DateTime<Utc>) -> Number {
    Number::from(t.timestamp_millis())
}

/// Untyped JSON to internal form. Nested objects keep their wire keys.
fn plain_from_wire(value: &Json) -> Value {
    match value {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Number(n.clone()),
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::List(items.iter().map(plain_from_wire).collect()),
        Json::Object(map) => {
            Value::Map(map.iter().map(|(k, v)| (k.clone(), plain_from_wire(v))).collect())
        }
    }
}
