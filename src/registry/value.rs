//! Internal field values

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use super::schema::Schema;

/// Internal representation of a record field.
///
/// Declared fields carry structured values (timestamps, durations, addresses,
/// nested objects); everything else is held as plain JSON-shaped data.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Timestamp(DateTime<Utc>),
    Duration(Duration),
    Ip(IpAddr),
    List(Vec<Value>),
    /// Undeclared nested object, keys kept exactly as on the wire.
    Map(BTreeMap<String, Value>),
    /// Declared nested object, keys in internal form.
    Object(Object),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Value::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_ip(&self) -> Option<IpAddr> {
        match self {
            Value::Ip(ip) => Some(*ip),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Field or key lookup on either kind of nested object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(obj) => obj.get(key),
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Iterate string entries of a list, skipping anything else.
    pub fn str_items(&self) -> impl Iterator<Item = &str> {
        self.as_list().unwrap_or_default().iter().filter_map(Value::as_str)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u8> for Value {
    fn from(n: u8) -> Self {
        Value::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Value::Duration(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A declared object: field values keyed by internal name, tied to its schema.
#[derive(Clone)]
pub struct Object {
    schema: &'static Schema,
    fields: BTreeMap<String, Value>,
}

impl Object {
    pub fn new(schema: &'static Schema) -> Self {
        Self { schema, fields: BTreeMap::new() }
    }

    pub(crate) fn with_fields(schema: &'static Schema, fields: BTreeMap<String, Value>) -> Self {
        Self { schema, fields }
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.fields
    }

    pub(crate) fn into_fields(self) -> BTreeMap<String, Value> {
        self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Dotted-path lookup through nested objects, e.g. `isp_settings.zoom_position`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = self.fields.get(parts.next()?)?;
        parts.try_fold(first, |value, part| value.get(part))
    }

    pub(crate) fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.fields == other.fields
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object").field("schema", &self.schema.name).field("fields", &self.fields).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static NESTED: Schema = Schema::plain("nested");
    static OUTER: Schema = Schema::plain("outer");

    #[test]
    fn dotted_paths_walk_objects_and_maps() {
        let mut inner = Object::new(&NESTED);
        inner.insert("zoom_position", 10i64);

        let mut map = BTreeMap::new();
        map.insert("4K".to_string(), Value::from(4i64));

        let mut outer = Object::new(&OUTER);
        outer.insert("isp_settings", Value::Object(inner));
        outer.insert("max_camera_capacity", Value::Map(map));

        assert_eq!(outer.get_path("isp_settings.zoom_position").and_then(Value::as_i64), Some(10));
        assert_eq!(outer.get_path("max_camera_capacity.4K").and_then(Value::as_i64), Some(4));
        assert!(outer.get_path("isp_settings.missing").is_none());
        assert!(outer.get_path("").is_none());
    }

    #[test]
    fn str_items_skips_non_strings() {
        let list = Value::List(vec![Value::from("a"), Value::Null, Value::from("b")]);
        assert_eq!(list.str_items().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(Value::Null.str_items().count(), 0);
    }
}
