//! Top-level records

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;

use super::convert::{object_from_wire, object_to_wire};
use super::schema_for;
use super::value::{Object, Value};
use crate::types::{EventType, ModelKind};
use crate::{ProtectError, Result};

/// A record owned by the snapshot: a kind discriminator plus its fields.
///
/// References to other records are held as IDs and resolved through
/// [`crate::Snapshot`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: ModelKind,
    object: Object,
}

impl Record {
    /// Build a record from a full wire dictionary.
    ///
    /// The `modelKey` field decides the kind; `kind_hint` is only used when the
    /// dictionary carries no discriminator.
    pub fn from_wire(data: &Map<String, Json>, kind_hint: Option<ModelKind>) -> Result<Self> {
        let kind = match data.get("modelKey") {
            Some(Json::String(key)) => key.parse::<ModelKind>()?,
            Some(_) => return Err(ProtectError::unknown_kind(None)),
            None => kind_hint.ok_or_else(|| ProtectError::unknown_kind(None))?,
        };
        let object = object_from_wire(schema_for(kind), data)?;
        Ok(Self { kind, object })
    }

    /// Convert a partial wire dictionary of `kind` into internal fields.
    pub fn patch_from_wire(kind: ModelKind, data: &Map<String, Json>) -> Result<BTreeMap<String, Value>> {
        object_from_wire(schema_for(kind), data).map(|object| object.fields().clone())
    }

    /// Full wire dictionary, without internal-only fields.
    pub fn to_wire(&self) -> Map<String, Json> {
        object_to_wire(&self.object)
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn id(&self) -> Option<&str> {
        self.object.get("id").and_then(Value::as_str)
    }

    pub fn object(&self) -> &Object {
        &self.object
    }

    pub(crate) fn object_mut(&mut self) -> &mut Object {
        &mut self.object
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.object.get(key)
    }

    pub fn get_path(&self, path: &str) -> Option<&Value> {
        self.object.get_path(path)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        self.get(key).and_then(Value::as_timestamp)
    }

    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    /// Event type of an event record.
    pub fn event_type(&self) -> Option<EventType> {
        match self.kind {
            ModelKind::Event => self.get_str("type").map(EventType::from),
            _ => None,
        }
    }

    pub(crate) fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.object.insert(key, value);
    }
}
