//! Declarative field mapping tables

use std::fmt;

/// Wire encoding of a declared field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Milliseconds since the Unix epoch.
    Timestamp,
    /// Duration in milliseconds.
    DurationMs,
    /// Duration in seconds.
    DurationSecs,
    /// IP address string.
    Ip,
    /// Integer constrained to `min..=max`.
    Ranged { min: i64, max: i64 },
    /// Nested object with its own schema.
    Object(&'static Schema),
    /// Nested object where the wire sentinel `{}` means "unset".
    ObjectOrEmpty(&'static Schema),
    /// List of nested objects.
    List(&'static Schema),
    /// String-keyed map of nested objects.
    Map(&'static Schema),
}

/// Field mapping for one record kind or nested object type.
///
/// Schemas compose through `parent`: lookups consult the schema's own tables
/// first, then the parent chain.
pub struct Schema {
    pub name: &'static str,
    pub parent: Option<&'static Schema>,
    /// `(wire_key, internal_key)` renames.
    pub remaps: &'static [(&'static str, &'static str)],
    /// Fields with a non-JSON internal representation, by internal key.
    pub fields: &'static [(&'static str, FieldKind)],
    /// Derived fields that never appear on the wire.
    pub internal_only: &'static [&'static str],
}

impl Schema {
    pub const fn plain(name: &'static str) -> Self {
        Self { name, parent: None, remaps: &[], fields: &[], internal_only: &[] }
    }

    fn chain(&self) -> impl Iterator<Item = &Schema> {
        std::iter::successors(Some(self), |schema| schema.parent)
    }

    pub fn field_kind(&self, internal_key: &str) -> Option<FieldKind> {
        self.chain()
            .flat_map(|schema| schema.fields.iter())
            .find(|(key, _)| *key == internal_key)
            .map(|(_, kind)| *kind)
    }

    pub fn remap_to_internal(&self, wire_key: &str) -> Option<&'static str> {
        self.chain()
            .flat_map(|schema| schema.remaps.iter())
            .find(|(wire, _)| *wire == wire_key)
            .map(|(_, internal)| *internal)
    }

    pub fn remap_to_wire(&self, internal_key: &str) -> Option<&'static str> {
        self.chain()
            .flat_map(|schema| schema.remaps.iter())
            .find(|(_, internal)| *internal == internal_key)
            .map(|(wire, _)| *wire)
    }

    pub fn is_internal_only(&self, internal_key: &str) -> bool {
        self.chain().any(|schema| schema.internal_only.contains(&internal_key))
    }

    /// Whether this schema is `other` or inherits from it.
    pub fn extends(&self, other: &Schema) -> bool {
        self.chain().any(|schema| std::ptr::eq(schema, other))
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Schema").field(&self.name).finish()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || self.name == other.name
    }
}
