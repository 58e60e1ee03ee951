//! Change notifications emitted after a packet is applied

use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::registry::{Record, Value};
use crate::types::ModelKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    Add,
    Update,
}

/// One applied mutation.
///
/// `old` is the record as it was before the update and is never modified
/// afterwards; `changed` holds the changed fields in internal form, nested
/// objects reduced to their changed sub-fields.
#[derive(Debug, Clone)]
pub struct ChangeNotification {
    pub action: ChangeAction,
    pub kind: ModelKind,
    pub id: Option<String>,
    pub old: Option<Arc<Record>>,
    pub new: Arc<Record>,
    pub changed: BTreeMap<String, Value>,
    pub update_id: Uuid,
}

impl ChangeNotification {
    /// Top-level names of the changed fields.
    pub fn changed_fields(&self) -> impl Iterator<Item = &str> {
        self.changed.keys().map(String::as_str)
    }
}
