//! In-memory snapshot of the controller state.
//!
//! A [`Snapshot`] is built once from the bootstrap document and then mutated
//! only by [`Snapshot::apply_packet`], in receipt order. Records are stored as
//! `Arc<Record>` and never modified in place: every update installs a new
//! record, so the previous value handed to observers stays intact.
//!
//! Events are kept in a bounded [`EventHistory`]; all other collections grow
//! with the number of devices on the controller.

mod events;
mod notification;
mod resolve;

pub use events::EventHistory;
pub use notification::{ChangeAction, ChangeNotification};

use serde::Deserialize;
use serde_json::{Map, Value as Json};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::registry::{Record, Value, delta, merge};
use crate::types::{EventType, MAX_EVENT_HISTORY_IN_STATE_MACHINE, ModelKind};
use crate::wire::{Action, WsPacket};
use crate::{ProtectError, Result};

/// Records of one kind in bootstrap order.
#[derive(Debug, Clone, Default)]
struct Collection {
    order: Vec<String>,
    items: HashMap<String, Arc<Record>>,
}

impl Collection {
    fn insert(&mut self, id: String, record: Arc<Record>) {
        if self.items.insert(id.clone(), record).is_none() {
            self.order.push(id);
        }
    }

    fn iter(&self) -> impl Iterator<Item = &Arc<Record>> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BootstrapHeader {
    nvr: Map<String, Json>,
    last_update_id: Uuid,
}

/// The aggregate root: every known record plus recent events.
#[derive(Debug, Clone)]
pub struct Snapshot {
    collections: BTreeMap<ModelKind, Collection>,
    nvr: Arc<Record>,
    events: EventHistory,
    /// Top-level bootstrap keys that are not record collections.
    extra: Map<String, Json>,
    last_update_id: Uuid,
    subscribed_kinds: Option<BTreeSet<ModelKind>>,
}

impl Snapshot {
    /// Build a snapshot from a bootstrap document.
    ///
    /// Any record that fails to convert fails the whole bootstrap.
    pub fn from_wire(bootstrap: &Map<String, Json>) -> Result<Self> {
        Self::from_wire_with_capacity(bootstrap, MAX_EVENT_HISTORY_IN_STATE_MACHINE)
    }

    pub fn from_wire_with_capacity(bootstrap: &Map<String, Json>, event_capacity: usize) -> Result<Self> {
        let header = BootstrapHeader::deserialize(Json::Object(bootstrap.clone()))
            .map_err(|e| ProtectError::json("bootstrap", e))?;
        let nvr = Arc::new(Record::from_wire(&header.nvr, Some(ModelKind::Nvr))?);

        let mut collections = BTreeMap::new();
        let mut extra = Map::new();
        for (key, value) in bootstrap {
            if key == "nvr" || key == "lastUpdateId" {
                continue;
            }

            let kind = ModelKind::BOOTSTRAP_COLLECTIONS
                .iter()
                .copied()
                .find(|kind| kind.collection_key() == Some(key.as_str()));
            let (Some(kind), Json::Array(items)) = (kind, value) else {
                extra.insert(key.clone(), value.clone());
                continue;
            };

            let mut collection = Collection::default();
            for item in items {
                let data = item.as_object().ok_or_else(|| {
                    ProtectError::packet_decode(format!("Bootstrap '{}' entry is not an object", key))
                })?;
                let record = Record::from_wire(data, Some(kind))?;
                let id = record
                    .id()
                    .ok_or_else(|| ProtectError::packet_decode(format!("Bootstrap '{}' entry has no id", key)))?
                    .to_string();
                collection.insert(id, Arc::new(record));
            }
            collections.insert(kind, collection);
        }

        debug!(
            "Bootstrap loaded: {} collections, {} records, last_update_id={}",
            collections.len(),
            collections.values().map(|c| c.items.len()).sum::<usize>(),
            header.last_update_id
        );

        Ok(Self {
            collections,
            nvr,
            events: EventHistory::new(event_capacity),
            extra,
            last_update_id: header.last_update_id,
            subscribed_kinds: None,
        })
    }

    /// Bootstrap-shaped dictionary of the current state, without the event history.
    pub fn to_wire(&self) -> Map<String, Json> {
        let mut out = self.extra.clone();
        for (kind, collection) in &self.collections {
            if let Some(key) = kind.collection_key() {
                let items = collection.iter().map(|r| Json::Object(r.to_wire())).collect();
                out.insert(key.to_string(), Json::Array(items));
            }
        }
        out.insert("nvr".to_string(), Json::Object(self.nvr.to_wire()));
        out.insert("lastUpdateId".to_string(), Json::String(self.last_update_id.to_string()));
        out
    }

    /// Restrict applied packets to these kinds. `None` applies everything.
    pub fn set_subscribed_kinds(&mut self, kinds: Option<BTreeSet<ModelKind>>) {
        self.subscribed_kinds = kinds;
    }

    pub fn last_update_id(&self) -> Uuid {
        self.last_update_id
    }

    pub fn nvr(&self) -> &Arc<Record> {
        &self.nvr
    }

    pub fn events(&self) -> &EventHistory {
        &self.events
    }

    /// Top-level bootstrap value that is not a record collection, e.g. `authUserId`.
    pub fn extra(&self, key: &str) -> Option<&Json> {
        self.extra.get(key)
    }

    /// Look up a record by kind and ID.
    pub fn get(&self, kind: ModelKind, id: &str) -> Option<&Arc<Record>> {
        match kind {
            ModelKind::Event => self.events.get(id),
            ModelKind::Nvr => (self.nvr.id() == Some(id)).then_some(&self.nvr),
            _ => self.collections.get(&kind)?.items.get(id),
        }
    }

    /// All records of a kind in insertion order.
    pub fn records(&self, kind: ModelKind) -> Box<dyn Iterator<Item = &Arc<Record>> + '_> {
        match kind {
            ModelKind::Event => Box::new(self.events.iter()),
            ModelKind::Nvr => Box::new(std::iter::once(&self.nvr)),
            _ => match self.collections.get(&kind) {
                Some(collection) => Box::new(collection.iter()),
                None => Box::new(std::iter::empty()),
            },
        }
    }

    /// Apply one update packet.
    ///
    /// Returns the resulting notification, or `None` when the packet was
    /// filtered, targeted an unknown record, or changed nothing.
    pub fn apply_packet(&mut self, packet: &WsPacket) -> Result<Option<ChangeNotification>> {
        let header = packet.header()?;
        self.last_update_id = header.new_update_id;

        let kind = header.model_key.parse::<ModelKind>()?;

        if let Some(kinds) = &self.subscribed_kinds {
            if !kinds.contains(&kind) {
                trace!(kind = %kind, "Ignoring packet for unsubscribed kind");
                return Ok(None);
            }
        }

        match header.action {
            Action::Add => self.apply_add(kind, header.id, header.new_update_id, packet.data()?),
            Action::Update => {
                self.apply_update(kind, header.id, header.new_update_id, packet.data()?)
            }
            Action::Other(action) => {
                debug!(kind = %kind, update_id = %header.new_update_id, "Ignoring unsupported action '{}'", action);
                Ok(None)
            }
        }
    }

    fn apply_add(
        &mut self,
        kind: ModelKind,
        header_id: Option<String>,
        update_id: Uuid,
        data: &Map<String, Json>,
    ) -> Result<Option<ChangeNotification>> {
        let record = Record::from_wire(data, Some(kind))?;
        let kind = record.kind();
        let id = record.id().map(str::to_string).or(header_id);
        let record = Arc::new(record);

        match (kind, &id) {
            (ModelKind::Nvr, _) => self.nvr = record.clone(),
            (ModelKind::Event, Some(id)) => {
                self.process_event(&record);
                self.events.insert(id.clone(), record.clone());
            }
            (kind, Some(id)) if kind.collection_key().is_some() => {
                self.collections.entry(kind).or_default().insert(id.clone(), record.clone());
            }
            (kind, _) => {
                debug!("Ignoring add for {} without a collection or id", kind);
                return Ok(None);
            }
        }

        debug!(kind = %kind, id = ?id, update_id = %update_id, "Record added");
        let changed = record.object().fields().clone();
        Ok(Some(ChangeNotification {
            action: ChangeAction::Add,
            kind,
            id,
            old: None,
            new: record,
            changed,
            update_id,
        }))
    }

    fn apply_update(
        &mut self,
        kind: ModelKind,
        id: Option<String>,
        update_id: Uuid,
        data: &Map<String, Json>,
    ) -> Result<Option<ChangeNotification>> {
        let existing = match (kind, id.as_deref()) {
            (ModelKind::Nvr, _) => Some(self.nvr.clone()),
            (_, Some(id)) => self.get(kind, id).cloned(),
            (_, None) => None,
        };

        let Some(old) = existing else {
            if kind != ModelKind::Event {
                warn!(kind = %kind, id = ?id, "Update for unknown record");
            }
            return Ok(None);
        };

        let patch = Record::patch_from_wire(kind, data)?;
        let mut updated = (*old).clone();
        merge(updated.object_mut().fields_mut(), patch);

        let changed = delta(old.object().fields(), updated.object().fields());
        if changed.is_empty() {
            trace!(kind = %kind, id = ?id, "Update changed nothing");
            return Ok(None);
        }

        let new = Arc::new(updated);
        match (kind, id.clone()) {
            (ModelKind::Nvr, _) => self.nvr = new.clone(),
            (ModelKind::Event, Some(id)) => {
                self.process_event(&new);
                self.events.insert(id, new.clone());
            }
            (kind, Some(id)) => {
                self.collections.entry(kind).or_default().insert(id, new.clone());
            }
            (_, None) => {}
        }

        debug!(kind = %kind, id = ?id, update_id = %update_id, "Updated {:?}", changed.keys().collect::<Vec<_>>());
        Ok(Some(ChangeNotification {
            action: ChangeAction::Update,
            kind,
            id,
            old: Some(old),
            new,
            changed,
            update_id,
        }))
    }

    /// Derive camera back-references from an event.
    fn process_event(&mut self, event: &Record) {
        let (Some(camera_id), Some(event_id), Some(event_type)) =
            (event.get_str("camera_id"), event.id(), event.event_type())
        else {
            return;
        };
        if !event_type.is_device_event() {
            return;
        }

        let Some(slot) =
            self.collections.get_mut(&ModelKind::Camera).and_then(|c| c.items.get_mut(camera_id))
        else {
            trace!("Event {} references unknown camera {}", event_id, camera_id);
            return;
        };

        let end = event.get_timestamp("end");
        let camera = Arc::make_mut(slot);
        match (event_type, end) {
            (EventType::Motion, Some(end)) => {
                camera.set("last_motion", end);
                camera.set("is_motion_detected", false);
                camera.set("last_motion_event_id", event_id);
            }
            (EventType::Motion, None) => {
                camera.set("is_motion_detected", true);
                camera.set("last_motion_event_id", event_id);
            }
            (EventType::SmartDetect, Some(end)) => {
                camera.set("last_smart_detect", end);
                camera.set("last_smart_detect_event_id", event_id);
            }
            (EventType::Ring, _) => camera.set("last_ring_event_id", event_id),
            _ => {}
        }
    }

    /// The NVR's configured timezone name, if present.
    pub fn nvr_timezone(&self) -> Option<&str> {
        self.nvr.get_str("timezone")
    }

    pub(crate) fn field(&self, kind: ModelKind, id: &str, key: &str) -> Option<&Value> {
        self.get(kind, id)?.get(key)
    }
}

#[cfg(test)]
mod tests;
