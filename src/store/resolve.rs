//! Cross-record lookups
//!
//! Records hold foreign keys as plain IDs; these helpers follow them through
//! the snapshot. A dangling ID resolves to `None` (or is skipped in lists).

use std::sync::Arc;

use super::Snapshot;
use crate::registry::{Record, Value};
use crate::types::ModelKind;

impl Snapshot {
    fn follow(&self, record: &Record, key: &str, target: ModelKind) -> Option<&Arc<Record>> {
        self.get(target, record.get_str(key)?)
    }

    /// Camera an event was recorded on.
    pub fn event_camera(&self, event: &Record) -> Option<&Arc<Record>> {
        self.follow(event, "camera_id", ModelKind::Camera)
    }

    /// User that triggered an event, e.g. for access events.
    pub fn event_user(&self, event: &Record) -> Option<&Arc<Record>> {
        self.follow(event, "user_id", ModelKind::User)
    }

    pub fn last_motion_event(&self, camera_id: &str) -> Option<&Arc<Record>> {
        self.camera_event(camera_id, "last_motion_event_id")
    }

    pub fn last_ring_event(&self, camera_id: &str) -> Option<&Arc<Record>> {
        self.camera_event(camera_id, "last_ring_event_id")
    }

    pub fn last_smart_detect_event(&self, camera_id: &str) -> Option<&Arc<Record>> {
        self.camera_event(camera_id, "last_smart_detect_event_id")
    }

    fn camera_event(&self, camera_id: &str, key: &str) -> Option<&Arc<Record>> {
        let event_id = self.field(ModelKind::Camera, camera_id, key)?.as_str()?;
        self.events.get(event_id)
    }

    /// Bridge a device is paired through.
    pub fn bridge_of(&self, device: &Record) -> Option<&Arc<Record>> {
        self.follow(device, "bridge_id", ModelKind::Bridge)
    }

    /// Camera paired with a light or sensor.
    pub fn camera_of(&self, device: &Record) -> Option<&Arc<Record>> {
        self.follow(device, "camera_id", ModelKind::Camera)
    }

    /// Liveview shown on a viewer.
    pub fn liveview_of(&self, viewer: &Record) -> Option<&Arc<Record>> {
        self.follow(viewer, "liveview_id", ModelKind::Liveview)
    }

    /// User owning a liveview.
    pub fn owner_of(&self, liveview: &Record) -> Option<&Arc<Record>> {
        self.follow(liveview, "owner_id", ModelKind::User)
    }

    /// Cameras of one liveview slot, skipping IDs that are no longer known.
    pub fn slot_cameras(&self, liveview: &Record, slot: usize) -> Vec<&Arc<Record>> {
        liveview
            .get("slots")
            .and_then(Value::as_list)
            .and_then(|slots| slots.get(slot))
            .and_then(|slot| slot.get("camera_ids"))
            .map(|ids| ids.str_items().filter_map(|id| self.get(ModelKind::Camera, id)).collect())
            .unwrap_or_default()
    }

    /// Groups a user belongs to, skipping unknown IDs.
    pub fn groups_of(&self, user: &Record) -> Vec<&Arc<Record>> {
        user.get("group_ids")
            .map(|ids| ids.str_items().filter_map(|id| self.get(ModelKind::Group, id)).collect())
            .unwrap_or_default()
    }

    /// Chimes that ring for a doorbell camera.
    pub fn chimes_of(&self, camera_id: &str) -> Vec<&Arc<Record>> {
        self.records(ModelKind::Chime)
            .filter(|chime| chime.get("camera_ids").is_some_and(|ids| ids.str_items().any(|id| id == camera_id)))
            .collect()
    }

    /// The user the session is authenticated as.
    pub fn auth_user(&self) -> Option<&Arc<Record>> {
        let id = self.extra("authUserId")?.as_str()?;
        self.get(ModelKind::User, id)
    }
}
