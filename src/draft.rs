//! Detached record edits
//!
//! A [`RecordDraft`] is a private copy of a stored record. Setters validate
//! synchronously, so invalid values are rejected before anything is sent;
//! saving PATCHes only the changed wire fields. The snapshot itself is never
//! touched: the controller echoes the change back as an update packet.

use serde_json::{Map, Value as Json};
use std::sync::Arc;

use crate::registry::{FieldKind, Object, Record, Value, wire_diff};
use crate::store::Snapshot;
use crate::types::{LedLevel, ModelKind, PercentInt, RecordingMode, VideoMode, check_range};
use crate::{ProtectError, Result};

#[derive(Debug, Clone)]
pub struct RecordDraft {
    original: Arc<Record>,
    edited: Record,
}

impl RecordDraft {
    pub fn new(record: Arc<Record>) -> Self {
        let edited = (*record).clone();
        Self { original: record, edited }
    }

    pub fn kind(&self) -> ModelKind {
        self.edited.kind()
    }

    pub fn id(&self) -> Option<&str> {
        self.edited.id()
    }

    /// The record as edited so far.
    pub fn record(&self) -> &Record {
        &self.edited
    }

    pub fn original(&self) -> &Arc<Record> {
        &self.original
    }

    /// Changed fields in wire form; empty when nothing changed.
    pub fn wire_diff(&self) -> Map<String, Json> {
        wire_diff(&self.original.to_wire(), &self.edited.to_wire())
    }

    /// REST path the diff is sent to.
    pub fn api_path(&self) -> Result<String> {
        let id = self.id().ok_or_else(|| ProtectError::bad_request(format!("{} record has no id", self.kind())))?;
        Ok(self.kind().api_path(id))
    }

    /// Set a field by dotted internal path, e.g. `isp_settings.zoom_position`.
    ///
    /// Range-constrained fields are validated; missing declared nested objects
    /// are created.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        set_in(self.edited.object_mut(), path, value.into())
    }

    fn require_kind(&self, kind: ModelKind) -> Result<()> {
        if self.kind() == kind {
            return Ok(());
        }
        Err(ProtectError::bad_request(format!("Expected a {} record, got {}", kind, self.kind())))
    }

    fn require_flag(&self, flag: &str) -> Result<()> {
        let path = format!("feature_flags.{}", flag);
        match self.edited.get_path(&path).and_then(Value::as_bool) {
            Some(true) => Ok(()),
            _ => Err(ProtectError::bad_request(format!(
                "{} {} does not support this setting ({} is not set)",
                self.kind(),
                self.id().unwrap_or("<unknown>"),
                flag
            ))),
        }
    }

    // Camera

    pub fn set_mic_volume(&mut self, level: PercentInt) -> Result<()> {
        self.require_kind(ModelKind::Camera)?;
        self.require_flag("has_mic")?;
        self.set("mic_volume", i64::from(level))
    }

    pub fn set_recording_mode(&mut self, mode: RecordingMode) -> Result<()> {
        self.require_kind(ModelKind::Camera)?;
        self.set("recording_settings.mode", mode.as_str())
    }

    /// Camera status LED. Turning it on also stops blinking.
    pub fn set_camera_status_light(&mut self, enabled: bool) -> Result<()> {
        self.require_kind(ModelKind::Camera)?;
        self.require_flag("has_led_status")?;
        self.set("led_settings.is_enabled", enabled)?;
        self.set("led_settings.blink_rate", 0i64)
    }

    pub fn set_hdr(&mut self, enabled: bool) -> Result<()> {
        self.require_kind(ModelKind::Camera)?;
        self.require_flag("has_hdr")?;
        self.set("hdr_mode", enabled)
    }

    pub fn set_video_mode(&mut self, mode: VideoMode) -> Result<()> {
        self.require_kind(ModelKind::Camera)?;
        let supported = self
            .edited
            .get_path("feature_flags.video_modes")
            .is_some_and(|modes| modes.str_items().any(|m| m == mode.as_str()));
        if !supported {
            return Err(ProtectError::bad_request(format!("Camera does not support video mode {}", mode.as_str())));
        }
        self.set("video_mode", mode.as_str())
    }

    pub fn set_camera_zoom(&mut self, level: PercentInt) -> Result<()> {
        self.require_kind(ModelKind::Camera)?;
        self.set("isp_settings.zoom_position", i64::from(level))
    }

    // Light

    /// Status indicator on a camera or light.
    pub fn set_status_light(&mut self, enabled: bool) -> Result<()> {
        match self.kind() {
            ModelKind::Camera => self.set_camera_status_light(enabled),
            ModelKind::Light => self.set("light_device_settings.is_indicator_enabled", enabled),
            other => Err(ProtectError::bad_request(format!("{} records have no status light", other))),
        }
    }

    pub fn set_led_level(&mut self, level: LedLevel) -> Result<()> {
        self.require_kind(ModelKind::Light)?;
        self.set("light_device_settings.led_level", i64::from(level))
    }

    /// Force the light on or off, optionally changing brightness.
    pub fn set_light(&mut self, enabled: bool, level: Option<LedLevel>) -> Result<()> {
        self.require_kind(ModelKind::Light)?;
        self.set("light_on_settings.is_led_force_on", enabled)?;
        match level {
            Some(level) => self.set_led_level(level),
            None => Ok(()),
        }
    }

    // Viewer

    pub fn set_liveview(&mut self, snapshot: &Snapshot, liveview_id: &str) -> Result<()> {
        self.require_kind(ModelKind::Viewer)?;
        if snapshot.get(ModelKind::Liveview, liveview_id).is_none() {
            return Err(ProtectError::bad_request(format!("Unknown liveview {}", liveview_id)));
        }
        self.set("liveview_id", liveview_id)
    }
}

fn set_in(object: &mut Object, path: &str, value: Value) -> Result<()> {
    let Some((head, rest)) = path.split_once('.') else {
        check_value(object, path, &value)?;
        object.insert(path, value);
        return Ok(());
    };

    if !object.fields().contains_key(head) {
        match object.schema().field_kind(head) {
            Some(FieldKind::Object(schema) | FieldKind::ObjectOrEmpty(schema)) => {
                object.insert(head, Value::Object(Object::new(schema)));
            }
            _ => return Err(ProtectError::bad_request(format!("No nested object '{}'", head))),
        }
    }

    if matches!(object.get(head), Some(Value::Null)) {
        let Some(FieldKind::ObjectOrEmpty(schema)) = object.schema().field_kind(head) else {
            return Err(ProtectError::bad_request(format!("'{}' is null", head)));
        };
        let mut inner = Object::new(schema);
        set_in(&mut inner, rest, value)?;
        object.insert(head, Value::Object(inner));
        return Ok(());
    }

    match object.fields_mut().get_mut(head) {
        Some(Value::Object(inner)) => set_in(inner, rest, value),
        _ => Err(ProtectError::bad_request(format!("'{}' is not a nested object", head))),
    }
}

fn check_value(object: &Object, key: &str, value: &Value) -> Result<()> {
    if object.schema().is_internal_only(key) {
        return Err(ProtectError::bad_request(format!("'{}' is derived locally and cannot be set", key)));
    }
    if let Some(FieldKind::Ranged { min, max }) = object.schema().field_kind(key) {
        let number = value
            .as_i64()
            .ok_or_else(|| ProtectError::validation(key, format!("expected an integer, got {:?}", value)))?;
        check_range(key, number, min, max)?;
    }
    Ok(())
}
