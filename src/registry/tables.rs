//! Schemas for every record kind and the nested objects they declare

use super::schema::{FieldKind, Schema};
use crate::types::{LedLevel, PercentInt};

const PERCENT: FieldKind = FieldKind::Ranged { min: PercentInt::MIN, max: PercentInt::MAX };
const LED_LEVEL: FieldKind = FieldKind::Ranged { min: LedLevel::MIN, max: LedLevel::MAX };

// Shared base chain

pub static BASE: Schema = Schema {
    name: "base",
    parent: None,
    remaps: &[("modelKey", "model")],
    fields: &[],
    internal_only: &[],
};

pub static DEVICE: Schema = Schema {
    name: "device",
    parent: Some(&BASE),
    remaps: &[],
    fields: &[
        ("host", FieldKind::Ip),
        ("up_since", FieldKind::Timestamp),
        ("uptime", FieldKind::DurationMs),
        ("last_seen", FieldKind::Timestamp),
    ],
    internal_only: &[],
};

pub static ADOPTABLE: Schema = Schema {
    name: "adoptable",
    parent: Some(&DEVICE),
    remaps: &[("bridge", "bridge_id")],
    fields: &[
        ("connection_host", FieldKind::Ip),
        ("connected_since", FieldKind::Timestamp),
    ],
    internal_only: &[],
};

pub static MOTION_DEVICE: Schema = Schema {
    name: "motion_device",
    parent: Some(&ADOPTABLE),
    remaps: &[],
    fields: &[("last_motion", FieldKind::Timestamp)],
    internal_only: &["last_motion_event_id"],
};

// Camera

static CAMERA_CHANNEL: Schema = Schema::plain("camera_channel");

static ISP_SETTINGS: Schema = Schema {
    name: "isp_settings",
    parent: None,
    remaps: &[],
    fields: &[("zoom_position", PERCENT)],
    internal_only: &[],
};

static RECORDING_SETTINGS: Schema = Schema {
    name: "recording_settings",
    parent: None,
    remaps: &[("prePaddingSecs", "pre_padding"), ("postPaddingSecs", "post_padding")],
    fields: &[
        ("pre_padding", FieldKind::DurationSecs),
        ("post_padding", FieldKind::DurationSecs),
        ("min_motion_event_trigger", FieldKind::DurationSecs),
        ("end_motion_event_delay", FieldKind::DurationSecs),
    ],
    internal_only: &[],
};

static LCD_MESSAGE: Schema = Schema {
    name: "lcd_message",
    parent: None,
    remaps: &[],
    fields: &[("reset_at", FieldKind::Timestamp)],
    internal_only: &[],
};

static TALKBACK_SETTINGS: Schema = Schema {
    name: "talkback_settings",
    parent: None,
    remaps: &[],
    fields: &[("bind_addr", FieldKind::Ip)],
    internal_only: &[],
};

static CAMERA_FEATURE_FLAGS: Schema = Schema {
    name: "camera_feature_flags",
    parent: None,
    remaps: &[("hasAutoICROnly", "has_auto_icr_only")],
    fields: &[],
    internal_only: &[],
};

static LED_SETTINGS: Schema = Schema::plain("led_settings");

static SPEAKER_SETTINGS: Schema = Schema {
    name: "speaker_settings",
    parent: None,
    remaps: &[],
    fields: &[("volume", PERCENT)],
    internal_only: &[],
};

static MOTION_ZONE: Schema = Schema {
    name: "motion_zone",
    parent: None,
    remaps: &[],
    fields: &[("sensitivity", PERCENT)],
    internal_only: &[],
};

static VIDEO_STATS: Schema = Schema {
    name: "video_stats",
    parent: None,
    remaps: &[
        ("recordingStartLQ", "recording_start_lq"),
        ("recordingEndLQ", "recording_end_lq"),
        ("timelapseStartLQ", "timelapse_start_lq"),
        ("timelapseEndLQ", "timelapse_end_lq"),
    ],
    fields: &[
        ("recording_start", FieldKind::Timestamp),
        ("recording_end", FieldKind::Timestamp),
        ("recording_start_lq", FieldKind::Timestamp),
        ("recording_end_lq", FieldKind::Timestamp),
        ("timelapse_start", FieldKind::Timestamp),
        ("timelapse_end", FieldKind::Timestamp),
        ("timelapse_start_lq", FieldKind::Timestamp),
        ("timelapse_end_lq", FieldKind::Timestamp),
    ],
    internal_only: &[],
};

static CAMERA_STATS: Schema = Schema {
    name: "camera_stats",
    parent: None,
    remaps: &[],
    fields: &[("video", FieldKind::Object(&VIDEO_STATS)), ("wifi_quality", PERCENT)],
    internal_only: &[],
};

pub static CAMERA: Schema = Schema {
    name: "camera",
    parent: Some(&MOTION_DEVICE),
    remaps: &[],
    fields: &[
        ("last_ring", FieldKind::Timestamp),
        ("mic_volume", PERCENT),
        ("channels", FieldKind::List(&CAMERA_CHANNEL)),
        ("isp_settings", FieldKind::Object(&ISP_SETTINGS)),
        ("recording_settings", FieldKind::Object(&RECORDING_SETTINGS)),
        ("lcd_message", FieldKind::ObjectOrEmpty(&LCD_MESSAGE)),
        ("talkback_settings", FieldKind::Object(&TALKBACK_SETTINGS)),
        ("feature_flags", FieldKind::Object(&CAMERA_FEATURE_FLAGS)),
        ("led_settings", FieldKind::Object(&LED_SETTINGS)),
        ("speaker_settings", FieldKind::Object(&SPEAKER_SETTINGS)),
        ("motion_zones", FieldKind::List(&MOTION_ZONE)),
        ("smart_detect_zones", FieldKind::List(&MOTION_ZONE)),
        ("stats", FieldKind::Object(&CAMERA_STATS)),
    ],
    internal_only: &["last_ring_event_id", "last_smart_detect", "last_smart_detect_event_id"],
};

// Light

static LIGHT_DEVICE_SETTINGS: Schema = Schema {
    name: "light_device_settings",
    parent: None,
    remaps: &[],
    fields: &[
        ("pir_duration", FieldKind::DurationMs),
        ("led_level", LED_LEVEL),
        ("pir_sensitivity", PERCENT),
    ],
    internal_only: &[],
};

static LIGHT_ON_SETTINGS: Schema = Schema::plain("light_on_settings");

static LIGHT_MODE_SETTINGS: Schema = Schema::plain("light_mode_settings");

pub static LIGHT: Schema = Schema {
    name: "light",
    parent: Some(&MOTION_DEVICE),
    remaps: &[("camera", "camera_id")],
    fields: &[
        ("light_device_settings", FieldKind::Object(&LIGHT_DEVICE_SETTINGS)),
        ("light_on_settings", FieldKind::Object(&LIGHT_ON_SETTINGS)),
        ("light_mode_settings", FieldKind::Object(&LIGHT_MODE_SETTINGS)),
    ],
    internal_only: &[],
};

// Sensor

static SENSOR_BATTERY_STATUS: Schema = Schema {
    name: "sensor_battery_status",
    parent: None,
    remaps: &[],
    fields: &[("percentage", PERCENT)],
    internal_only: &[],
};

static SENSOR_SENSITIVITY_SETTINGS: Schema = Schema {
    name: "sensor_sensitivity_settings",
    parent: None,
    remaps: &[],
    fields: &[("sensitivity", PERCENT)],
    internal_only: &[],
};

pub static SENSOR: Schema = Schema {
    name: "sensor",
    parent: Some(&ADOPTABLE),
    remaps: &[("camera", "camera_id")],
    fields: &[
        ("alarm_triggered_at", FieldKind::Timestamp),
        ("leak_detected_at", FieldKind::Timestamp),
        ("motion_detected_at", FieldKind::Timestamp),
        ("open_status_changed_at", FieldKind::Timestamp),
        ("tampering_detected_at", FieldKind::Timestamp),
        ("battery_status", FieldKind::Object(&SENSOR_BATTERY_STATUS)),
        ("motion_settings", FieldKind::Object(&SENSOR_SENSITIVITY_SETTINGS)),
    ],
    internal_only: &[],
};

// Other adoptable devices

pub static VIEWER: Schema = Schema {
    name: "viewer",
    parent: Some(&ADOPTABLE),
    remaps: &[("liveview", "liveview_id")],
    fields: &[],
    internal_only: &[],
};

pub static BRIDGE: Schema = Schema {
    name: "bridge",
    parent: Some(&ADOPTABLE),
    remaps: &[],
    fields: &[],
    internal_only: &[],
};

pub static CHIME: Schema = Schema {
    name: "chime",
    parent: Some(&ADOPTABLE),
    remaps: &[],
    fields: &[("last_ring", FieldKind::Timestamp)],
    internal_only: &[],
};

// Users and groups

pub static USER_LOCATION: Schema = Schema {
    name: "user_location",
    parent: Some(&BASE),
    remaps: &[],
    fields: &[],
    internal_only: &[],
};

pub static CLOUD_ACCOUNT: Schema = Schema {
    name: "cloud_account",
    parent: Some(&BASE),
    remaps: &[("user", "user_id")],
    fields: &[("location", FieldKind::Object(&USER_LOCATION))],
    internal_only: &[],
};

pub static USER: Schema = Schema {
    name: "user",
    parent: Some(&BASE),
    remaps: &[("groups", "group_ids")],
    fields: &[
        ("last_login_time", FieldKind::Timestamp),
        ("location", FieldKind::Object(&USER_LOCATION)),
        ("cloud_account", FieldKind::Object(&CLOUD_ACCOUNT)),
    ],
    internal_only: &[],
};

pub static GROUP: Schema = Schema {
    name: "group",
    parent: Some(&BASE),
    remaps: &[],
    fields: &[],
    internal_only: &[],
};

static LIVEVIEW_SLOT: Schema = Schema {
    name: "liveview_slot",
    parent: None,
    remaps: &[("cameras", "camera_ids")],
    fields: &[],
    internal_only: &[],
};

pub static LIVEVIEW: Schema = Schema {
    name: "liveview",
    parent: Some(&BASE),
    remaps: &[("owner", "owner_id")],
    fields: &[("slots", FieldKind::List(&LIVEVIEW_SLOT))],
    internal_only: &[],
};

// NVR

static PORT_CONFIG: Schema = Schema {
    name: "port_config",
    parent: None,
    remaps: &[("emsCLI", "ems_cli"), ("emsLiveFLV", "ems_live_flv")],
    fields: &[],
    internal_only: &[],
};

static DOORBELL_SETTINGS: Schema = Schema {
    name: "doorbell_settings",
    parent: None,
    remaps: &[("defaultMessageResetTimeoutMs", "default_message_reset_timeout")],
    fields: &[("default_message_reset_timeout", FieldKind::DurationMs)],
    internal_only: &[],
};

static NVR_STORAGE_STATS: Schema = Schema {
    name: "nvr_storage_stats",
    parent: None,
    remaps: &[],
    fields: &[
        ("capacity", FieldKind::DurationMs),
        ("remaining_capacity", FieldKind::DurationMs),
    ],
    internal_only: &[],
};

static NVR_LOCATION: Schema = Schema {
    name: "nvr_location",
    parent: Some(&USER_LOCATION),
    remaps: &[],
    fields: &[],
    internal_only: &[],
};

pub static NVR: Schema = Schema {
    name: "nvr",
    parent: Some(&DEVICE),
    remaps: &[("recordingRetentionDurationMs", "recording_retention_duration")],
    fields: &[
        ("last_update_at", FieldKind::Timestamp),
        ("recording_retention_duration", FieldKind::DurationMs),
        ("ports", FieldKind::Object(&PORT_CONFIG)),
        ("doorbell_settings", FieldKind::Object(&DOORBELL_SETTINGS)),
        ("storage_stats", FieldKind::Object(&NVR_STORAGE_STATS)),
        ("location_settings", FieldKind::Object(&NVR_LOCATION)),
    ],
    internal_only: &[],
};

// Events

static EVENT_METADATA: Schema = Schema::plain("event_metadata");

pub static EVENT: Schema = Schema {
    name: "event",
    parent: Some(&BASE),
    remaps: &[
        ("camera", "camera_id"),
        ("heatmap", "heatmap_id"),
        ("user", "user_id"),
        ("thumbnail", "thumbnail_id"),
        ("smartDetectEvents", "smart_detect_event_ids"),
    ],
    fields: &[
        ("start", FieldKind::Timestamp),
        ("end", FieldKind::Timestamp),
        ("timestamp", FieldKind::Timestamp),
        ("metadata", FieldKind::Object(&EVENT_METADATA)),
    ],
    internal_only: &[],
};
