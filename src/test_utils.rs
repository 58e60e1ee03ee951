//! Shared fixtures for unit tests and benchmarks
//!
//! Sample wire dictionaries for every record kind, a bootstrap document that
//! references them, and builders for update packets.

#![cfg(any(test, feature = "benchmark"))]

use serde_json::{Value as Json, json};
use uuid::Uuid;

use crate::types::ModelKind;
use crate::wire::{Frame, WsPacket};

/// Camera that the scenario tests update.
pub const CAMERA_ID: &str = "cam-1";
/// Second camera, without mic, HDR or status light support.
pub const DOORBELL_ID: &str = "7c9557df62c5a32bd7ecf3fe";
pub const LIGHT_ID: &str = "light-1";
pub const SENSOR_ID: &str = "sensor-1";
pub const VIEWER_ID: &str = "viewer-1";
pub const BRIDGE_ID: &str = "bridge-1";
pub const CHIME_ID: &str = "chime-1";
pub const USER_ID: &str = "user-1";
pub const GROUP_ID: &str = "group-1";
pub const LIVEVIEW_ID: &str = "liveview-1";
pub const BOOTSTRAP_UPDATE_ID: &str = "ebf25bac-d5a1-4f1d-a0ee-74c15981eb70";

fn adoptable(kind: &str, id: &str, name: &str, device_type: &str, host: Json) -> Json {
    json!({
        "modelKey": kind,
        "id": id,
        "name": name,
        "type": device_type,
        "mac": "F4E2C6000001",
        "host": host,
        "upSince": 1632000000000i64,
        "uptime": 106606652,
        "lastSeen": 1632106606652i64,
        "hardwareRevision": "11",
        "firmwareVersion": "4.38.3",
        "isUpdating": false,
        "isSshEnabled": true,
        "state": "CONNECTED",
        "connectionHost": "192.168.1.1",
        "connectedSince": 1632000001000i64,
        "isAdopted": true,
        "isConnected": true
    })
}

fn extend(mut base: Json, extra: Json) -> Json {
    if let (Some(base), Json::Object(extra)) = (base.as_object_mut(), extra) {
        base.extend(extra);
    }
    base
}

/// Doorbell camera with every declared nested object populated.
pub fn sample_camera() -> Json {
    extend(
        adoptable("camera", CAMERA_ID, "Front Door", "UVC G4 Doorbell", json!("192.168.1.21")),
        json!({
            "lastMotion": 1632106000000i64,
            "isDark": false,
            "isMotionDetected": false,
            "micVolume": 100,
            "lastRing": 1632105000000i64,
            "isRecording": true,
            "hdrMode": true,
            "videoMode": "default",
            "channels": [
                {"id": 0, "videoId": "video1", "name": "High", "enabled": true, "isRtspEnabled": true,
                 "rtspAlias": null, "width": 1600, "height": 1200, "fps": 30, "bitrate": 3000000}
            ],
            "ispSettings": {"aeMode": "auto", "irLedMode": "auto", "irLedLevel": 255, "wdr": 1,
                            "zoomPosition": 0, "focusMode": "ztrig", "brightness": 50},
            "recordingSettings": {"prePaddingSecs": 2, "postPaddingSecs": 2, "minMotionEventTrigger": 1000,
                                  "endMotionEventDelay": 3000, "suppressIlluminationSurge": false,
                                  "mode": "detections", "enablePirTimelapse": false,
                                  "useNewMotionAlgorithm": true},
            "lcdMessage": {},
            "talkbackSettings": {"typeFmt": "aac", "typeIn": "serverudp", "bindAddr": "0.0.0.0",
                                 "bindPort": 7004, "channels": 1, "samplingRate": 22050},
            "featureFlags": {"canAdjustIrLedLevel": false, "hasMic": true, "hasHdr": true,
                             "hasLedStatus": true, "hasLcdScreen": true, "hasChime": true,
                             "hasAutoICROnly": false, "videoModes": ["default", "highFps"],
                             "hasPrivacyMask": true},
            "ledSettings": {"isEnabled": true, "blinkRate": 0},
            "speakerSettings": {"isEnabled": true, "areSystemSoundsEnabled": false, "volume": 80},
            "motionZones": [
                {"id": 1, "name": "Default", "color": "#AB46BC",
                 "points": [[0, 0], [1, 0], [1, 1], [0, 1]], "sensitivity": 50}
            ],
            "smartDetectZones": [],
            "stats": {"rxBytes": 100, "txBytes": 200, "wifiQuality": 100,
                      "video": {"recordingStart": 1631000000000i64, "recordingEnd": 1632106606652i64,
                                "recordingStartLQ": 1631000000000i64, "recordingEndLQ": 1632106606652i64,
                                "timelapseStart": null, "timelapseEnd": null,
                                "timelapseStartLQ": null, "timelapseEndLQ": null}}
        }),
    )
}

/// Second camera without HDR, mic or status light support.
pub fn sample_doorbell() -> Json {
    extend(
        adoptable("camera", DOORBELL_ID, "Side Door", "UVC G3 Flex", json!("192.168.1.30")),
        json!({
            "lastMotion": null,
            "isDark": false,
            "isMotionDetected": false,
            "micVolume": 0,
            "lastRing": null,
            "hdrMode": false,
            "videoMode": "default",
            "lcdMessage": {"type": "DO_NOT_DISTURB", "text": "DO NOT DISTURB", "resetAt": null},
            "featureFlags": {"hasMic": false, "hasHdr": false, "hasLedStatus": false,
                             "videoModes": ["default"]},
            "ispSettings": {"zoomPosition": 0},
            "ledSettings": {"isEnabled": false, "blinkRate": 0}
        }),
    )
}

pub fn sample_light() -> Json {
    extend(
        adoptable("light", LIGHT_ID, "Driveway", "UP FloodLight", json!("192.168.1.22")),
        json!({
            "lastMotion": null,
            "isDark": true,
            "isPirMotionDetected": false,
            "isLightOn": false,
            "camera": CAMERA_ID,
            "lightDeviceSettings": {"isIndicatorEnabled": true, "ledLevel": 6, "luxSensitivity": "medium",
                                    "pirDuration": 15000, "pirSensitivity": 45},
            "lightOnSettings": {"isLedForceOn": false},
            "lightModeSettings": {"mode": "motion", "enableAt": "fulltime"}
        }),
    )
}

pub fn sample_sensor() -> Json {
    extend(
        adoptable("sensor", SENSOR_ID, "Back Door", "UFP-SENSE", Json::Null),
        json!({
            "camera": CAMERA_ID,
            "bridge": BRIDGE_ID,
            "isOpened": false,
            "openStatusChangedAt": 1632100000000i64,
            "alarmTriggeredAt": null,
            "leakDetectedAt": null,
            "motionDetectedAt": 1632100000000i64,
            "tamperingDetectedAt": null,
            "batteryStatus": {"percentage": 90, "isLow": false},
            "motionSettings": {"isEnabled": true, "sensitivity": 70}
        }),
    )
}

pub fn sample_viewer() -> Json {
    extend(
        adoptable("viewer", VIEWER_ID, "Lobby", "UP Viewport", json!("192.168.1.23")),
        json!({"liveview": LIVEVIEW_ID, "softwareVersion": "1.2.3"}),
    )
}

pub fn sample_bridge() -> Json {
    extend(
        adoptable("bridge", BRIDGE_ID, "Bridge", "UFP-UAP-B", json!("192.168.1.24")),
        json!({"platform": "mt7622"}),
    )
}

pub fn sample_chime() -> Json {
    extend(
        adoptable("chime", CHIME_ID, "Chime", "UP Chime", json!("192.168.1.25")),
        json!({"volume": 100, "cameraIds": [CAMERA_ID], "lastRing": null}),
    )
}

pub fn sample_user_location() -> Json {
    json!({"modelKey": "userLocation", "isAway": false, "latitude": null, "longitude": null})
}

pub fn sample_cloud_account() -> Json {
    json!({
        "modelKey": "cloudIdentity",
        "id": "cloud-1",
        "firstName": "Ada",
        "lastName": "Admin",
        "email": "admin@example.com",
        "user": USER_ID,
        "location": sample_user_location()
    })
}

pub fn sample_user() -> Json {
    json!({
        "modelKey": "user",
        "id": USER_ID,
        "name": "Ada Admin",
        "firstName": "Ada",
        "lastName": "Admin",
        "email": "admin@example.com",
        "localUsername": "admin",
        "enableNotifications": false,
        "lastLoginIp": null,
        "lastLoginTime": 1632100000000i64,
        "isOwner": true,
        "role": "owner",
        "permissions": [],
        "allPermissions": [],
        "groups": [GROUP_ID],
        "location": sample_user_location(),
        "cloudAccount": sample_cloud_account(),
        "settings": {"flags": {}},
        "featureFlags": {"notificationsV2": true}
    })
}

pub fn sample_group() -> Json {
    json!({
        "modelKey": "group",
        "id": GROUP_ID,
        "name": "Admins",
        "permissions": ["camera:*"],
        "type": "preset",
        "isDefault": true
    })
}

pub fn sample_liveview() -> Json {
    json!({
        "modelKey": "liveview",
        "id": LIVEVIEW_ID,
        "name": "Default",
        "isDefault": true,
        "isGlobal": true,
        "layout": 4,
        "owner": USER_ID,
        "slots": [
            {"cameras": [CAMERA_ID, DOORBELL_ID, "cam-gone"], "cycleMode": "time", "cycleInterval": 10}
        ]
    })
}

pub fn sample_nvr() -> Json {
    json!({
        "modelKey": "nvr",
        "id": "nvr-1",
        "name": "Home NVR",
        "type": "UNVR",
        "mac": "F4E2C6000000",
        "host": "192.168.1.1",
        "upSince": 1631000000000i64,
        "uptime": 1106606652,
        "lastSeen": 1632106606652i64,
        "hardwareRevision": "4",
        "firmwareVersion": "2.2.6",
        "isUpdating": false,
        "isSshEnabled": false,
        "version": "1.20.0",
        "lastUpdateAt": null,
        "timezone": "America/New_York",
        "recordingRetentionDurationMs": 2592000000i64,
        "isHardware": true,
        "hosts": ["192.168.1.1"],
        "ports": {"ump": 7449, "http": 7080, "https": 7443, "rtsp": 7447, "rtsps": 7441, "rtmp": 1935,
                  "devicesWss": 7442, "cameraHttps": 7444, "cameraTcp": 7877, "liveWs": 7445,
                  "liveWss": 7446, "tcpStreams": 7448, "playback": 7450, "emsCLI": 7440,
                  "emsLiveFLV": 7550, "cameraEvents": 7551, "tcpBridge": 7888, "ucore": 11081,
                  "discoveryClient": 0},
        "doorbellSettings": {"defaultMessageText": "Welcome", "defaultMessageResetTimeoutMs": 60000,
                             "customMessages": [],
                             "allMessages": [{"type": "LEAVE_PACKAGE_AT_DOOR", "text": "LEAVE PACKAGE AT DOOR"}]},
        "storageStats": {"utilization": 30, "capacity": 2592000000i64, "remainingCapacity": 1592000000i64,
                         "recordingSpace": {"total": 1000, "used": 300, "available": 700}},
        "locationSettings": {"isAway": false, "isGeofencingEnabled": false, "latitude": null,
                             "longitude": null, "radius": 200},
        "maxCameraCapacity": {"4K": 8, "2K": 12, "HD": 16},
        "featureFlags": {"beta": false, "dev": false}
    })
}

/// Event wire dictionary. `kind` is the event type string.
pub fn sample_event(id: &str, kind: &str, camera: &str, start: i64, end: Option<i64>) -> Json {
    json!({
        "modelKey": "event",
        "id": id,
        "type": kind,
        "start": start,
        "end": end,
        "score": 50,
        "smartDetectTypes": [],
        "smartDetectEvents": [],
        "camera": camera,
        "partition": null,
        "user": null,
        "thumbnail": format!("e-{}", id),
        "heatmap": format!("e-{}", id),
        "metadata": {}
    })
}

/// One sample dictionary per record kind.
pub fn sample_records() -> Vec<(ModelKind, Json)> {
    vec![
        (ModelKind::Camera, sample_camera()),
        (ModelKind::Camera, sample_doorbell()),
        (ModelKind::CloudIdentity, sample_cloud_account()),
        (ModelKind::Event, sample_event("event-1", "motion", CAMERA_ID, 1632106600000, Some(1632106606652))),
        (ModelKind::Group, sample_group()),
        (ModelKind::Light, sample_light()),
        (ModelKind::Liveview, sample_liveview()),
        (ModelKind::Nvr, sample_nvr()),
        (ModelKind::User, sample_user()),
        (ModelKind::UserLocation, sample_user_location()),
        (ModelKind::Viewer, sample_viewer()),
        (ModelKind::Bridge, sample_bridge()),
        (ModelKind::Sensor, sample_sensor()),
        (ModelKind::Chime, sample_chime()),
    ]
}

/// Bootstrap document holding one or two records of every collection.
pub fn sample_bootstrap() -> Json {
    json!({
        "authUserId": USER_ID,
        "accessKey": "1632106606652:abcdef",
        "cameras": [sample_camera(), sample_doorbell()],
        "users": [sample_user()],
        "groups": [sample_group()],
        "liveviews": [sample_liveview()],
        "viewers": [sample_viewer()],
        "lights": [sample_light()],
        "bridges": [sample_bridge()],
        "sensors": [sample_sensor()],
        "chimes": [sample_chime()],
        "nvr": sample_nvr(),
        "lastUpdateId": BOOTSTRAP_UPDATE_ID
    })
}

/// Encode an action frame and a deflated data frame.
pub fn packet_bytes(action: Json, data: Json) -> Vec<u8> {
    let mut bytes = Frame::json(1, action, true).and_then(|f| f.encode()).expect("action frame encodes");
    bytes.extend(Frame::json(2, data, true).and_then(|f| f.encode()).expect("data frame encodes"));
    bytes
}

pub fn action_json(action: &str, kind: &str, id: Option<&str>, update_id: Uuid) -> Json {
    json!({"action": action, "newUpdateId": update_id, "modelKey": kind, "id": id})
}

pub fn update_packet(kind: &str, id: &str, update_id: Uuid, data: Json) -> WsPacket {
    WsPacket::new(packet_bytes(action_json("update", kind, Some(id), update_id), data))
}

pub fn add_packet(kind: &str, update_id: Uuid, data: Json) -> WsPacket {
    let id = data.get("id").and_then(Json::as_str).map(str::to_string);
    WsPacket::new(packet_bytes(action_json("add", kind, id.as_deref(), update_id), data))
}
