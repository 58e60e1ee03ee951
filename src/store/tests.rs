use super::*;
use crate::test_utils::*;
use serde_json::json;

fn snapshot() -> Snapshot {
    Snapshot::from_wire(sample_bootstrap().as_object().unwrap()).unwrap()
}

fn update_id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

#[test]
fn bootstrap_loads_every_collection() {
    let snapshot = snapshot();

    assert_eq!(snapshot.records(ModelKind::Camera).count(), 2);
    for kind in ModelKind::BOOTSTRAP_COLLECTIONS {
        assert!(snapshot.records(kind).count() >= 1, "{} empty", kind);
    }
    assert_eq!(snapshot.nvr().get_str("name"), Some("Home NVR"));
    assert_eq!(snapshot.last_update_id().to_string(), BOOTSTRAP_UPDATE_ID);
    assert!(snapshot.events().is_empty());
}

#[test]
fn bootstrap_round_trips() {
    let bootstrap = sample_bootstrap();
    let snapshot = Snapshot::from_wire(bootstrap.as_object().unwrap()).unwrap();
    assert_eq!(Json::Object(snapshot.to_wire()), bootstrap);
}

#[test]
fn bootstrap_requires_nvr_and_update_id() {
    let mut bootstrap = sample_bootstrap();
    bootstrap.as_object_mut().unwrap().remove("lastUpdateId");
    assert!(matches!(
        Snapshot::from_wire(bootstrap.as_object().unwrap()),
        Err(ProtectError::Json { .. })
    ));

    let mut bootstrap = sample_bootstrap();
    bootstrap.as_object_mut().unwrap().remove("nvr");
    assert!(Snapshot::from_wire(bootstrap.as_object().unwrap()).is_err());
}

#[test]
fn bootstrap_fails_on_bad_record() {
    let mut bootstrap = sample_bootstrap();
    bootstrap["lights"][0]["lightDeviceSettings"]["ledLevel"] = json!(9);
    assert!(matches!(
        Snapshot::from_wire(bootstrap.as_object().unwrap()),
        Err(ProtectError::Validation { .. })
    ));
}

#[test]
fn update_merges_and_reports_delta() {
    let mut snapshot = snapshot();
    let before = snapshot.get(ModelKind::Camera, CAMERA_ID).unwrap().clone();

    let packet = update_packet("camera", CAMERA_ID, update_id(1), json!({"micVolume": 42}));
    let change = snapshot.apply_packet(&packet).unwrap().unwrap();

    assert_eq!(change.action, ChangeAction::Update);
    assert_eq!(change.kind, ModelKind::Camera);
    assert_eq!(change.id.as_deref(), Some(CAMERA_ID));
    assert_eq!(change.changed_fields().collect::<Vec<_>>(), vec!["mic_volume"]);
    assert_eq!(change.old.as_ref().unwrap().get_i64("mic_volume"), Some(100));
    assert_eq!(change.new.get_i64("mic_volume"), Some(42));

    assert_eq!(before.get_i64("mic_volume"), Some(100));
    assert_eq!(snapshot.get(ModelKind::Camera, CAMERA_ID).unwrap().get_i64("mic_volume"), Some(42));
    assert_eq!(snapshot.last_update_id(), update_id(1));
}

#[test]
fn nested_update_reports_only_changed_sub_fields() {
    let mut snapshot = snapshot();
    let packet = update_packet("camera", CAMERA_ID, update_id(1), json!({"ispSettings": {"irLedLevel": 100}}));
    let change = snapshot.apply_packet(&packet).unwrap().unwrap();

    let isp = change.changed["isp_settings"].as_object().unwrap();
    assert_eq!(isp.len(), 1);
    assert_eq!(isp.get("ir_led_level").and_then(Value::as_i64), Some(100));

    let camera = snapshot.get(ModelKind::Camera, CAMERA_ID).unwrap();
    assert_eq!(camera.get_path("isp_settings.focus_mode").and_then(Value::as_str), Some("ztrig"));
}

#[test]
fn repeated_update_is_silent() {
    let mut snapshot = snapshot();
    let patch = json!({"micVolume": 42});

    assert!(snapshot.apply_packet(&update_packet("camera", CAMERA_ID, update_id(1), patch.clone())).unwrap().is_some());
    let state = snapshot.to_wire();

    assert!(snapshot.apply_packet(&update_packet("camera", CAMERA_ID, update_id(2), patch)).unwrap().is_none());
    let mut after = snapshot.to_wire();
    after.insert("lastUpdateId".into(), state["lastUpdateId"].clone());
    assert_eq!(after, state);
    assert_eq!(snapshot.last_update_id(), update_id(2));
}

#[test]
fn update_for_unknown_record_is_ignored() {
    let mut snapshot = snapshot();
    let state = snapshot.to_wire();

    let packet = update_packet("camera", "cam-missing", update_id(1), json!({"micVolume": 1}));
    assert!(snapshot.apply_packet(&packet).unwrap().is_none());

    let packet = update_packet("event", "event-missing", update_id(2), json!({"end": 1632106606652i64}));
    assert!(snapshot.apply_packet(&packet).unwrap().is_none());

    let mut after = snapshot.to_wire();
    after.insert("lastUpdateId".into(), state["lastUpdateId"].clone());
    assert_eq!(after, state);
}

#[test]
fn unknown_kind_is_an_error_but_advances_update_id() {
    let mut snapshot = snapshot();
    let state = snapshot.to_wire();
    let packet = update_packet("doorlock", "x", update_id(99), json!({"name": "Gate"}));

    assert!(matches!(snapshot.apply_packet(&packet), Err(ProtectError::UnknownKind { .. })));
    assert_eq!(snapshot.last_update_id(), update_id(99));

    let mut after = snapshot.to_wire();
    after.insert("lastUpdateId".into(), state["lastUpdateId"].clone());
    assert_eq!(after, state);
}

#[test]
fn empty_patch_changes_nothing_but_update_id() {
    let mut snapshot = snapshot();
    let state = snapshot.to_wire();
    let before = snapshot.get(ModelKind::Camera, CAMERA_ID).unwrap().clone();

    let packet = update_packet("camera", CAMERA_ID, update_id(5), json!({}));
    assert!(snapshot.apply_packet(&packet).unwrap().is_none());

    assert_eq!(snapshot.last_update_id(), update_id(5));
    assert!(Arc::ptr_eq(snapshot.get(ModelKind::Camera, CAMERA_ID).unwrap(), &before));
    let mut after = snapshot.to_wire();
    after.insert("lastUpdateId".into(), state["lastUpdateId"].clone());
    assert_eq!(after, state);
}

#[test]
fn unsupported_action_only_advances_update_id() {
    let mut snapshot = snapshot();
    let bytes = packet_bytes(action_json("remove", "camera", Some(CAMERA_ID), update_id(7)), json!({}));

    assert!(snapshot.apply_packet(&WsPacket::new(bytes)).unwrap().is_none());
    assert!(snapshot.get(ModelKind::Camera, CAMERA_ID).is_some());
    assert_eq!(snapshot.last_update_id(), update_id(7));
}

#[test]
fn subscribed_kinds_filter_packets() {
    let mut snapshot = snapshot();
    snapshot.set_subscribed_kinds(Some([ModelKind::Light].into_iter().collect()));

    let packet = update_packet("camera", CAMERA_ID, update_id(1), json!({"micVolume": 42}));
    assert!(snapshot.apply_packet(&packet).unwrap().is_none());
    assert_eq!(snapshot.get(ModelKind::Camera, CAMERA_ID).unwrap().get_i64("mic_volume"), Some(100));
    assert_eq!(snapshot.last_update_id(), update_id(1));

    let packet = update_packet("light", LIGHT_ID, update_id(2), json!({"isLightOn": true}));
    assert!(snapshot.apply_packet(&packet).unwrap().is_some());
}

#[test]
fn add_inserts_into_collection() {
    let mut snapshot = snapshot();
    let mut group = sample_group();
    group["id"] = json!("group-2");

    let change = snapshot.apply_packet(&add_packet("group", update_id(1), group)).unwrap().unwrap();
    assert_eq!(change.action, ChangeAction::Add);
    assert!(change.old.is_none());
    assert!(snapshot.get(ModelKind::Group, "group-2").is_some());
    assert_eq!(snapshot.records(ModelKind::Group).count(), 2);
}

#[test]
fn add_nvr_replaces_singleton() {
    let mut snapshot = snapshot();
    let mut nvr = sample_nvr();
    nvr["name"] = json!("Replacement");

    snapshot.apply_packet(&add_packet("nvr", update_id(1), nvr)).unwrap().unwrap();
    assert_eq!(snapshot.nvr().name(), Some("Replacement"));
}

#[test]
fn add_without_collection_is_ignored() {
    let mut snapshot = snapshot();
    let packet = add_packet("userLocation", update_id(1), sample_user_location());
    assert!(snapshot.apply_packet(&packet).unwrap().is_none());
}

#[test]
fn motion_events_update_camera() {
    let mut snapshot = snapshot();

    let start = sample_event("motion-1", "motion", CAMERA_ID, 1632106610000, None);
    snapshot.apply_packet(&add_packet("event", update_id(1), start)).unwrap().unwrap();

    let camera = snapshot.get(ModelKind::Camera, CAMERA_ID).unwrap();
    assert_eq!(camera.get_bool("is_motion_detected"), Some(true));
    assert_eq!(camera.get_str("last_motion_event_id"), Some("motion-1"));
    // Ongoing motion leaves the last-motion timestamp alone.
    assert_eq!(camera.get_timestamp("last_motion").map(|t| t.timestamp_millis()), Some(1632106000000));
    assert_eq!(snapshot.last_motion_event(CAMERA_ID).unwrap().id(), Some("motion-1"));

    let end = json!({"end": 1632106620000i64});
    snapshot.apply_packet(&update_packet("event", "motion-1", update_id(2), end)).unwrap().unwrap();

    let camera = snapshot.get(ModelKind::Camera, CAMERA_ID).unwrap();
    assert_eq!(camera.get_bool("is_motion_detected"), Some(false));
    assert_eq!(camera.get_timestamp("last_motion").map(|t| t.timestamp_millis()), Some(1632106620000));
    assert!(!camera.to_wire().contains_key("lastMotionEventId"));
}

#[test]
fn ring_and_smart_detect_events_link_camera() {
    let mut snapshot = snapshot();

    let ring = sample_event("ring-1", "ring", CAMERA_ID, 1632106610000, Some(1632106611000));
    snapshot.apply_packet(&add_packet("event", update_id(1), ring)).unwrap();
    assert_eq!(snapshot.last_ring_event(CAMERA_ID).unwrap().id(), Some("ring-1"));

    let smart = sample_event("smart-1", "smartDetectZone", CAMERA_ID, 1632106610000, Some(1632106615000));
    snapshot.apply_packet(&add_packet("event", update_id(2), smart)).unwrap();
    assert_eq!(snapshot.last_smart_detect_event(CAMERA_ID).unwrap().id(), Some("smart-1"));

    let camera = snapshot.get(ModelKind::Camera, CAMERA_ID).unwrap();
    assert_eq!(camera.get_timestamp("last_smart_detect").map(|t| t.timestamp_millis()), Some(1632106615000));
}

#[test]
fn event_for_unknown_camera_is_stored_without_side_effects() {
    let mut snapshot = snapshot();
    let event = sample_event("ring-x", "ring", "cam-gone", 1, None);

    snapshot.apply_packet(&add_packet("event", update_id(1), event)).unwrap().unwrap();
    assert!(snapshot.events().contains("ring-x"));
    let ring = snapshot.get(ModelKind::Event, "ring-x").unwrap().clone();
    assert!(snapshot.event_camera(&ring).is_none());
}

#[test]
fn old_record_survives_event_side_effects() {
    let mut snapshot = snapshot();
    let before = snapshot.get(ModelKind::Camera, CAMERA_ID).unwrap().clone();

    let event = sample_event("motion-1", "motion", CAMERA_ID, 1, None);
    snapshot.apply_packet(&add_packet("event", update_id(1), event)).unwrap();

    assert_eq!(before.get_bool("is_motion_detected"), Some(false));
    assert!(before.get("last_motion_event_id").is_none());
}

#[test]
fn event_history_is_bounded() {
    let mut snapshot = Snapshot::from_wire_with_capacity(sample_bootstrap().as_object().unwrap(), 3).unwrap();
    for i in 0..5 {
        let event = sample_event(&format!("e{}", i), "motion", CAMERA_ID, i, Some(i + 1));
        snapshot.apply_packet(&add_packet("event", update_id(i as u128), event)).unwrap();
    }

    assert_eq!(snapshot.events().len(), 3);
    assert!(!snapshot.events().contains("e1"));
    assert!(snapshot.events().contains("e4"));
}

#[test]
fn resolvers_follow_ids() {
    let snapshot = snapshot();

    let light = snapshot.get(ModelKind::Light, LIGHT_ID).unwrap();
    assert_eq!(snapshot.camera_of(light).unwrap().id(), Some(CAMERA_ID));

    let sensor = snapshot.get(ModelKind::Sensor, SENSOR_ID).unwrap();
    assert_eq!(snapshot.bridge_of(sensor).unwrap().id(), Some(BRIDGE_ID));

    let viewer = snapshot.get(ModelKind::Viewer, VIEWER_ID).unwrap();
    let liveview = snapshot.liveview_of(viewer).unwrap();
    assert_eq!(liveview.id(), Some(LIVEVIEW_ID));
    assert_eq!(snapshot.owner_of(liveview).unwrap().id(), Some(USER_ID));

    let cameras: Vec<_> = snapshot.slot_cameras(liveview, 0).iter().filter_map(|c| c.id()).collect();
    assert_eq!(cameras, vec![CAMERA_ID, DOORBELL_ID]);
    assert!(snapshot.slot_cameras(liveview, 5).is_empty());

    let user = snapshot.auth_user().unwrap();
    assert_eq!(snapshot.groups_of(user).len(), 1);
    assert_eq!(snapshot.chimes_of(CAMERA_ID).len(), 1);
    assert!(snapshot.chimes_of(DOORBELL_ID).is_empty());

    assert!(snapshot.last_motion_event(CAMERA_ID).is_none());
    assert!(snapshot.last_ring_event("cam-gone").is_none());
}

#[test]
fn nvr_updates_apply_to_singleton() {
    let mut snapshot = snapshot();
    let packet = update_packet("nvr", "nvr-1", update_id(1), json!({"timezone": "Europe/Berlin"}));
    snapshot.apply_packet(&packet).unwrap().unwrap();
    assert_eq!(snapshot.nvr_timezone(), Some("Europe/Berlin"));
}
