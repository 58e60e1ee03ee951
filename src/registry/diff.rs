//! Recursive merge and change detection

use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;

use super::value::{Object, Value};

/// Merge `patch` onto `target`. Declared nested objects merge field by field;
/// every other value, lists and undeclared maps included, is replaced.
pub fn merge(target: &mut BTreeMap<String, Value>, patch: BTreeMap<String, Value>) {
    for (key, value) in patch {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(update)) => {
                merge(existing.fields_mut(), update.into_fields());
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

/// Fields of `new` that differ from `old`, recursing into nested objects so
/// only the changed sub-fields are reported.
pub fn delta(old: &BTreeMap<String, Value>, new: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    let mut changed = BTreeMap::new();
    for (key, value) in new {
        match (old.get(key), value) {
            (None, value) => {
                changed.insert(key.clone(), value.clone());
            }
            (Some(Value::Object(before)), Value::Object(after)) => {
                let sub = delta(before.fields(), after.fields());
                if !sub.is_empty() {
                    changed.insert(key.clone(), Value::Object(Object::with_fields(after.schema(), sub)));
                }
            }
            (Some(Value::Map(before)), Value::Map(after)) => {
                let sub = delta(before, after);
                if !sub.is_empty() {
                    changed.insert(key.clone(), Value::Map(sub));
                }
            }
            (Some(before), after) if before != after => {
                changed.insert(key.clone(), after.clone());
            }
            _ => {}
        }
    }
    changed
}

/// Wire dictionary holding only what changed between `original` and `edited`.
pub fn wire_diff(original: &Map<String, Json>, edited: &Map<String, Json>) -> Map<String, Json> {
    let mut changed = Map::new();
    for (key, value) in edited {
        match (original.get(key), value) {
            (None, value) => {
                changed.insert(key.clone(), value.clone());
            }
            (Some(Json::Object(before)), Json::Object(after)) => {
                let sub = wire_diff(before, after);
                if !sub.is_empty() {
                    changed.insert(key.clone(), Json::Object(sub));
                }
            }
            (Some(before), after) if before != after => {
                changed.insert(key.clone(), after.clone());
            }
            _ => {}
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tables;
    use crate::registry::convert::object_from_wire;
    use serde_json::json;

    fn camera(data: Json) -> BTreeMap<String, Value> {
        object_from_wire(&tables::CAMERA, data.as_object().unwrap()).unwrap().into_fields()
    }

    #[test]
    fn merge_recurses_into_nested_objects() {
        let mut target = camera(json!({"name": "Door", "ispSettings": {"zoomPosition": 0, "wdr": 1}}));
        let patch = camera(json!({"ispSettings": {"zoomPosition": 40}}));
        merge(&mut target, patch);

        let expected = camera(json!({"name": "Door", "ispSettings": {"zoomPosition": 40, "wdr": 1}}));
        assert_eq!(target, expected);
    }

    #[test]
    fn merge_replaces_lists() {
        let mut target = camera(json!({"channels": [{"id": 0}, {"id": 1}]}));
        merge(&mut target, camera(json!({"channels": [{"id": 2}]})));
        assert_eq!(target, camera(json!({"channels": [{"id": 2}]})));
    }

    #[test]
    fn merge_replaces_undeclared_maps() {
        let mut target = camera(json!({"wifiConnectionState": {"a": 1, "b": 2}}));
        merge(&mut target, camera(json!({"wifiConnectionState": {"a": 3}})));
        assert_eq!(target, camera(json!({"wifiConnectionState": {"a": 3}})));
    }

    #[test]
    fn delta_reports_only_changed_sub_fields() {
        let old = camera(json!({"name": "Door", "micVolume": 10, "ispSettings": {"zoomPosition": 0, "wdr": 1}}));
        let new = camera(json!({"name": "Door", "micVolume": 42, "ispSettings": {"zoomPosition": 0, "wdr": 2}}));

        let changed = delta(&old, &new);
        assert_eq!(changed.keys().collect::<Vec<_>>(), vec!["isp_settings", "mic_volume"]);
        assert_eq!(changed, camera(json!({"micVolume": 42, "ispSettings": {"wdr": 2}})));
    }

    #[test]
    fn identical_records_have_empty_delta() {
        let old = camera(json!({"name": "Door", "ispSettings": {"zoomPosition": 0}}));
        assert!(delta(&old, &old.clone()).is_empty());
    }

    #[test]
    fn wire_diff_matches_changed_fields_only() {
        let original = json!({"micVolume": 10, "ledSettings": {"isEnabled": true, "blinkRate": 0}, "name": "a"});
        let edited = json!({"micVolume": 10, "ledSettings": {"isEnabled": false, "blinkRate": 0}, "name": "a"});
        let diff = wire_diff(original.as_object().unwrap(), edited.as_object().unwrap());
        assert_eq!(Json::Object(diff), json!({"ledSettings": {"isEnabled": false}}));
    }
}
