//! Record registry: kind discriminators, field schemas and wire conversion.
//!
//! Every record kind maps to a static [`Schema`] describing how its wire
//! dictionary is converted to internal form and back:
//!
//! - camelCase keys become snake_case (only when the rename is reversible)
//! - per-kind renames such as `camera` → `camera_id` compose through the
//!   schema's parent chain
//! - millisecond timestamps, durations and IP strings become structured values
//! - nested declared objects are converted recursively
//! - derived back-reference fields are internal-only and never emitted
//!
//! The round-trip property `to_wire(from_wire(d)) == d` holds for every
//! dictionary the controller produces.
//!
//! ```rust
//! use nvrsync::registry::Record;
//! use serde_json::json;
//!
//! let wire = json!({"modelKey": "light", "id": "l1", "camera": "c1", "lastMotion": 1632106606652i64});
//! let record = Record::from_wire(wire.as_object().unwrap(), None).unwrap();
//!
//! assert_eq!(record.get_str("camera_id"), Some("c1"));
//! assert_eq!(serde_json::Value::Object(record.to_wire()), wire);
//! ```

mod convert;
mod diff;
mod record;
mod schema;
pub(crate) mod tables;
mod value;

pub use convert::{object_from_wire, object_to_wire};
pub use diff::{delta, merge, wire_diff};
pub use record::Record;
pub use schema::{FieldKind, Schema};
pub use value::{Object, Value};

use crate::types::ModelKind;

/// Kind → schema table.
static REGISTRY: [(ModelKind, &Schema); 13] = [
    (ModelKind::Camera, &tables::CAMERA),
    (ModelKind::CloudIdentity, &tables::CLOUD_ACCOUNT),
    (ModelKind::Event, &tables::EVENT),
    (ModelKind::Group, &tables::GROUP),
    (ModelKind::Light, &tables::LIGHT),
    (ModelKind::Liveview, &tables::LIVEVIEW),
    (ModelKind::Nvr, &tables::NVR),
    (ModelKind::User, &tables::USER),
    (ModelKind::UserLocation, &tables::USER_LOCATION),
    (ModelKind::Viewer, &tables::VIEWER),
    (ModelKind::Bridge, &tables::BRIDGE),
    (ModelKind::Sensor, &tables::SENSOR),
    (ModelKind::Chime, &tables::CHIME),
];

/// Schema for a record kind.
pub fn schema_for(kind: ModelKind) -> &'static Schema {
    REGISTRY
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, schema)| *schema)
        .unwrap_or(&tables::BASE)
}
