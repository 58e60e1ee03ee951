//! Record kind discriminator

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ProtectError, Result};

/// Closed set of record kinds the controller publishes.
///
/// The wire form is the `modelKey` string carried by every record and by the
/// action frame of each update packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelKind {
    Camera,
    CloudIdentity,
    Event,
    Group,
    Light,
    Liveview,
    Nvr,
    User,
    UserLocation,
    Viewer,
    Bridge,
    Sensor,
    Chime,
}

impl ModelKind {
    /// Every known kind, in discriminator order.
    pub const ALL: [ModelKind; 13] = [
        ModelKind::Camera,
        ModelKind::CloudIdentity,
        ModelKind::Event,
        ModelKind::Group,
        ModelKind::Light,
        ModelKind::Liveview,
        ModelKind::Nvr,
        ModelKind::User,
        ModelKind::UserLocation,
        ModelKind::Viewer,
        ModelKind::Bridge,
        ModelKind::Sensor,
        ModelKind::Chime,
    ];

    /// Kinds held as top-level collections in the bootstrap document.
    pub const BOOTSTRAP_COLLECTIONS: [ModelKind; 9] = [
        ModelKind::Camera,
        ModelKind::User,
        ModelKind::Group,
        ModelKind::Liveview,
        ModelKind::Viewer,
        ModelKind::Light,
        ModelKind::Bridge,
        ModelKind::Sensor,
        ModelKind::Chime,
    ];

    /// Wire discriminator string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Camera => "camera",
            ModelKind::CloudIdentity => "cloudIdentity",
            ModelKind::Event => "event",
            ModelKind::Group => "group",
            ModelKind::Light => "light",
            ModelKind::Liveview => "liveview",
            ModelKind::Nvr => "nvr",
            ModelKind::User => "user",
            ModelKind::UserLocation => "userLocation",
            ModelKind::Viewer => "viewer",
            ModelKind::Bridge => "bridge",
            ModelKind::Sensor => "sensor",
            ModelKind::Chime => "chime",
        }
    }

    /// Bootstrap key of the collection holding records of this kind.
    pub const fn collection_key(&self) -> Option<&'static str> {
        match self {
            ModelKind::Camera => Some("cameras"),
            ModelKind::User => Some("users"),
            ModelKind::Group => Some("groups"),
            ModelKind::Liveview => Some("liveviews"),
            ModelKind::Viewer => Some("viewers"),
            ModelKind::Light => Some("lights"),
            ModelKind::Bridge => Some("bridges"),
            ModelKind::Sensor => Some("sensors"),
            ModelKind::Chime => Some("chimes"),
            ModelKind::Event => Some("events"),
            ModelKind::Nvr | ModelKind::CloudIdentity | ModelKind::UserLocation => None,
        }
    }

    /// Relative API path used when saving a record, e.g. `cameras/{id}`.
    pub fn api_path(&self, id: &str) -> String {
        match self {
            ModelKind::Nvr => "nvr".to_string(),
            other => format!("{}s/{}", other.as_str(), id),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ProtectError;

    fn from_str(s: &str) -> Result<Self> {
        ModelKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ProtectError::unknown_kind(Some(s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminators_parse_back() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.as_str().parse::<ModelKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_discriminator_is_rejected() {
        let err = "doorlock".parse::<ModelKind>().unwrap_err();
        assert!(matches!(err, ProtectError::UnknownKind { kind: Some(ref k) } if k == "doorlock"));
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&ModelKind::UserLocation).unwrap();
        assert_eq!(json, "\"userLocation\"");
        let kind: ModelKind = serde_json::from_str("\"cloudIdentity\"").unwrap();
        assert_eq!(kind, ModelKind::CloudIdentity);
    }

    #[test]
    fn api_paths() {
        assert_eq!(ModelKind::Camera.api_path("abc"), "cameras/abc");
        assert_eq!(ModelKind::Liveview.api_path("lv"), "liveviews/lv");
        assert_eq!(ModelKind::Nvr.api_path("ignored"), "nvr");
    }
}
