//! Event type discriminator carried in the `type` field of event records

use serde::{Deserialize, Serialize};

/// Kind of an event record.
///
/// Unrecognized strings are preserved in [`EventType::Unknown`] so event
/// records from newer firmware still round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    SmartDetect,
    Motion,
    Ring,
    Disconnect,
    Provision,
    Access,
    Offline,
    Off,
    Update,
    CameraPowerCycle,
    VideoExported,
    Unknown(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::SmartDetect => "smartDetectZone",
            EventType::Motion => "motion",
            EventType::Ring => "ring",
            EventType::Disconnect => "disconnect",
            EventType::Provision => "provision",
            EventType::Access => "access",
            EventType::Offline => "offline",
            EventType::Off => "off",
            EventType::Update => "update",
            EventType::CameraPowerCycle => "cameraPowerCycling",
            EventType::VideoExported => "videoExported",
            EventType::Unknown(other) => other,
        }
    }

    /// Events raised by a camera that update its back-references.
    pub fn is_device_event(&self) -> bool {
        matches!(self, EventType::Motion | EventType::Ring | EventType::SmartDetect)
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        match s {
            "smartDetectZone" => EventType::SmartDetect,
            "motion" => EventType::Motion,
            "ring" => EventType::Ring,
            "disconnect" => EventType::Disconnect,
            "provision" => EventType::Provision,
            "access" => EventType::Access,
            "offline" => EventType::Offline,
            "off" => EventType::Off,
            "update" => EventType::Update,
            "cameraPowerCycling" => EventType::CameraPowerCycle,
            "videoExported" => EventType::VideoExported,
            other => EventType::Unknown(other.to_string()),
        }
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        EventType::from(s.as_str())
    }
}

impl From<EventType> for String {
    fn from(t: EventType) -> Self {
        t.as_str().to_string()
    }
}
