//! Packet assembler: an action frame followed by a data frame

use serde::Deserialize;
use std::sync::OnceLock;
use uuid::Uuid;

use super::frame::Frame;
use crate::{ProtectError, Result};

/// Operation requested by an action frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum Action {
    Add,
    Update,
    Other(String),
}

impl From<String> for Action {
    fn from(s: String) -> Self {
        match s.as_str() {
            "add" => Action::Add,
            "update" => Action::Update,
            _ => Action::Other(s),
        }
    }
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::Add => "add",
            Action::Update => "update",
            Action::Other(other) => other,
        }
    }
}

/// Parsed contents of an action frame.
///
/// `model_key` stays a string here; resolving it to a known kind is the
/// store's concern so an unknown kind never fails packet decoding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionHeader {
    pub action: Action,
    pub new_update_id: Uuid,
    pub model_key: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// One logical update from the websocket.
///
/// Frames are decoded lazily from the raw bytes on first access and cached.
/// Taking a mutable frame drops the cached bytes so [`WsPacket::pack`]
/// re-encodes from the current frame state.
#[derive(Debug, Default)]
pub struct WsPacket {
    raw: Option<Vec<u8>>,
    frames: OnceLock<(Frame, Frame)>,
}

impl WsPacket {
    /// Wrap raw websocket bytes without decoding them.
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        Self { raw: Some(raw.into()), frames: OnceLock::new() }
    }

    /// Build a packet from already-decoded frames.
    pub fn from_frames(action: Frame, data: Frame) -> Self {
        let frames = OnceLock::new();
        let _ = frames.set((action, data));
        Self { raw: None, frames }
    }

    fn frames(&self) -> Result<&(Frame, Frame)> {
        if let Some(frames) = self.frames.get() {
            return Ok(frames);
        }

        let raw = self
            .raw
            .as_deref()
            .ok_or_else(|| ProtectError::packet_decode("Packet has neither bytes nor frames"))?;
        let decoded = decode_frames(raw)?;
        Ok(self.frames.get_or_init(|| decoded))
    }

    fn frames_mut(&mut self) -> Result<&mut (Frame, Frame)> {
        self.frames()?;
        self.raw = None;
        self.frames
            .get_mut()
            .ok_or_else(|| ProtectError::packet_decode("Packet frames unavailable"))
    }

    pub fn action_frame(&self) -> Result<&Frame> {
        self.frames().map(|(action, _)| action)
    }

    pub fn data_frame(&self) -> Result<&Frame> {
        self.frames().map(|(_, data)| data)
    }

    pub fn action_frame_mut(&mut self) -> Result<&mut Frame> {
        self.frames_mut().map(|(action, _)| action)
    }

    pub fn data_frame_mut(&mut self) -> Result<&mut Frame> {
        self.frames_mut().map(|(_, data)| data)
    }

    /// Parse the action frame's JSON into an [`ActionHeader`].
    pub fn header(&self) -> Result<ActionHeader> {
        let value = self
            .action_frame()?
            .as_json()
            .ok_or_else(|| ProtectError::packet_decode("Action frame is not JSON"))?;
        ActionHeader::deserialize(value)
            .map_err(|e| ProtectError::packet_decode(format!("Invalid action frame: {}", e)))
    }

    /// Data frame payload as a JSON object.
    pub fn data(&self) -> Result<&serde_json::Map<String, serde_json::Value>> {
        self.data_frame()?
            .as_json()
            .and_then(serde_json::Value::as_object)
            .ok_or_else(|| ProtectError::packet_decode("Data frame is not a JSON object"))
    }

    /// Raw bytes of the packet, re-encoding the frames when they were mutated.
    pub fn pack(&self) -> Result<Vec<u8>> {
        if let Some(raw) = &self.raw {
            return Ok(raw.clone());
        }

        let (action, data) = self.frames()?;
        let mut out = action.encode()?;
        out.extend(data.encode()?);
        Ok(out)
    }
}

fn decode_frames(raw: &[u8]) -> Result<(Frame, Frame)> {
    let (action, consumed) = Frame::decode(raw, 0)
        .map_err(|e| ProtectError::packet_decode(format!("Action frame: {}", e)))?;

    let has_kind = action
        .as_json()
        .and_then(|v| v.get("modelKey"))
        .is_some_and(serde_json::Value::is_string);
    if !has_kind {
        return Err(ProtectError::packet_decode("Action frame is missing modelKey"));
    }

    let (data, _) = Frame::decode(raw, consumed)
        .map_err(|e| ProtectError::packet_decode(format!("Data frame: {}", e)))?;

    Ok((action, data))
}
