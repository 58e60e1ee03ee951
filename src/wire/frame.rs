//! Binary frame codec
//!
//! Every websocket message from the controller is a sequence of frames. A frame
//! is an 8-byte header followed by `payload_length` bytes of payload:
//!
//! ```text
//! offset 0  int8   packet_type
//! offset 1  int8   payload_format   (1 = JSON, 2 = UTF-8 text, 3 = raw bytes)
//! offset 2  int8   deflated         (0 = plain, non-zero = deflated)
//! offset 3  int8   reserved
//! offset 4  uint32 payload_length   (big-endian)
//! offset 8  payload
//! ```
//!
//! Deflated payloads are inflated before the payload format is interpreted.
//! The controller emits zlib-wrapped deflate streams; decoding also accepts
//! headerless raw deflate.

use flate2::Compression;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};
use tracing::trace;

use crate::{ProtectError, Result};

/// Size of the fixed frame header in bytes.
pub const HEADER_LEN: usize = 8;

/// Interpretation of a frame's payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadFormat {
    Json,
    Utf8String,
    RawBytes,
    /// Unrecognized code; the payload is kept as opaque bytes.
    Other(i8),
}

impl PayloadFormat {
    pub const fn from_code(code: i8) -> Self {
        match code {
            1 => PayloadFormat::Json,
            2 => PayloadFormat::Utf8String,
            3 => PayloadFormat::RawBytes,
            other => PayloadFormat::Other(other),
        }
    }

    pub const fn code(&self) -> i8 {
        match self {
            PayloadFormat::Json => 1,
            PayloadFormat::Utf8String => 2,
            PayloadFormat::RawBytes => 3,
            PayloadFormat::Other(code) => *code,
        }
    }
}

/// Decoded frame payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Text(String),
    Bytes(Vec<u8>),
}

/// One decoded unit of the wire protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub packet_type: i8,
    pub payload_format: PayloadFormat,
    pub deflated: bool,
    pub reserved: i8,
    /// Length of the payload as it appears on the wire (after deflate).
    payload_length: u32,
    pub payload: Payload,
}

impl Frame {
    /// Build a frame and compute its on-wire payload length.
    pub fn new(
        packet_type: i8,
        payload_format: PayloadFormat,
        deflated: bool,
        payload: Payload,
    ) -> Result<Self> {
        let mut frame =
            Self { packet_type, payload_format, deflated, reserved: 0, payload_length: 0, payload };
        frame.payload_length = frame.wire_payload()?.len() as u32;
        Ok(frame)
    }

    /// JSON frame, the shape used by both frames of an update packet.
    pub fn json(packet_type: i8, value: serde_json::Value, deflated: bool) -> Result<Self> {
        Self::new(packet_type, PayloadFormat::Json, deflated, Payload::Json(value))
    }

    pub fn payload_length(&self) -> u32 {
        self.payload_length
    }

    /// Header size plus payload length.
    pub fn total_length(&self) -> usize {
        HEADER_LEN + self.payload_length as usize
    }

    /// Payload as JSON, if this is a JSON frame.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match &self.payload {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Mutable JSON payload. Callers must re-encode the frame to refresh the length.
    pub fn as_json_mut(&mut self) -> Option<&mut serde_json::Value> {
        match &mut self.payload {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Decode one frame from `buffer` starting at `offset`.
    ///
    /// Returns the frame and the number of bytes it occupied.
    pub fn decode(buffer: &[u8], offset: usize) -> Result<(Self, usize)> {
        let remaining = buffer.len().saturating_sub(offset);
        if remaining < HEADER_LEN {
            return Err(ProtectError::frame_decode(
                offset,
                format!("Insufficient data for frame header (need {}, have {})", HEADER_LEN, remaining),
            ));
        }

        let header = &buffer[offset..offset + HEADER_LEN];
        let packet_type = header[0] as i8;
        let payload_format = PayloadFormat::from_code(header[1] as i8);
        // Any non-zero flag means deflated; encoding always writes 0 or 1.
        let deflated = header[2] != 0;
        let reserved = header[3] as i8;
        let payload_length = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);

        let start = offset + HEADER_LEN;
        if payload_length as usize > remaining - HEADER_LEN {
            return Err(ProtectError::frame_decode(
                offset + 4,
                format!(
                    "Declared payload length {} exceeds remaining buffer ({} bytes)",
                    payload_length,
                    remaining - HEADER_LEN
                ),
            ));
        }
        let raw = &buffer[start..start + payload_length as usize];

        let bytes = if deflated {
            inflate(raw).map_err(|e| ProtectError::frame_decode(start, e))?
        } else {
            raw.to_vec()
        };

        let payload = match payload_format {
            PayloadFormat::Json => serde_json::from_slice(&bytes).map(Payload::Json).map_err(|e| {
                ProtectError::frame_decode(start, format!("Invalid JSON payload: {}", e))
            })?,
            PayloadFormat::Utf8String => String::from_utf8(bytes).map(Payload::Text).map_err(|e| {
                ProtectError::frame_decode(start, format!("Invalid UTF-8 payload: {}", e))
            })?,
            PayloadFormat::RawBytes | PayloadFormat::Other(_) => Payload::Bytes(bytes),
        };

        trace!(
            "Decoded frame at offset {}: type={}, format={:?}, deflated={}, length={}",
            offset, packet_type, payload_format, deflated, payload_length
        );

        let frame = Self { packet_type, payload_format, deflated, reserved, payload_length, payload };
        let consumed = frame.total_length();
        Ok((frame, consumed))
    }

    /// Encode the frame, recomputing the payload length from the current payload.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let payload = self.wire_payload()?;
        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.push(self.packet_type as u8);
        out.push(self.payload_format.code() as u8);
        out.push(self.deflated as u8);
        out.push(self.reserved as u8);
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Re-encode the payload and update the stored length.
    pub fn refresh_length(&mut self) -> Result<()> {
        self.payload_length = self.wire_payload()?.len() as u32;
        Ok(())
    }

    fn wire_payload(&self) -> Result<Vec<u8>> {
        let bytes = match &self.payload {
            Payload::Json(value) => serde_json::to_vec(value)
                .map_err(|e| ProtectError::json("frame payload encoding", e))?,
            Payload::Text(text) => text.as_bytes().to_vec(),
            Payload::Bytes(bytes) => bytes.clone(),
        };

        if self.deflated {
            deflate(&bytes).map_err(|e| ProtectError::frame_decode(0, format!("Deflate failed: {}", e)))
        } else {
            Ok(bytes)
        }
    }
}

fn inflate(raw: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let mut out = Vec::new();
    if ZlibDecoder::new(raw).read_to_end(&mut out).is_ok() {
        return Ok(out);
    }

    out.clear();
    DeflateDecoder::new(raw)
        .read_to_end(&mut out)
        .map(|_| out)
        .map_err(|e| format!("Failed to inflate payload: {}", e))
}

fn deflate(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn arb_json() -> impl Strategy<Value = serde_json::Value> {
        let leaf = prop_oneof![
            Just(serde_json::Value::Null),
            any::<bool>().prop_map(serde_json::Value::from),
            any::<i64>().prop_map(serde_json::Value::from),
            "[a-zA-Z0-9 ]{0,16}".prop_map(serde_json::Value::from),
        ];
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(serde_json::Value::Array),
                prop::collection::btree_map("[a-zA-Z]{1,8}", inner, 0..6)
                    .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn arb_payload() -> impl Strategy<Value = (PayloadFormat, Payload)> {
        prop_oneof![
            arb_json().prop_map(|v| (PayloadFormat::Json, Payload::Json(v))),
            ".{0,64}".prop_map(|s| (PayloadFormat::Utf8String, Payload::Text(s))),
            prop::collection::vec(any::<u8>(), 0..128)
                .prop_map(|b| (PayloadFormat::RawBytes, Payload::Bytes(b))),
            (4i8..=i8::MAX, prop::collection::vec(any::<u8>(), 0..32))
                .prop_map(|(code, b)| (PayloadFormat::Other(code), Payload::Bytes(b))),
        ]
    }

    proptest! {
        #[test]
        fn frame_round_trip(
            packet_type in any::<i8>(),
            deflated in any::<bool>(),
            (format, payload) in arb_payload()
        ) {
            let frame = Frame::new(packet_type, format, deflated, payload).unwrap();
            let bytes = frame.encode().unwrap();
            prop_assert_eq!(bytes.len(), frame.total_length());

            let (decoded, consumed) = Frame::decode(&bytes, 0).unwrap();
            prop_assert_eq!(consumed, bytes.len());
            prop_assert_eq!(decoded, frame);
        }

        #[test]
        fn truncated_buffers_fail_cleanly(cut in 0usize..8) {
            let frame = Frame::json(1, json!({"action": "update"}), false).unwrap();
            let bytes = frame.encode().unwrap();
            let result = Frame::decode(&bytes[..cut], 0);
            let is_frame_error = matches!(result, Err(ProtectError::FrameDecode { .. }));
            prop_assert!(is_frame_error);
        }
    }

    #[test]
    fn header_is_big_endian() {
        let frame = Frame::new(2, PayloadFormat::RawBytes, false, Payload::Bytes(vec![0xAA; 258])).unwrap();
        let bytes = frame.encode().unwrap();
        assert_eq!(&bytes[..8], &[2, 3, 0, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn payload_longer_than_buffer_is_rejected() {
        let bytes = [1u8, 1, 0, 0, 0, 0, 0, 10, b'{', b'}'];
        let err = Frame::decode(&bytes, 0).unwrap_err();
        assert!(matches!(err, ProtectError::FrameDecode { offset: 4, .. }));
    }

    #[test]
    fn decode_at_offset() {
        let first = Frame::json(1, json!({"a": 1}), false).unwrap().encode().unwrap();
        let second = Frame::new(2, PayloadFormat::Utf8String, true, Payload::Text("hello".into())).unwrap();
        let mut buffer = first.clone();
        buffer.extend(second.encode().unwrap());

        let (decoded, consumed) = Frame::decode(&buffer, first.len()).unwrap();
        assert_eq!(consumed, buffer.len() - first.len());
        assert_eq!(decoded.payload, Payload::Text("hello".into()));
    }

    #[test]
    fn any_non_zero_deflated_flag_inflates() {
        let mut bytes = Frame::json(2, json!({"micVolume": 42}), true).unwrap().encode().unwrap();
        bytes[2] = 7;

        let (frame, _) = Frame::decode(&bytes, 0).unwrap();
        assert!(frame.deflated);
        assert_eq!(frame.as_json(), Some(&json!({"micVolume": 42})));
        assert_eq!(frame.encode().unwrap()[2], 1);
    }

    #[test]
    fn raw_deflate_payloads_are_accepted() {
        use flate2::write::DeflateEncoder;

        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"{"micVolume":42}"#).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut bytes = vec![2u8, 1, 1, 0];
        bytes.extend_from_slice(&(compressed.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&compressed);

        let (frame, _) = Frame::decode(&bytes, 0).unwrap();
        assert_eq!(frame.as_json(), Some(&json!({"micVolume": 42})));
    }

    #[test]
    fn invalid_json_is_a_frame_error() {
        let bytes = [1u8, 1, 0, 0, 0, 0, 0, 3, b'{', b'x', b'}'];
        assert!(matches!(Frame::decode(&bytes, 0), Err(ProtectError::FrameDecode { offset: 8, .. })));
    }

    #[test]
    fn unknown_format_is_kept_as_bytes() {
        let bytes = [1u8, 9, 0, 0, 0, 0, 0, 2, 0xDE, 0xAD];
        let (frame, _) = Frame::decode(&bytes, 0).unwrap();
        assert_eq!(frame.payload_format, PayloadFormat::Other(9));
        assert_eq!(frame.payload, Payload::Bytes(vec![0xDE, 0xAD]));
    }
}
