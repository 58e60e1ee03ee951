//! Websocket wire protocol: frame codec and packet assembly.
//!
//! A [`WsPacket`] wraps the raw bytes of one websocket message and exposes the
//! action and data [`Frame`]s, decoded on first access.

mod frame;
mod packet;

pub use frame::{Frame, HEADER_LEN, Payload, PayloadFormat};
pub use packet::{Action, ActionHeader, WsPacket};
