//! Transport traits for the update websocket
//!
//! The connection supervisor only sees these traits, so tests can drive it
//! with in-memory channels instead of a live controller.

use crate::Result;

/// Opens update channels.
#[async_trait::async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a channel to `url`, sending `headers` with the handshake.
    async fn connect(&self, url: &str, headers: &[(String, String)]) -> Result<Box<dyn Channel>>;
}

/// One open update channel.
#[async_trait::async_trait]
pub trait Channel: Send + 'static {
    /// Next binary message.
    ///
    /// Returns:
    /// - `Some(Ok(bytes))` - A packet arrived
    /// - `Some(Err(e))` - Transport error; the channel should be considered dead
    /// - `None` - The remote closed the channel
    ///
    /// Control frames are handled internally and never returned.
    async fn recv(&mut self) -> Option<Result<Vec<u8>>>;

    /// Close the channel. Never fails; errors are logged.
    async fn close(&mut self);
}
