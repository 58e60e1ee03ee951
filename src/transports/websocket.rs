//! Websocket transport over tokio-tungstenite

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use crate::transport::{Channel, Connector};
use crate::{ProtectError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connector for the controller's `ws/updates` endpoint.
#[derive(Debug, Clone, Default)]
pub struct WebsocketConnector;

impl WebsocketConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Connector for WebsocketConnector {
    async fn connect(&self, url: &str, headers: &[(String, String)]) -> Result<Box<dyn Channel>> {
        let mut request = url
            .into_client_request()
            .map_err(|e| ProtectError::connection_failed_with_source(format!("Invalid websocket URL {}", url), e.into()))?;

        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ProtectError::connection_failed_with_source(format!("Invalid header {}", name), e.into()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ProtectError::connection_failed_with_source("Invalid header value", e.into()))?;
            request.headers_mut().insert(name, value);
        }

        let (stream, response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| ProtectError::connection_failed_with_source("Websocket handshake failed", e.into()))?;

        debug!(status = %response.status(), "Websocket connected");
        Ok(Box::new(WebsocketChannel { stream }))
    }
}

struct WebsocketChannel {
    stream: WsStream,
}

#[async_trait::async_trait]
impl Channel for WebsocketChannel {
    async fn recv(&mut self) -> Option<Result<Vec<u8>>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Binary(data)) => return Some(Ok(data)),
                Ok(Message::Ping(data)) => {
                    trace!("Websocket ping");
                    if let Err(e) = self.stream.send(Message::Pong(data)).await {
                        return Some(Err(transport_error(e)));
                    }
                }
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "Websocket closed by controller");
                    return None;
                }
                Ok(Message::Text(text)) => {
                    warn!("Ignoring unexpected text message ({} bytes)", text.len());
                }
                Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                Err(e) => return Some(Err(transport_error(e))),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!("Websocket close failed: {}", e);
        }
    }
}

fn transport_error(e: tungstenite::Error) -> ProtectError {
    ProtectError::connection_failed_with_source("Websocket read failed", e.into())
}
