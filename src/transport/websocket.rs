//! WebSocket transport over tokio-tungstenite

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};

use super::{Connector, Endpoint, Incoming, Transport};
use crate::protocol::ClientMessage;
use crate::{Result, ViewerError};

/// Opens WebSocket connections to the device stream endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Connector for WebSocketConnector {
    type Transport = WebSocketTransport;

    async fn connect(&self, endpoint: &Endpoint) -> Result<WebSocketTransport> {
        let url = endpoint.url();
        debug!("Opening WebSocket {}", url);

        let (stream, response) = connect_async(url.as_str()).await.map_err(|e| {
            ViewerError::connection_failed_with_source(format!("WebSocket handshake with {}", url), Box::new(e))
        })?;

        debug!(status = %response.status(), "WebSocket open");
        Ok(WebSocketTransport { stream, open: true })
    }
}

/// Live WebSocket to the device.
pub struct WebSocketTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    open: bool,
}

#[async_trait::async_trait]
impl Transport for WebSocketTransport {
    fn is_open(&self) -> bool {
        self.open
    }

    async fn send(&mut self, message: &ClientMessage) -> Result<()> {
        let text = message.to_json()?;
        trace!("Sending {}", text);
        self.stream
            .send(Message::text(text))
            .await
            .map_err(|e| ViewerError::transport("send", Box::new(e)))
    }

    async fn recv(&mut self) -> Option<Result<Incoming>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Binary(data))) => return Some(Ok(Incoming::Binary(data.to_vec()))),
                Some(Ok(Message::Text(text))) => {
                    return Some(Ok(Incoming::Text(text.as_str().to_owned())));
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "WebSocket close frame received");
                    self.open = false;
                    return None;
                }
                // Ping replies are queued by tungstenite on the next read or write
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    warn!("WebSocket receive error: {}", e);
                    self.open = false;
                    return Some(Err(ViewerError::transport("receive", Box::new(e))));
                }
                None => {
                    self.open = false;
                    return None;
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.stream.close(None).await.map_err(|e| ViewerError::transport("close", Box::new(e)))
    }
}
