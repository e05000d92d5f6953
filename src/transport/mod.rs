//! Transport abstraction for the frame stream

use std::fmt;

use crate::Result;
use crate::protocol::ClientMessage;

pub mod websocket;

pub use websocket::{WebSocketConnector, WebSocketTransport};

/// Path of the stream socket on the device's management interface
pub const STREAM_PATH: &str = "/ws";

/// Host and port of the management interface serving the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    /// WebSocket URL of the stream socket.
    pub fn url(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, STREAM_PATH)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A message received from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// Encoded frame payload
    Binary(Vec<u8>),
    /// Text notice, e.g. `"disconnected"`
    Text(String),
}

/// An open, bidirectional message transport.
///
/// Owned exclusively by one connection driver.
#[async_trait::async_trait]
pub trait Transport: Send + 'static {
    /// Whether the transport is ready to send
    fn is_open(&self) -> bool;

    /// Send one client message as a text frame
    async fn send(&mut self, message: &ClientMessage) -> Result<()>;

    /// Receive the next complete message
    ///
    /// Returns:
    /// - `Some(Ok(message))` - A message arrived
    /// - `Some(Err(e))` - The transport failed; it is closed afterwards
    /// - `None` - The peer closed the transport
    async fn recv(&mut self) -> Option<Result<Incoming>>;

    /// Close the transport
    async fn close(&mut self) -> Result<()>;
}

/// Opens transports to an endpoint. Resolving successfully is the "open" event.
#[async_trait::async_trait]
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport;

    async fn connect(&self, endpoint: &Endpoint) -> Result<Self::Transport>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_uses_stream_path() {
        let endpoint = Endpoint::new("192.168.4.1", 80);
        assert_eq!(endpoint.url(), "ws://192.168.4.1:80/ws");
        assert_eq!(endpoint.to_string(), "192.168.4.1:80");
    }
}
