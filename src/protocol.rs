//! Client to device handshake messages
//!
//! Sent as JSON text frames. The device keys registrations by `uuid` and drops
//! sockets that stop sending heartbeats.

use serde::{Deserialize, Serialize};

use crate::types::SessionId;
use crate::{Result, ViewerError};

/// Text notice the device sends when its camera is not producing frames
pub const CAMERA_DISCONNECTED_NOTICE: &str = "disconnected";

/// Messages the client sends over the stream socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Announce the client and start receiving frames
    Register {
        /// Client user agent
        data: String,
        uuid: SessionId,
    },
    /// Keep the registration alive
    Heartbeat { uuid: SessionId },
}

impl ClientMessage {
    pub fn register(user_agent: impl Into<String>, session_id: SessionId) -> Self {
        ClientMessage::Register { data: user_agent.into(), uuid: session_id }
    }

    pub fn heartbeat(session_id: SessionId) -> Self {
        ClientMessage::Heartbeat { uuid: session_id }
    }

    /// Serialize to the JSON text sent on the wire.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|source| ViewerError::Serialization {
            context: "client message".to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn register_wire_format() {
        let message = ClientMessage::register("thermview/0.1", SessionId::from_raw(1700000000123));
        let value: Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "Register", "data": "thermview/0.1", "uuid": 1700000000123i64})
        );
    }

    #[test]
    fn heartbeat_wire_format() {
        let message = ClientMessage::heartbeat(SessionId::from_raw(42));
        let value: Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"type": "Heartbeat", "uuid": 42}));
    }

    #[test]
    fn messages_parse_back() {
        let parsed: ClientMessage =
            serde_json::from_str(r#"{"type": "Heartbeat", "uuid": 7}"#).unwrap();
        assert_eq!(parsed, ClientMessage::heartbeat(SessionId::from_raw(7)));
    }
}
