//! Connection lifecycle notifications

use serde::{Deserialize, Serialize};

/// Why a stream stopped and needs an explicit restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum StopReason {
    /// The received-message ceiling was exceeded
    MessageLimit,
    /// Automatic reconnects used up the retry budget
    RetriesExhausted,
    /// The caller closed the connection
    Closed,
}

impl StopReason {
    /// User-facing text for the stopped indicator.
    pub fn message(self) -> &'static str {
        match self {
            StopReason::MessageLimit => "Timeout for camera viewing.",
            StopReason::RetriesExhausted => "Lost connection to the camera.",
            StopReason::Closed => "Camera viewing stopped.",
        }
    }
}

/// State reported to the `on_state_change` callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum ConnectionState {
    /// A transport is being opened
    Connecting,
    /// Registered with the device and receiving frames
    Connected,
    /// No transport; a reconnect may be pending
    #[default]
    Disconnected,
    /// Terminal until `connect()` or `restart()`
    Stopped(StopReason),
}

impl ConnectionState {
    pub fn is_stopped(self) -> bool {
        matches!(self, ConnectionState::Stopped(_))
    }
}
