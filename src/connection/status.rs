//! Observable connection state and caller callbacks

use crate::types::{ConnectionState, Frame, SessionId};

/// Snapshot of the driver's session state, published after every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub session_id: SessionId,
    /// Frames missing from the sequence since the connection was created
    pub skipped_frames: u64,
    pub previous_frame: Option<u32>,
    /// Messages received since creation or the last restart
    pub received_messages: u64,
    /// Connect attempts left before the driver gives up
    pub retries_remaining: u32,
    /// True exactly while registered
    pub heartbeat_active: bool,
    pub retry_pending: bool,
    pub closing: bool,
    /// Connect attempts started, including automatic retries
    pub connection_attempts: u64,
    /// Set when the device reported its camera offline, cleared by the next frame
    pub camera_offline: bool,
}

impl ConnectionStatus {
    pub(crate) fn new(session_id: SessionId, retries: u32) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            session_id,
            skipped_frames: 0,
            previous_frame: None,
            received_messages: 0,
            retries_remaining: retries,
            heartbeat_active: false,
            retry_pending: false,
            closing: false,
            connection_attempts: 0,
            camera_offline: false,
        }
    }
}

type FrameCallback = Box<dyn FnMut(Frame) + Send>;
type StateCallback = Box<dyn FnMut(ConnectionState) + Send>;

/// Callbacks invoked on the driver task.
///
/// They run inline with event processing; a slow callback delays the next message.
pub struct Callbacks {
    on_frame: FrameCallback,
    on_state_change: StateCallback,
}

impl Callbacks {
    pub fn new(
        on_frame: impl FnMut(Frame) + Send + 'static,
        on_state_change: impl FnMut(ConnectionState) + Send + 'static,
    ) -> Self {
        Self { on_frame: Box::new(on_frame), on_state_change: Box::new(on_state_change) }
    }

    /// Callbacks that ignore everything.
    pub fn noop() -> Self {
        Self::new(|_| {}, |_| {})
    }

    pub(crate) fn frame(&mut self, frame: Frame) {
        (self.on_frame)(frame)
    }

    pub(crate) fn state(&mut self, state: ConnectionState) {
        (self.on_state_change)(state)
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks").finish_non_exhaustive()
    }
}
