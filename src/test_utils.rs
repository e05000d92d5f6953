//! Test fixtures and an in-memory transport
//!
//! Frame builders produce valid headers and payloads without a device; [`MockConnector`]
//! scripts connect outcomes and hands each accepted connection's server side to the test.

#![cfg(any(test, feature = "benchmark"))]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::codec::encode_frame;
use crate::protocol::ClientMessage;
use crate::transport::{Connector, Endpoint, Incoming, Transport};
use crate::types::{CameraInfo, Frame, FrameInfo, Telemetry, Track};
use crate::{Result, ViewerError};

// ── Frame fixtures ───────────────────────────────────────────────

/// Header for a `res_x` x `res_y` frame numbered `frame_count`, without tracks.
pub fn frame_info(frame_count: u32, res_x: u32, res_y: u32) -> FrameInfo {
    FrameInfo {
        telemetry: Telemetry {
            time_on: 120_000 + i64::from(frame_count) * 111,
            ffc_state: "complete".to_string(),
            frame_count,
            frame_mean: 3100,
            temp_c: 24.5,
            last_ffc_temp_c: 24.0,
            last_ffc_time: 60_000,
        },
        camera: CameraInfo::with_resolution(res_x, res_y),
        tracks: None,
        app_version: None,
        binary_version: None,
        mode: None,
    }
}

/// Diagonal ramp typical of a warm background, never flat for more than one pixel.
pub fn gradient_pixels(res_x: u32, res_y: u32) -> Vec<u16> {
    (0..res_y).flat_map(|y| (0..res_x).map(move |x| 2900 + (x + y) as u16 * 3)).collect()
}

/// Decoded frame carrying `tracks`.
pub fn frame_with_tracks(frame_count: u32, res_x: u32, res_y: u32, tracks: Vec<Track>) -> Frame {
    let info = FrameInfo { tracks: Some(tracks), ..frame_info(frame_count, res_x, res_y) };
    Frame::new(info, gradient_pixels(res_x, res_y)).expect("fixture pixel count matches resolution")
}

/// Wire payload for a gradient frame.
pub fn encoded_frame(frame_count: u32, res_x: u32, res_y: u32) -> Vec<u8> {
    encode_frame(&frame_info(frame_count, res_x, res_y), &gradient_pixels(res_x, res_y))
        .expect("fixture header fits the length prefix")
}

// ── Mock transport ───────────────────────────────────────────────

/// Outcome of one scripted connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// Connector fails
    Refuse,
    /// Transport opens ready to send
    Accept,
    /// Transport opens but reports not ready for the first `n` checks
    AcceptNotReady(u32),
}

#[derive(Default)]
struct MockState {
    script: VecDeque<Attempt>,
    attempts: usize,
    endpoints: Vec<Endpoint>,
    servers: Vec<Option<MockServer>>,
}

/// Connector whose attempts follow a script. Attempts past the end of the script are refused.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn new(script: impl IntoIterator<Item = Attempt>) -> Self {
        let connector = Self::default();
        connector.lock().script.extend(script);
        connector
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append outcomes for later attempts.
    pub fn push_attempts(&self, attempts: impl IntoIterator<Item = Attempt>) {
        self.lock().script.extend(attempts);
    }

    /// Connect calls made so far.
    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.lock().endpoints.clone()
    }

    /// Server side of the `index`th accepted connection. Dropping it closes the connection.
    pub fn take_server(&self, index: usize) -> Option<MockServer> {
        self.lock().servers.get_mut(index).and_then(Option::take)
    }

    /// Number of connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.lock().servers.len()
    }
}

#[async_trait::async_trait]
impl Connector for MockConnector {
    type Transport = MockTransport;

    async fn connect(&self, endpoint: &Endpoint) -> Result<MockTransport> {
        let mut state = self.lock();
        state.attempts += 1;
        state.endpoints.push(endpoint.clone());

        let not_ready = match state.script.pop_front().unwrap_or(Attempt::Refuse) {
            Attempt::Refuse => {
                return Err(ViewerError::connection_failed(format!("{} refused", endpoint)));
            }
            Attempt::Accept => 0,
            Attempt::AcceptNotReady(checks) => checks,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        state.servers.push(Some(MockServer { tx: Some(tx), sent: Arc::clone(&sent), closed: Arc::clone(&closed) }));

        Ok(MockTransport { incoming: rx, sent, closed, not_ready: AtomicU32::new(not_ready) })
    }
}

/// Client side of a mock connection.
pub struct MockTransport {
    incoming: mpsc::UnboundedReceiver<Result<Incoming>>,
    sent: Arc<Mutex<Vec<ClientMessage>>>,
    closed: Arc<AtomicBool>,
    not_ready: AtomicU32,
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    fn is_open(&self) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }
        self.not_ready
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_err()
    }

    async fn send(&mut self, message: &ClientMessage) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ViewerError::transport_closed("send"));
        }
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).push(message.clone());
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<Incoming>> {
        self.incoming.recv().await
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.incoming.close();
        Ok(())
    }
}

/// Server side of a mock connection.
pub struct MockServer {
    tx: Option<mpsc::UnboundedSender<Result<Incoming>>>,
    sent: Arc<Mutex<Vec<ClientMessage>>>,
    closed: Arc<AtomicBool>,
}

impl MockServer {
    fn push(&self, item: Result<Incoming>) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(item);
        }
    }

    pub fn send_binary(&self, payload: Vec<u8>) {
        self.push(Ok(Incoming::Binary(payload)));
    }

    pub fn send_frame(&self, frame_count: u32) {
        self.send_binary(encoded_frame(frame_count, 4, 3));
    }

    pub fn send_text(&self, text: &str) {
        self.push(Ok(Incoming::Text(text.to_string())));
    }

    /// Fail the client's next receive.
    pub fn fail(&self, reason: &str) {
        self.push(Err(ViewerError::transport_closed(reason.to_string())));
    }

    /// Close from the server side.
    pub fn disconnect(&mut self) {
        self.tx = None;
    }

    /// Messages the client has sent.
    pub fn sent(&self) -> Vec<ClientMessage> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Whether the client closed this connection.
    pub fn closed_by_client(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
