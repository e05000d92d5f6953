//! Connection handle and the driver task that owns the session

use std::future::pending;
use std::sync::Arc;

use futures::Stream;
use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::retry::RetryBudget;
use super::status::{Callbacks, ConnectionStatus};
use crate::codec::{FrameSequence, decode_frame};
use crate::config::ConnectionConfig;
use crate::protocol::{CAMERA_DISCONNECTED_NOTICE, ClientMessage};
use crate::transport::{Connector, Endpoint, Incoming, Transport};
use crate::types::{ConnectionState, SessionId, StopReason};
use crate::{Result, ViewerError};

type Ack = oneshot::Sender<()>;

enum Command {
    Connect(Ack),
    Close(Ack),
    Restart(Ack),
}

/// Handle to a camera stream connection.
///
/// The session lives on a spawned driver task; this handle only sends commands and reads
/// status. Dropping the handle stops the driver and closes the transport quietly.
pub struct CameraConnection {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ConnectionStatus>,
    session_id: SessionId,
    endpoint: Endpoint,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl CameraConnection {
    /// Spawn the driver and start connecting.
    ///
    /// Must be called within a tokio runtime.
    pub fn spawn<C: Connector>(
        connector: C,
        endpoint: Endpoint,
        config: ConnectionConfig,
        session_id: SessionId,
        callbacks: Callbacks,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) =
            watch::channel(ConnectionStatus::new(session_id, config.retry_attempts));
        let cancel = CancellationToken::new();

        let driver = ConnectionDriver {
            connector: Arc::new(connector),
            endpoint: endpoint.clone(),
            retry: RetryBudget::new(config.retry_attempts),
            config,
            session_id,
            callbacks,
            status_tx,
            state: ConnectionState::Disconnected,
            transport: None,
            pending: None,
            heartbeat: None,
            register_at: None,
            retry_at: None,
            sequence: FrameSequence::new(),
            received: 0,
            closing: false,
            attempts: 0,
            camera_offline: false,
        };

        let cancel_driver = cancel.clone();
        let task = tokio::spawn(async move {
            driver.run(command_rx, cancel_driver).await;
        });

        Self { commands: command_tx, status: status_rx, session_id, endpoint, cancel, task: Some(task) }
    }

    /// Drop any live transport, refill the retry budget and connect again.
    pub async fn connect(&self) -> Result<()> {
        self.command(Command::Connect).await
    }

    /// Stop viewing: no retries, no heartbeat, transport closed.
    pub async fn close(&self) -> Result<()> {
        self.command(Command::Close).await
    }

    /// Reset the received-message counter and connect.
    pub async fn restart(&self) -> Result<()> {
        self.command(Command::Restart).await
    }

    async fn command(&self, make: impl FnOnce(Ack) -> Command) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.commands.send(make(ack_tx)).map_err(|_| ViewerError::DriverStopped)?;
        ack_rx.await.map_err(|_| ViewerError::DriverStopped)
    }

    /// Latest status snapshot.
    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Status snapshots, starting with the current one.
    pub fn status_updates(&self) -> impl Stream<Item = ConnectionStatus> + 'static {
        WatchStream::new(self.status.clone())
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Stop the driver and wait for it to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Connection driver ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for CameraConnection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for CameraConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraConnection")
            .field("endpoint", &self.endpoint)
            .field("session_id", &self.session_id)
            .field("status", &*self.status.borrow())
            .finish()
    }
}

enum Event<T> {
    Command(Option<Command>),
    Opened(Result<T>),
    Message(Option<Result<Incoming>>),
    Heartbeat,
    RegisterDue,
    RetryDue,
    Cancelled,
}

/// Session state, owned by the driver task.
struct ConnectionDriver<C: Connector> {
    connector: Arc<C>,
    endpoint: Endpoint,
    config: ConnectionConfig,
    session_id: SessionId,
    callbacks: Callbacks,
    status_tx: watch::Sender<ConnectionStatus>,

    state: ConnectionState,
    transport: Option<C::Transport>,
    pending: Option<BoxFuture<'static, Result<C::Transport>>>,
    /// `Some` exactly while registered
    heartbeat: Option<Interval>,
    register_at: Option<Instant>,
    retry_at: Option<Instant>,
    retry: RetryBudget,
    sequence: FrameSequence,
    received: u64,
    closing: bool,
    attempts: u64,
    camera_offline: bool,
}

impl<C: Connector> ConnectionDriver<C> {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>, cancel: CancellationToken) {
        info!(session = %self.session_id, "Connection driver started for {}", self.endpoint);
        self.connect().await;
        self.publish();

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => Event::Cancelled,
                command = commands.recv() => Event::Command(command),
                result = poll_pending(&mut self.pending) => Event::Opened(result),
                message = recv_next(&mut self.transport) => Event::Message(message),
                _ = tick(&mut self.heartbeat) => Event::Heartbeat,
                _ = sleep_until(self.register_at) => Event::RegisterDue,
                _ = sleep_until(self.retry_at) => Event::RetryDue,
            };

            let ack = match event {
                Event::Cancelled | Event::Command(None) => {
                    self.shutdown().await;
                    break;
                }
                Event::Command(Some(command)) => Some(self.apply(command).await),
                Event::Opened(Ok(transport)) => {
                    self.pending = None;
                    debug!(attempt = self.attempts, "Transport open");
                    self.transport = Some(transport);
                    self.register().await;
                    None
                }
                Event::Opened(Err(e)) => {
                    self.pending = None;
                    warn!(attempt = self.attempts, "Connect failed: {}", e);
                    self.handle_close();
                    None
                }
                Event::Message(Some(Ok(message))) => {
                    self.handle_message(message).await;
                    None
                }
                Event::Message(Some(Err(e))) => {
                    warn!("Transport error: {}", e);
                    self.handle_close();
                    None
                }
                Event::Message(None) => {
                    info!("Transport closed by device");
                    self.handle_close();
                    None
                }
                Event::Heartbeat => {
                    self.heartbeat().await;
                    None
                }
                Event::RegisterDue => {
                    self.register().await;
                    None
                }
                Event::RetryDue => {
                    self.retry_at = None;
                    info!(remaining = self.retry.remaining(), "Retrying connection");
                    self.notify(ConnectionState::Connecting);
                    self.start_attempt();
                    None
                }
            };

            self.publish();
            if let Some(ack) = ack {
                let _ = ack.send(());
            }
        }

        info!(
            session = %self.session_id,
            received = self.received,
            skipped = self.sequence.skipped(),
            "Connection driver ended"
        );
    }

    async fn apply(&mut self, command: Command) -> Ack {
        match command {
            Command::Connect(ack) => {
                self.connect().await;
                ack
            }
            Command::Close(ack) => {
                self.close().await;
                ack
            }
            Command::Restart(ack) => {
                debug!(received = self.received, "Resetting message counter");
                self.received = 0;
                self.connect().await;
                ack
            }
        }
    }

    async fn connect(&mut self) {
        self.closing = false;
        self.retry_at = None;
        self.register_at = None;
        self.heartbeat = None;
        self.pending = None;
        self.drop_transport().await;
        self.retry.refill();
        self.notify(ConnectionState::Connecting);
        self.start_attempt();
    }

    fn start_attempt(&mut self) {
        self.attempts += 1;
        info!(attempt = self.attempts, "Connecting to {}", self.endpoint.url());
        let connector = Arc::clone(&self.connector);
        let endpoint = self.endpoint.clone();
        self.pending = Some(Box::pin(async move { connector.connect(&endpoint).await }));
    }

    async fn register(&mut self) {
        self.register_at = None;
        let Some(transport) = self.transport.as_mut() else {
            return;
        };

        if !transport.is_open() {
            let delay = self.config.register_retry_delay();
            debug!("Transport not ready, registering again in {:?}", delay);
            self.register_at = Some(Instant::now() + delay);
            return;
        }

        let message = ClientMessage::register(self.config.user_agent.clone(), self.session_id);
        if let Err(e) = transport.send(&message).await {
            warn!("Register failed: {}", e);
            return;
        }

        info!(session = %self.session_id, "Registered with device");
        self.notify(ConnectionState::Connected);
        self.retry.refill();

        let period = self.config.heartbeat_interval();
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.heartbeat = Some(interval);
    }

    async fn heartbeat(&mut self) {
        let Some(transport) = self.transport.as_mut() else {
            self.heartbeat = None;
            return;
        };
        trace!(session = %self.session_id, "Heartbeat");
        if let Err(e) = transport.send(&ClientMessage::heartbeat(self.session_id)).await {
            warn!("Heartbeat failed: {}", e);
        }
    }

    async fn handle_message(&mut self, message: Incoming) {
        let limit = self.config.message_limit;
        if limit.is_exceeded_by(self.received) {
            debug!("Message past the ceiling dropped");
            self.stop_for_limit().await;
            return;
        }

        match message {
            Incoming::Binary(payload) => match decode_frame(&payload) {
                Ok(frame) => {
                    let gap = self.sequence.observe(frame.frame_number());
                    if gap > 0 {
                        debug!(
                            frame = frame.frame_number(),
                            gap,
                            total = self.sequence.skipped(),
                            "Skipped frames"
                        );
                    }
                    self.camera_offline = false;
                    self.callbacks.frame(frame);
                }
                Err(e) => warn!(bytes = payload.len(), "Dropping frame: {}", e),
            },
            Incoming::Text(text) if text == CAMERA_DISCONNECTED_NOTICE => {
                warn!("Device reports its camera is disconnected");
                self.camera_offline = true;
            }
            Incoming::Text(text) => info!("Device message: {}", text),
        }

        self.received += 1;
        if limit.is_exceeded_by(self.received) {
            self.stop_for_limit().await;
        }
    }

    async fn stop_for_limit(&mut self) {
        info!(received = self.received, "Message ceiling reached, stopping");
        self.closing = true;
        self.heartbeat = None;
        self.register_at = None;
        self.drop_transport().await;
        self.notify(ConnectionState::Stopped(StopReason::MessageLimit));
    }

    /// Unexpected end of a transport or a failed attempt.
    fn handle_close(&mut self) {
        self.heartbeat = None;
        self.register_at = None;
        self.transport = None;
        self.notify(ConnectionState::Disconnected);

        if self.closing {
            return;
        }

        match self.retry.take() {
            Some(remaining) => {
                let delay = self.config.retry_delay();
                info!(remaining, "Reconnecting in {:?}", delay);
                self.retry_at = Some(Instant::now() + delay);
            }
            None => {
                warn!(attempts = self.attempts, "Connect attempts exhausted, giving up");
                self.notify(ConnectionState::Stopped(StopReason::RetriesExhausted));
            }
        }
    }

    async fn close(&mut self) {
        info!("Closing connection");
        self.closing = true;
        self.retry_at = None;
        self.register_at = None;
        self.pending = None;
        self.heartbeat = None;
        if self.drop_transport().await {
            self.notify(ConnectionState::Disconnected);
        }
        self.notify(ConnectionState::Stopped(StopReason::Closed));
    }

    async fn shutdown(&mut self) {
        self.closing = true;
        self.retry_at = None;
        self.register_at = None;
        self.pending = None;
        self.heartbeat = None;
        self.drop_transport().await;
    }

    /// Close the transport without notifying. Returns whether one was live.
    async fn drop_transport(&mut self) -> bool {
        let Some(mut transport) = self.transport.take() else {
            return false;
        };
        if let Err(e) = transport.close().await {
            debug!("Error closing transport: {}", e);
        }
        true
    }

    fn notify(&mut self, state: ConnectionState) {
        debug!(from = ?self.state, to = ?state, "Connection state");
        self.state = state;
        self.callbacks.state(state);
    }

    fn publish(&self) {
        self.status_tx.send_replace(ConnectionStatus {
            state: self.state,
            session_id: self.session_id,
            skipped_frames: self.sequence.skipped(),
            previous_frame: self.sequence.previous(),
            received_messages: self.received,
            retries_remaining: self.retry.remaining(),
            heartbeat_active: self.heartbeat.is_some(),
            retry_pending: self.retry_at.is_some(),
            closing: self.closing,
            connection_attempts: self.attempts,
            camera_offline: self.camera_offline,
        });
    }
}

async fn poll_pending<T>(attempt: &mut Option<BoxFuture<'static, Result<T>>>) -> Result<T> {
    match attempt {
        Some(future) => future.await,
        None => pending().await,
    }
}

async fn recv_next<T: Transport>(transport: &mut Option<T>) -> Option<Result<Incoming>> {
    match transport {
        Some(transport) => transport.recv().await,
        None => pending().await,
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending::<()>().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => pending::<()>().await,
    }
}
