//! Page-level viewing controller
//!
//! Wires a [`CameraConnection`] to a [`FrameRenderer`] and keeps the display state a
//! presenter needs: the latest raster, the frame caption, and the stopped message shown
//! in place of the canvas once viewing stops.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::Result;
use crate::config::ViewerConfig;
use crate::connection::{Callbacks, CameraConnection, ConnectionStatus};
use crate::render::FrameRenderer;
use crate::transport::Connector;
use crate::types::{ConnectionState, SessionId};

/// What the page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayState {
    pub state: ConnectionState,
    /// Shown in place of the canvas after viewing stops
    pub stopped_message: Option<String>,
    pub canvas_visible: bool,
    /// `frame N` for the last rendered frame
    pub caption: String,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self { state: ConnectionState::Disconnected, stopped_message: None, canvas_visible: true, caption: String::new() }
    }
}

/// Starts, restarts and stops camera viewing.
pub struct CameraViewer<C: Connector + Clone> {
    connector: C,
    config: ViewerConfig,
    session_id: SessionId,
    connection: Option<CameraConnection>,
    renderer: Arc<Mutex<FrameRenderer>>,
    display: Arc<Mutex<DisplayState>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<C: Connector + Clone> CameraViewer<C> {
    pub fn new(connector: C, config: ViewerConfig) -> Result<Self> {
        config.validate()?;
        let renderer = FrameRenderer::from_config(&config.render)?;
        Ok(Self {
            connector,
            config,
            session_id: SessionId::generate(),
            connection: None,
            renderer: Arc::new(Mutex::new(renderer)),
            display: Arc::new(Mutex::new(DisplayState::default())),
        })
    }

    /// Use a fixed session id instead of a generated one.
    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = session_id;
        self
    }

    /// Begin viewing; identical to [`restart`](Self::restart).
    pub async fn start(&mut self) -> Result<()> {
        self.restart().await
    }

    /// Show the canvas again and reconnect, reusing the existing connection if there is one.
    pub async fn restart(&mut self) -> Result<()> {
        {
            let mut display = lock(&self.display);
            display.stopped_message = None;
            display.canvas_visible = true;
        }

        match &self.connection {
            Some(connection) => {
                debug!("Restarting existing connection");
                connection.restart().await
            }
            None => {
                info!(session = %self.session_id, "Starting camera viewing");
                self.connection = Some(CameraConnection::spawn(
                    self.connector.clone(),
                    self.config.endpoint.endpoint(),
                    self.config.connection.clone(),
                    self.session_id,
                    self.callbacks(),
                ));
                Ok(())
            }
        }
    }

    /// Stop viewing and close the connection.
    pub async fn stop(&self) -> Result<()> {
        match &self.connection {
            Some(connection) => connection.close().await,
            None => Ok(()),
        }
    }

    fn callbacks(&self) -> Callbacks {
        let renderer = Arc::clone(&self.renderer);
        let frame_display = Arc::clone(&self.display);
        let state_display = Arc::clone(&self.display);

        Callbacks::new(
            move |frame| {
                let mut renderer = lock(&renderer);
                renderer.render(&frame);
                lock(&frame_display).caption = renderer.caption().to_string();
            },
            move |state| {
                let mut display = lock(&state_display);
                display.state = state;
                if let ConnectionState::Stopped(reason) = state {
                    display.stopped_message = Some(reason.message().to_string());
                    display.canvas_visible = false;
                }
            },
        )
    }

    pub fn display(&self) -> DisplayState {
        lock(&self.display).clone()
    }

    /// Shared renderer; lock it to read the latest raster.
    pub fn renderer(&self) -> Arc<Mutex<FrameRenderer>> {
        Arc::clone(&self.renderer)
    }

    pub fn connection(&self) -> Option<&CameraConnection> {
        self.connection.as_ref()
    }

    pub fn status(&self) -> Option<ConnectionStatus> {
        self.connection.as_ref().map(CameraConnection::status)
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Close the connection and stop its driver.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(connection) = self.connection.take() {
            connection.close().await?;
            connection.shutdown().await;
        }
        Ok(())
    }
}
