//! Live frame-stream client for networked thermal cameras.
//!
//! thermview connects to a trap device's `/ws` stream socket, keeps the session registered,
//! decodes the binary frames it pushes, and rasterizes them for display.
//!
//! # Features
//!
//! - **Binary frame decoding**: length-prefixed JSON header plus little-endian 16-bit pixels
//! - **Resilient connection**: registration, heartbeats, bounded reconnects, message ceiling
//! - **Rendering**: per-frame min/max normalization and track annotation overlay
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use thermview::{CameraViewer, ViewerConfig, transport::WebSocketConnector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = ViewerConfig::default();
//!     config.endpoint.host = "192.168.4.1".into();
//!
//!     let mut viewer = CameraViewer::new(WebSocketConnector::new(), config)?;
//!     viewer.start().await?;
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(10)).await;
//!     println!("{}", viewer.display().caption);
//!
//!     viewer.shutdown().await?;
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Wire format and transport
pub mod codec;
pub mod protocol;
pub mod transport;

// Session and presentation
pub mod config;
pub mod connection;
pub mod render;
pub mod viewer;

// Core exports
pub use error::*;
pub use types::*;

pub use codec::{decode_frame, encode_frame};
pub use config::ViewerConfig;
pub use connection::{Callbacks, CameraConnection, ConnectionStatus};
pub use render::FrameRenderer;
pub use viewer::{CameraViewer, DisplayState};
