//! Connection management for the camera stream
//!
//! [`CameraConnection`] owns one device session across reconnects: it registers with a
//! stable [`SessionId`](crate::types::SessionId), keeps the registration alive with
//! heartbeats, decodes frames, retries dropped connections from a bounded
//! [`RetryBudget`], and stops once the received-message ceiling is passed.

mod manager;
mod retry;
mod status;

pub use manager::CameraConnection;
pub use retry::RetryBudget;
pub use status::{Callbacks, ConnectionStatus};
