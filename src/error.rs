//! Error types for the frame-stream client.
//!
//! Every fallible operation in thermview returns [`ViewerError`]. None of these errors
//! cross the callback boundary of a running connection: the connection driver logs them
//! and turns them into state transitions. They surface directly only from constructors,
//! the codec, and configuration loading.
//!
//! ## Error Categories
//!
//! - **Connection Errors**: The device endpoint could not be reached or the handshake failed
//! - **Transport Errors**: An established socket failed to send or receive
//! - **Decode Errors**: A binary frame payload was malformed
//! - **Serialization Errors**: A JSON message could not be produced or parsed
//! - **Configuration Errors**: Invalid configuration files or query parameters
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use thermview::ViewerError;
//!
//! let error = ViewerError::connection_failed("connection refused");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for thermview operations.
pub type Result<T, E = ViewerError> = std::result::Result<T, E>;

/// Main error type for thermview operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ViewerError {
    #[error("Failed to connect to camera stream: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Transport failure during {operation}")]
    Transport {
        operation: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Malformed frame payload ({context}): {details}")]
    Decode { context: String, details: String },

    #[error("JSON error in {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {reason}")]
    Config {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("File error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection driver is no longer running")]
    DriverStopped,
}

impl ViewerError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            ViewerError::Connection { .. } => true,
            ViewerError::Transport { .. } => true,
            ViewerError::Decode { .. } => false,
            ViewerError::Serialization { .. } => false,
            ViewerError::Config { .. } => false,
            ViewerError::File { .. } => false,
            ViewerError::DriverStopped => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            ViewerError::Connection { .. } => vec![
                "Check the device is powered and reachable on the network",
                "Verify the host and port of the management interface",
                "Wait for the automatic reconnect or restart viewing",
            ],
            ViewerError::Transport { .. } => vec![
                "Check Wi-Fi signal strength to the device",
                "Restart viewing to open a fresh connection",
            ],
            ViewerError::Decode { .. } => vec![
                "Check the device firmware matches this client version",
                "Inspect the frame header JSON for missing fields",
            ],
            ViewerError::Serialization { .. } => vec![
                "Check message fields are valid JSON values",
                "Verify the protocol version of the device",
            ],
            ViewerError::Config { .. } => vec![
                "Check the configuration file syntax",
                "Regenerate a default configuration with --gen-config",
            ],
            ViewerError::File { .. } => vec![
                "Check the file exists and is readable",
                "Check file permissions",
            ],
            ViewerError::DriverStopped => vec![
                "Create a new connection",
                "Check the tokio runtime is still running",
            ],
        }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        ViewerError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors with source.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        ViewerError::Connection { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for transport errors with source.
    pub fn transport(
        operation: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        ViewerError::Transport { operation: operation.into(), source: Some(source) }
    }

    /// Helper constructor for transport errors without an underlying cause.
    pub fn transport_closed(operation: impl Into<String>) -> Self {
        ViewerError::Transport { operation: operation.into(), source: None }
    }

    /// Helper constructor for frame decode errors.
    pub fn decode(context: impl Into<String>, details: impl Into<String>) -> Self {
        ViewerError::Decode { context: context.into(), details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        ViewerError::Config { reason: reason.into(), source: None }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        ViewerError::File { path, source }
    }
}

impl From<std::io::Error> for ViewerError {
    fn from(err: std::io::Error) -> Self {
        ViewerError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        ViewerError::Serialization { context: "JSON".to_string(), source: err }
    }
}

impl From<serde_yaml_ng::Error> for ViewerError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        ViewerError::Config { reason: "YAML parse failure".to_string(), source: Some(Box::new(err)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
          #[test]
          fn error_messages_carry_their_context(
            reason in ".*",
            context in "\\w+",
            details in ".*"
          ) {
            let connection = ViewerError::connection_failed(reason.clone());
            prop_assert!(connection.to_string().contains(&reason));

            let decode = ViewerError::decode(context.clone(), details.clone());
            let message = decode.to_string();
            prop_assert!(message.contains(&context));
            prop_assert!(message.contains(&details));

            let config = ViewerError::config(reason.clone());
            prop_assert!(config.to_string().contains(&reason));
          }

          #[test]
          fn source_chain_preserves_base_message(
            base_message in ".*",
            layers in 1usize..4usize
          ) {
            let mut current: Box<dyn std::error::Error + Send + Sync> =
              Box::new(std::io::Error::other(base_message.clone()));
            for i in 0..layers {
              current = Box::new(ViewerError::transport(format!("layer {}", i), current));
            }
            let top = ViewerError::connection_failed_with_source("top", current);

            let mut depth = 0;
            let mut found = false;
            let mut next = std::error::Error::source(&top);
            while let Some(source) = next {
              depth += 1;
              if source.to_string().contains(&base_message) {
                found = true;
              }
              next = std::error::Error::source(source);
              if depth > 10 {
                break;
              }
            }

            prop_assert_eq!(depth, layers + 1);
            prop_assert!(found, "Base message '{}' not found in chain", base_message);
          }
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<ViewerError>();

        let error = ViewerError::connection_failed("test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn retry_classification() {
        assert!(ViewerError::connection_failed("refused").is_retryable());
        assert!(ViewerError::transport_closed("send").is_retryable());
        assert!(!ViewerError::decode("header", "bad json").is_retryable());
        assert!(!ViewerError::config("bad port").is_retryable());
        assert!(!ViewerError::DriverStopped.is_retryable());

        for error in [
            ViewerError::connection_failed("refused"),
            ViewerError::decode("header", "bad json"),
            ViewerError::DriverStopped,
        ] {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty());
            assert!(suggestions.iter().all(|s| s.len() > 5));
        }
    }

    #[test]
    fn from_conversions_work() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "config.yaml");
        match ViewerError::from(io_err) {
            ViewerError::File { source, .. } => assert_eq!(source.to_string(), "config.yaml"),
            other => panic!("Expected File error variant, got {other:?}"),
        }

        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        assert!(matches!(ViewerError::from(json_err), ViewerError::Serialization { .. }));

        let yaml_err = serde_yaml_ng::from_str::<u32>("[1, 2").unwrap_err();
        assert!(matches!(ViewerError::from(yaml_err), ViewerError::Config { .. }));
    }
}
