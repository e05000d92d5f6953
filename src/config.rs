//! Viewer configuration.
//!
//! Loaded from YAML, every field optional. Page query parameters (`timeout=off`)
//! are applied on top with [`ViewerConfig::apply_query`].

use std::path::Path;
use std::time::Duration;

use image::Rgba;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::transport::Endpoint;
use crate::{Result, ViewerError};

/// Top-level configuration for a viewer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Device address.
    pub endpoint: EndpointConfig,
    /// Handshake, heartbeat, and retry tuning.
    pub connection: ConnectionConfig,
    /// Frame rendering.
    pub render: RenderConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Device address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub host: String,
    pub port: u16,
}

/// Ceiling on received messages before viewing stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLimit {
    Limited(u64),
    Unlimited,
}

impl MessageLimit {
    /// Whether `received` messages is past the ceiling.
    pub fn is_exceeded_by(self, received: u64) -> bool {
        match self {
            MessageLimit::Limited(limit) => received > limit,
            MessageLimit::Unlimited => false,
        }
    }
}

impl Default for MessageLimit {
    fn default() -> Self {
        MessageLimit::Limited(200)
    }
}

/// Connection tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Heartbeat period while registered, in milliseconds.
    pub heartbeat_interval_ms: u64,
    /// Delay before re-checking a transport that is not ready to register.
    pub register_retry_ms: u64,
    /// Connect attempts per drop sequence, counting the one that failed first.
    pub retry_attempts: u32,
    /// Delay before each automatic reconnect, in milliseconds.
    pub retry_delay_ms: u64,
    /// Received-message ceiling.
    pub message_limit: MessageLimit,
    /// Sent in the `Register` message.
    pub user_agent: String,
}

/// Rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Track colours as `#rrggbb`, indexed by track position.
    pub palette: Vec<String>,
    /// Label font size in pixels.
    pub label_font_px: f32,
}

/// Logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for EndpointConfig {
    fn default() -> Self {
        Self { host: "192.168.4.1".into(), port: 80 }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: 5000,
            register_retry_ms: 100,
            retry_attempts: 5,
            retry_delay_ms: 1000,
            message_limit: MessageLimit::default(),
            user_agent: format!("thermview/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            palette: ["#ff0000", "#00ff00", "#ffff00", "#80ffff", "#ff80ff", "#ff8000"]
                .into_iter()
                .map(String::from)
                .collect(),
            label_font_px: 13.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

// ── Accessors ────────────────────────────────────────────────────

impl EndpointConfig {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }
}

impl ConnectionConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn register_retry_delay(&self) -> Duration {
        Duration::from_millis(self.register_retry_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Reject values the driver cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.heartbeat_interval_ms == 0 {
            return Err(ViewerError::config("heartbeat_interval_ms must be positive"));
        }
        if self.register_retry_ms == 0 {
            return Err(ViewerError::config("register_retry_ms must be positive"));
        }
        Ok(())
    }
}

impl RenderConfig {
    /// Parse the palette into RGBA colours.
    pub fn palette_colors(&self) -> Result<Vec<Rgba<u8>>> {
        if self.palette.is_empty() {
            return Err(ViewerError::config("render.palette must not be empty"));
        }
        self.palette.iter().map(|hex| parse_hex_color(hex)).collect()
    }
}

fn parse_hex_color(hex: &str) -> Result<Rgba<u8>> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(ViewerError::config(format!("invalid colour '{}', expected #rrggbb", hex)));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| ViewerError::config(format!("invalid colour '{}', expected #rrggbb", hex)))
    };
    Ok(Rgba([channel(0..2)?, channel(2..4)?, channel(4..6)?, 255]))
}

// ── Loading ──────────────────────────────────────────────────────

impl ViewerConfig {
    /// Parse a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_yaml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No config at {}; using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(ViewerError::file_error(path.to_path_buf(), e)),
        }
    }

    /// Serialize as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.connection.validate()?;
        self.render.palette_colors()?;
        Ok(())
    }

    /// Apply page query parameters, e.g. `timeout=off&debug=1`.
    ///
    /// `timeout=off` lifts the received-message ceiling; other keys are ignored.
    pub fn apply_query(&mut self, query: &str) {
        let query = query.strip_prefix('?').unwrap_or(query);
        for pair in query.split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if key == "timeout" && value == "off" {
                self.connection.message_limit = MessageLimit::Unlimited;
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_device_protocol() {
        let config = ViewerConfig::default();
        assert_eq!(config.connection.heartbeat_interval(), Duration::from_secs(5));
        assert_eq!(config.connection.register_retry_delay(), Duration::from_millis(100));
        assert_eq!(config.connection.retry_attempts, 5);
        assert_eq!(config.connection.retry_delay(), Duration::from_secs(1));
        assert_eq!(config.connection.message_limit, MessageLimit::Limited(200));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn yaml_roundtrip() {
        let config = ViewerConfig::default();
        let text = config.to_yaml().unwrap();
        assert!(text.contains("heartbeat_interval_ms"));
        assert_eq!(ViewerConfig::from_yaml(&text).unwrap(), config);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = ViewerConfig::from_yaml("endpoint:\n  host: trap.local\n").unwrap();
        assert_eq!(config.endpoint.host, "trap.local");
        assert_eq!(config.endpoint.port, 80);
        assert_eq!(config.connection.retry_attempts, 5);
    }

    #[test]
    fn yaml_message_limit_variants() {
        let unlimited = ViewerConfig::from_yaml("connection:\n  message_limit: unlimited\n").unwrap();
        assert_eq!(unlimited.connection.message_limit, MessageLimit::Unlimited);

        let limited =
            ViewerConfig::from_yaml("connection:\n  message_limit: !limited 50\n").unwrap();
        assert_eq!(limited.connection.message_limit, MessageLimit::Limited(50));
    }

    #[test]
    fn invalid_yaml_is_config_error() {
        let err = ViewerConfig::from_yaml("endpoint: [").unwrap_err();
        assert!(matches!(err, ViewerError::Config { .. }));
    }

    #[test]
    fn zero_heartbeat_rejected() {
        let err =
            ViewerConfig::from_yaml("connection:\n  heartbeat_interval_ms: 0\n").unwrap_err();
        assert!(err.to_string().contains("heartbeat_interval_ms"));
    }

    #[test]
    fn timeout_off_query_lifts_limit() {
        let mut config = ViewerConfig::default();
        config.apply_query("?debug=1&timeout=off");
        assert_eq!(config.connection.message_limit, MessageLimit::Unlimited);
    }

    #[test]
    fn other_queries_keep_limit() {
        let mut config = ViewerConfig::default();
        config.apply_query("timeout=on&off");
        assert_eq!(config.connection.message_limit, MessageLimit::Limited(200));
    }

    #[test]
    fn message_limit_boundary() {
        let limit = MessageLimit::Limited(200);
        assert!(!limit.is_exceeded_by(200));
        assert!(limit.is_exceeded_by(201));
        assert!(!MessageLimit::Unlimited.is_exceeded_by(u64::MAX));
    }

    #[test]
    fn palette_parsing() {
        let render = RenderConfig { palette: vec!["#102030".into()], label_font_px: 13.0 };
        assert_eq!(render.palette_colors().unwrap(), vec![Rgba([0x10, 0x20, 0x30, 255])]);

        let bad = RenderConfig { palette: vec!["#12345".into()], label_font_px: 13.0 };
        assert!(bad.palette_colors().is_err());

        let empty = RenderConfig { palette: vec![], label_font_px: 13.0 };
        assert!(empty.palette_colors().is_err());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config =
            ViewerConfig::load_or_default(Path::new("/nonexistent/thermview.yaml")).unwrap();
        assert_eq!(config, ViewerConfig::default());
    }
}
