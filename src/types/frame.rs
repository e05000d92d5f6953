//! Decoded frame types for the camera stream

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::Track;
use crate::{Result, ViewerError};

/// Sensor status reported with every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Telemetry {
    /// Time since the sensor powered on (nanoseconds)
    #[serde(rename = "TimeOn")]
    pub time_on: i64,

    /// Flat-field correction state, e.g. "running" or "complete"
    #[serde(rename = "FFCState", default)]
    pub ffc_state: String,

    /// Monotonic frame sequence number
    #[serde(rename = "FrameCount")]
    pub frame_count: u32,

    /// Mean raw sample value across the frame
    #[serde(rename = "FrameMean", default)]
    pub frame_mean: u16,

    /// Sensor temperature in degrees Celsius
    #[serde(rename = "TempC")]
    pub temp_c: f64,

    /// Sensor temperature at the last calibration
    #[serde(rename = "LastFFCTempC", default)]
    pub last_ffc_temp_c: f64,

    /// Time on at the last calibration (nanoseconds)
    #[serde(rename = "LastFFCTime")]
    pub last_ffc_time: i64,
}

/// Sensor geometry and identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct CameraInfo {
    #[serde(rename = "ResX")]
    pub res_x: u32,

    #[serde(rename = "ResY")]
    pub res_y: u32,

    #[serde(rename = "Brand", default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    #[serde(rename = "Model", default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(rename = "FPS", default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,

    #[serde(rename = "Firmware", default, skip_serializing_if = "Option::is_none")]
    pub firmware: Option<String>,

    #[serde(rename = "CameraSerial", default, skip_serializing_if = "Option::is_none")]
    pub camera_serial: Option<u32>,
}

impl CameraInfo {
    /// Camera info carrying only the sensor resolution.
    pub fn with_resolution(res_x: u32, res_y: u32) -> Self {
        Self { res_x, res_y, brand: None, model: None, fps: None, firmware: None, camera_serial: None }
    }

    /// Number of samples in one frame, or `None` on overflow.
    pub fn pixel_count(&self) -> Option<usize> {
        (self.res_x as usize).checked_mul(self.res_y as usize)
    }
}

/// JSON header that precedes the pixel section of every frame.
///
/// `Telemetry` and `Camera` are required; everything else may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "PascalCase")]
pub struct FrameInfo {
    pub telemetry: Telemetry,

    pub camera: CameraInfo,

    /// Objects tracked in this frame. The device sends `null` when there are none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Vec<Track>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl FrameInfo {
    /// Tracks declared by this frame, empty when the header had none.
    pub fn tracks(&self) -> &[Track] {
        self.tracks.as_deref().unwrap_or(&[])
    }
}

/// One decoded frame: header metadata plus a row-major buffer of 16-bit samples.
///
/// The pixel buffer always holds exactly `ResX * ResY` samples; [`Frame::new`] is the
/// only constructor and rejects anything else.
#[derive(Debug, Clone)]
pub struct Frame {
    info: FrameInfo,
    pixels: Arc<[u16]>,
}

impl Frame {
    /// Create a frame, validating the pixel count against the header resolution.
    pub fn new(info: FrameInfo, pixels: Vec<u16>) -> Result<Self> {
        let expected = info.camera.pixel_count().ok_or_else(|| {
            ViewerError::decode(
                "frame geometry",
                format!("resolution {}x{} overflows", info.camera.res_x, info.camera.res_y),
            )
        })?;

        if pixels.len() != expected {
            return Err(ViewerError::decode(
                "frame geometry",
                format!(
                    "expected {} samples for {}x{}, got {}",
                    expected,
                    info.camera.res_x,
                    info.camera.res_y,
                    pixels.len()
                ),
            ));
        }

        Ok(Self { info, pixels: pixels.into() })
    }

    /// Header metadata
    pub fn info(&self) -> &FrameInfo {
        &self.info
    }

    /// Row-major samples, `width() * height()` long
    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.info.camera.res_x
    }

    pub fn height(&self) -> u32 {
        self.info.camera.res_y
    }

    /// Sequence number from the telemetry block
    pub fn frame_number(&self) -> u32 {
        self.info.telemetry.frame_count
    }

    pub fn tracks(&self) -> &[Track] {
        self.info.tracks()
    }
}
