//! Tracked-object annotations carried in the frame header

use serde::{Deserialize, Serialize};

/// A ranked classification for a tracked object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Prediction {
    pub label: String,

    #[serde(default)]
    pub confidence: f64,
}

/// Bounding region of a tracked object in sensor pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,

    /// Number of warm pixels inside the region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<f64>,

    /// Set when the region is a placeholder with no detection behind it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blank: Option<bool>,

    #[serde(default, rename = "frameNumber", skip_serializing_if = "Option::is_none")]
    pub frame_number: Option<u32>,
}

impl Region {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height, mass: None, blank: None, frame_number: None }
    }
}

/// A server-reported object trajectory.
///
/// Tracks are re-supplied with every frame; there is no identity across frames.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Track {
    /// Highest-ranked prediction first
    #[serde(default)]
    pub predictions: Vec<Prediction>,

    /// Oldest position first
    #[serde(default)]
    pub positions: Vec<Region>,
}

impl Track {
    /// Position to draw for the current frame.
    pub fn latest_position(&self) -> Option<&Region> {
        self.positions.last()
    }

    /// Label for on-screen annotation, taken from the top prediction.
    pub fn label(&self) -> Option<&str> {
        self.predictions.first().map(|p| p.label.as_str())
    }
}
