//! Core types for the camera frame stream.
//!
//! ## Architecture
//!
//! The types mirror the JSON header the device prepends to every binary frame:
//! - [`Frame`] pairs a validated [`FrameInfo`] header with its 16-bit pixel buffer
//! - [`Telemetry`] and [`CameraInfo`] are the required header blocks
//! - [`Track`] carries per-frame object annotations ([`Prediction`], [`Region`])
//! - [`ConnectionState`] and [`StopReason`] are the lifecycle notifications
//! - [`SessionId`] is the client identity that survives reconnects
//!
//! ## Usage Example
//!
//! ```rust
//! use thermview::types::{CameraInfo, Frame, FrameInfo, Telemetry};
//!
//! let info = FrameInfo {
//!     telemetry: Telemetry {
//!         time_on: 1_000_000,
//!         ffc_state: "complete".to_string(),
//!         frame_count: 42,
//!         frame_mean: 3100,
//!         temp_c: 24.5,
//!         last_ffc_temp_c: 24.1,
//!         last_ffc_time: 500_000,
//!     },
//!     camera: CameraInfo::with_resolution(2, 2),
//!     tracks: None,
//!     app_version: None,
//!     binary_version: None,
//!     mode: None,
//! };
//!
//! let frame = Frame::new(info, vec![3000, 3100, 3200, 3300]).unwrap();
//! assert_eq!(frame.frame_number(), 42);
//! assert!(frame.tracks().is_empty());
//! ```

mod connection_state;
mod frame;
mod session;
mod track;

pub use connection_state::{ConnectionState, StopReason};
pub use frame::{CameraInfo, Frame, FrameInfo, Telemetry};
pub use session::SessionId;
pub use track::{Prediction, Region, Track};

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn header_json(tracks: &str) -> String {
        format!(
            r#"{{
                "Telemetry": {{"TimeOn": 5, "FFCState": "complete", "FrameCount": 9,
                               "FrameMean": 3000, "TempC": 21.5, "LastFFCTempC": 21.0,
                               "LastFFCTime": 2}},
                "Camera": {{"ResX": 160, "ResY": 120}},
                "Tracks": {}
            }}"#,
            tracks
        )
    }

    #[test]
    fn header_accepts_null_tracks() {
        let info: FrameInfo = serde_json::from_str(&header_json("null")).unwrap();
        assert!(info.tracks().is_empty());
        assert_eq!(info.camera.res_x, 160);
        assert_eq!(info.telemetry.frame_count, 9);
    }

    #[test]
    fn header_parses_tracks() {
        let tracks = r#"[{"predictions": [{"label": "possum", "confidence": 0.9}],
                          "positions": [{"x": 1, "y": 2, "width": 10, "height": 12},
                                        {"x": 3, "y": 4, "width": 11, "height": 13, "mass": 40}]}]"#;
        let info: FrameInfo = serde_json::from_str(&header_json(tracks)).unwrap();

        let track = &info.tracks()[0];
        assert_eq!(track.label(), Some("possum"));
        let latest = track.latest_position().unwrap();
        assert_eq!((latest.x, latest.y), (3.0, 4.0));
        assert_eq!(latest.mass, Some(40.0));
    }

    #[test]
    fn header_requires_resolution() {
        let json = r#"{"Telemetry": {"TimeOn": 5, "FrameCount": 9, "TempC": 21.5, "LastFFCTime": 2},
                       "Camera": {"ResX": 160}}"#;
        assert!(serde_json::from_str::<FrameInfo>(json).is_err());
    }

    #[test]
    fn header_requires_telemetry() {
        let json = r#"{"Camera": {"ResX": 160, "ResY": 120}}"#;
        assert!(serde_json::from_str::<FrameInfo>(json).is_err());
    }

    #[test]
    fn optional_telemetry_fields_default() {
        let json = r#"{"Telemetry": {"TimeOn": 5, "FrameCount": 9, "TempC": 21.5, "LastFFCTime": 2},
                       "Camera": {"ResX": 4, "ResY": 3}}"#;
        let info: FrameInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.telemetry.ffc_state, "");
        assert_eq!(info.telemetry.frame_mean, 0);
        assert!(info.tracks.is_none());
    }

    #[test]
    fn track_without_predictions_has_no_label() {
        let track = Track { predictions: vec![], positions: vec![Region::new(0.0, 0.0, 1.0, 1.0)] };
        assert_eq!(track.label(), None);
        assert!(track.latest_position().is_some());
    }

    #[test]
    fn stop_reasons_have_messages() {
        assert_eq!(StopReason::MessageLimit.message(), "Timeout for camera viewing.");
        assert!(ConnectionState::Stopped(StopReason::Closed).is_stopped());
        assert!(!ConnectionState::Connected.is_stopped());
    }

    proptest! {
        #[test]
        fn prop_frame_new_enforces_pixel_count(
            res_x in 1u32..64,
            res_y in 1u32..64,
            delta in -3i64..3i64
        ) {
            let expected = (res_x * res_y) as i64;
            let len = (expected + delta).max(0) as usize;
            let info: FrameInfo = serde_json::from_str(&header_json("null")).unwrap();
            let info = FrameInfo { camera: CameraInfo::with_resolution(res_x, res_y), ..info };

            let result = Frame::new(info, vec![0u16; len]);
            prop_assert_eq!(result.is_ok(), len as i64 == expected);
        }

        #[test]
        fn prop_session_id_roundtrips_through_json(raw in any::<i64>()) {
            let id = SessionId::from_raw(raw);
            let json = serde_json::to_string(&id).unwrap();
            prop_assert_eq!(json, raw.to_string());
            prop_assert_eq!(id.as_raw(), raw);
        }
    }
}
