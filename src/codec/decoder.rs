//! Frame payload decoding

use tracing::trace;

use super::BYTES_PER_SAMPLE;
use crate::types::{Frame, FrameInfo};
use crate::{Result, ViewerError};

/// Size of the header-length prefix
pub const HEADER_LEN_SIZE: usize = 2;

/// Decode one binary payload into a [`Frame`].
///
/// Never panics; every malformed input is reported as [`ViewerError::Decode`].
pub fn decode_frame(data: &[u8]) -> Result<Frame> {
    let prefix = data.get(..HEADER_LEN_SIZE).ok_or_else(|| {
        ViewerError::decode("header length", format!("payload is only {} bytes", data.len()))
    })?;
    let header_len = u16::from_le_bytes([prefix[0], prefix[1]]) as usize;
    let pixel_offset = HEADER_LEN_SIZE + header_len;

    let header = data.get(HEADER_LEN_SIZE..pixel_offset).ok_or_else(|| {
        ViewerError::decode(
            "header",
            format!("declared {} header bytes, payload has {}", header_len, data.len() - HEADER_LEN_SIZE),
        )
    })?;

    let info: FrameInfo = serde_json::from_slice(header)
        .map_err(|e| ViewerError::decode("header JSON", e.to_string()))?;

    let sample_count = info.camera.pixel_count().ok_or_else(|| {
        ViewerError::decode(
            "pixels",
            format!("resolution {}x{} overflows", info.camera.res_x, info.camera.res_y),
        )
    })?;
    let pixel_bytes = sample_count
        .checked_mul(BYTES_PER_SAMPLE)
        .ok_or_else(|| ViewerError::decode("pixels", "pixel section size overflows"))?;

    let pixel_end = pixel_offset
        .checked_add(pixel_bytes)
        .ok_or_else(|| ViewerError::decode("pixels", "pixel section size overflows"))?;

    let raw = data.get(pixel_offset..pixel_end).ok_or_else(|| {
        ViewerError::decode(
            "pixels",
            format!(
                "expected {} pixel bytes for {}x{}, payload has {}",
                pixel_bytes,
                info.camera.res_x,
                info.camera.res_y,
                data.len() - pixel_offset
            ),
        )
    })?;

    let pixels: Vec<u16> =
        raw.chunks_exact(BYTES_PER_SAMPLE).map(|pair| u16::from_le_bytes([pair[0], pair[1]])).collect();

    let trailing = data.len() - pixel_end;
    if trailing > 0 {
        trace!("Ignoring {} trailing bytes after frame {}", trailing, info.telemetry.frame_count);
    }

    Frame::new(info, pixels)
}
