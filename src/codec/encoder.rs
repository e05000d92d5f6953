//! Frame payload encoding

use super::BYTES_PER_SAMPLE;
use super::decoder::HEADER_LEN_SIZE;
use crate::types::FrameInfo;
use crate::{Result, ViewerError};

/// Encode a header and pixel buffer into the device's binary frame layout.
///
/// Fails when the pixel count does not match the header resolution or the JSON header
/// does not fit the 16-bit length prefix.
pub fn encode_frame(info: &FrameInfo, pixels: &[u16]) -> Result<Vec<u8>> {
    let expected = info.camera.pixel_count();
    if expected != Some(pixels.len()) {
        return Err(ViewerError::decode(
            "frame geometry",
            format!(
                "{} samples do not match resolution {}x{}",
                pixels.len(),
                info.camera.res_x,
                info.camera.res_y
            ),
        ));
    }

    let header = serde_json::to_vec(info).map_err(|source| ViewerError::Serialization {
        context: "frame header".to_string(),
        source,
    })?;
    let header_len = u16::try_from(header.len()).map_err(|_| {
        ViewerError::decode("header length", format!("{} byte header exceeds u16", header.len()))
    })?;

    let mut payload =
        Vec::with_capacity(HEADER_LEN_SIZE + header.len() + pixels.len() * BYTES_PER_SAMPLE);
    payload.extend_from_slice(&header_len.to_le_bytes());
    payload.extend_from_slice(&header);
    for sample in pixels {
        payload.extend_from_slice(&sample.to_le_bytes());
    }

    Ok(payload)
}
