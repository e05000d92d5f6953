//! Pixel intensity mapping

use image::{Rgba, RgbaImage};

/// Sensors wider than this are not thermal cores; their samples are already intensities.
pub const HIGH_RES_WIDTH_THRESHOLD: u32 = 160;

/// Intensity used for every pixel of a frame with no dynamic range.
pub const FLAT_FRAME_INTENSITY: u8 = 0;

/// Minimum and maximum sample in one pass, `None` for an empty buffer.
pub fn min_max(samples: &[u16]) -> Option<(u16, u16)> {
    let (&first, rest) = samples.split_first()?;
    Some(rest.iter().fold((first, first), |(min, max), &s| (min.min(s), max.max(s))))
}

/// How samples of one frame map to 8-bit intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensityMapping {
    /// Per-frame min/max normalization onto 0..=255
    Normalized { min: u16, max: u16 },
    /// `max == min`: every sample maps to [`FLAT_FRAME_INTENSITY`]
    Flat,
    /// Sample used directly, saturating at 255
    Raw,
}

impl IntensityMapping {
    /// Choose the mapping for a frame of `width` columns.
    pub fn for_frame(samples: &[u16], width: u32) -> Self {
        if width > HIGH_RES_WIDTH_THRESHOLD {
            return IntensityMapping::Raw;
        }
        match min_max(samples) {
            Some((min, max)) if max > min => IntensityMapping::Normalized { min, max },
            _ => IntensityMapping::Flat,
        }
    }

    #[inline]
    pub fn intensity(self, sample: u16) -> u8 {
        match self {
            IntensityMapping::Normalized { min, max } => {
                let scaled = f32::from(sample.saturating_sub(min)) / f32::from(max - min) * 255.0;
                scaled.round().clamp(0.0, 255.0) as u8
            }
            IntensityMapping::Flat => FLAT_FRAME_INTENSITY,
            IntensityMapping::Raw => sample.min(u16::from(u8::MAX)) as u8,
        }
    }
}

/// Paint samples as opaque greyscale into `raster`, which must already match the frame size.
pub fn paint(raster: &mut RgbaImage, samples: &[u16], mapping: IntensityMapping) {
    for (pixel, &sample) in raster.pixels_mut().zip(samples) {
        let value = mapping.intensity(sample);
        *pixel = Rgba([value, value, value, u8::MAX]);
    }
}
