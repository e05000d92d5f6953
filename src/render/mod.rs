//! Frame rendering
//!
//! [`FrameRenderer`] owns the raster surface. Each call to [`FrameRenderer::render`]
//! repaints the whole raster from the frame's samples and rebuilds the track overlay.

mod overlay;
mod raster;

pub use overlay::{
    BOX_WIDTH, FixedAdvance, HALO_COLOR, HALO_WIDTH, LABEL_FILL_COLOR, LABEL_GAP, LABEL_MARGIN,
    LABEL_STROKE_COLOR, LABEL_STROKE_WIDTH, Overlay, OverlayCommand, Rect, TextExtent, TextMeasure,
};
pub use raster::{FLAT_FRAME_INTENSITY, HIGH_RES_WIDTH_THRESHOLD, IntensityMapping, min_max, paint};

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::Result;
use crate::config::RenderConfig;
use crate::types::Frame;

/// Rasterizes frames and annotates their tracks.
pub struct FrameRenderer {
    raster: RgbaImage,
    overlay: Overlay,
    palette: Vec<Rgba<u8>>,
    metrics: Box<dyn TextMeasure + Send>,
    caption: String,
    frames_rendered: u64,
}

impl FrameRenderer {
    pub fn from_config(config: &RenderConfig) -> Result<Self> {
        Ok(Self::default()
            .with_palette(config.palette_colors()?)
            .with_text_measure(FixedAdvance::for_font_size(config.label_font_px)))
    }

    /// Replace the track palette. An empty palette keeps the current one.
    pub fn with_palette(mut self, palette: Vec<Rgba<u8>>) -> Self {
        if !palette.is_empty() {
            self.palette = palette;
        }
        self
    }

    pub fn with_text_measure(mut self, metrics: impl TextMeasure + Send + 'static) -> Self {
        self.metrics = Box::new(metrics);
        self
    }

    /// Paint `frame` and rebuild the overlay.
    pub fn render(&mut self, frame: &Frame) {
        let (width, height) = (frame.width(), frame.height());
        if self.raster.dimensions() != (width, height) {
            debug!("Resizing raster {:?} -> {}x{}", self.raster.dimensions(), width, height);
            self.raster = RgbaImage::new(width, height);
        }

        let mapping = IntensityMapping::for_frame(frame.pixels(), width);
        paint(&mut self.raster, frame.pixels(), mapping);

        self.overlay.clear(width, height);
        self.overlay.draw_tracks(frame.tracks(), &self.palette, self.metrics.as_ref());

        self.caption = format!("frame {}", frame.frame_number());
        self.frames_rendered += 1;
    }

    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// `frame N` for the most recent frame, empty before the first.
    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Raster with the overlay rectangles blended on top.
    pub fn composited(&self) -> RgbaImage {
        let mut image = self.raster.clone();
        self.overlay.composite_onto(&mut image);
        image
    }
}

impl Default for FrameRenderer {
    fn default() -> Self {
        let palette = RenderConfig::default().palette_colors().unwrap_or_else(|_| vec![LABEL_FILL_COLOR]);
        Self {
            raster: RgbaImage::new(0, 0),
            overlay: Overlay::new(),
            palette,
            metrics: Box::new(FixedAdvance::for_font_size(RenderConfig::default().label_font_px)),
            caption: String::new(),
            frames_rendered: 0,
        }
    }
}

impl std::fmt::Debug for FrameRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRenderer")
            .field("dimensions", &self.raster.dimensions())
            .field("palette", &self.palette)
            .field("caption", &self.caption)
            .field("frames_rendered", &self.frames_rendered)
            .finish()
    }
}
