//! Track annotation overlay
//!
//! The overlay is a display list rebuilt from scratch for every frame. Rectangles can be
//! composited onto a raster with [`Overlay::composite_onto`]; text commands carry their
//! measured placement and are drawn by whatever presents the frame.

use image::{Pixel, Rgba, RgbaImage};

use crate::types::{Region, Track};

/// Halo stroke drawn under every box
pub const HALO_COLOR: Rgba<u8> = Rgba([0, 0, 0, 128]);
pub const HALO_WIDTH: f32 = 4.0;
pub const BOX_WIDTH: f32 = 2.0;

pub const LABEL_STROKE_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const LABEL_STROKE_WIDTH: f32 = 3.0;
pub const LABEL_FILL_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Gap between a box and its label
pub const LABEL_GAP: f32 = 2.0;
/// Minimum distance of a label from the left edge
pub const LABEL_MARGIN: f32 = 3.0;

/// Axis-aligned rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Region clamped so it never extends past the right or bottom edge of the surface.
    pub fn clamped(region: &Region, surface_width: f32, surface_height: f32) -> Self {
        let x = region.x as f32;
        let y = region.y as f32;
        Self {
            x,
            y,
            width: (region.width as f32).min(surface_width - x).max(0.0),
            height: (region.height as f32).min(surface_height - y).max(0.0),
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Size of a rendered label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

/// Measures label text for layout.
pub trait TextMeasure {
    fn measure(&self, text: &str) -> TextExtent;
}

/// Monospace approximation: every character advances by the same amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvance {
    pub advance: f32,
    pub line_height: f32,
}

impl FixedAdvance {
    /// Metrics for a font of `px` pixels.
    pub fn for_font_size(px: f32) -> Self {
        Self { advance: px * 0.6, line_height: px }
    }
}

impl TextMeasure for FixedAdvance {
    fn measure(&self, text: &str) -> TextExtent {
        TextExtent { width: text.chars().count() as f32 * self.advance, height: self.line_height }
    }
}

/// One drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCommand {
    StrokeRect { rect: Rect, line_width: f32, color: Rgba<u8> },
    /// `x` is the left edge and `y` the baseline
    StrokeText { text: String, x: f32, y: f32, line_width: f32, color: Rgba<u8> },
    FillText { text: String, x: f32, y: f32, color: Rgba<u8> },
}

/// Per-frame annotation display list.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    width: u32,
    height: u32,
    commands: Vec<OverlayCommand>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every command and size the overlay to the current surface.
    pub fn clear(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.commands.clear();
    }

    pub fn commands(&self) -> &[OverlayCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Annotate tracks in list order; colour is picked by list position.
    pub fn draw_tracks(&mut self, tracks: &[Track], palette: &[Rgba<u8>], metrics: &dyn TextMeasure) {
        for (index, track) in tracks.iter().enumerate() {
            let Some(region) = track.latest_position() else {
                continue;
            };
            let color = palette.get(index % palette.len().max(1)).copied().unwrap_or(LABEL_FILL_COLOR);
            let rect = Rect::clamped(region, self.width as f32, self.height as f32);

            self.commands.push(OverlayCommand::StrokeRect { rect, line_width: HALO_WIDTH, color: HALO_COLOR });
            self.commands.push(OverlayCommand::StrokeRect { rect, line_width: BOX_WIDTH, color });

            if let Some(label) = track.label() {
                let extent = metrics.measure(label);
                let (x, y) = self.label_origin(&rect, extent);
                self.commands.push(OverlayCommand::StrokeText {
                    text: label.to_string(),
                    x,
                    y,
                    line_width: LABEL_STROKE_WIDTH,
                    color: LABEL_STROKE_COLOR,
                });
                self.commands.push(OverlayCommand::FillText {
                    text: label.to_string(),
                    x,
                    y,
                    color: LABEL_FILL_COLOR,
                });
            }
        }
    }

    /// Below the box and left aligned, pulled in from the right edge to fit the text;
    /// above the box when that would clip the bottom.
    fn label_origin(&self, rect: &Rect, extent: TextExtent) -> (f32, f32) {
        let mut baseline = rect.bottom() + LABEL_GAP + extent.height;
        if baseline > self.height as f32 {
            baseline = rect.y - LABEL_GAP;
        }

        let mut left = rect.x.min(self.width as f32 - extent.width);
        if left < 0.0 {
            left = LABEL_MARGIN;
        }

        (left, baseline)
    }

    /// Blend the rectangle strokes onto `image`.
    pub fn composite_onto(&self, image: &mut RgbaImage) {
        for command in &self.commands {
            if let OverlayCommand::StrokeRect { rect, line_width, color } = command {
                stroke_rect(image, rect, *line_width, *color);
            }
        }
    }
}

/// Blend every pixel whose centre lies within `line_width / 2` of the rectangle outline.
fn stroke_rect(image: &mut RgbaImage, rect: &Rect, line_width: f32, color: Rgba<u8>) {
    let half = line_width / 2.0;
    let (outer_left, outer_top) = (rect.x - half, rect.y - half);
    let (outer_right, outer_bottom) = (rect.right() + half, rect.bottom() + half);
    let (inner_left, inner_top) = (rect.x + half, rect.y + half);
    let (inner_right, inner_bottom) = (rect.right() - half, rect.bottom() - half);

    let x_start = outer_left.floor().max(0.0) as u32;
    let y_start = outer_top.floor().max(0.0) as u32;
    let x_end = (outer_right.ceil().max(0.0) as u32).min(image.width());
    let y_end = (outer_bottom.ceil().max(0.0) as u32).min(image.height());

    for py in y_start..y_end {
        for px in x_start..x_end {
            let (cx, cy) = (px as f32 + 0.5, py as f32 + 0.5);
            let in_outer = cx >= outer_left && cx < outer_right && cy >= outer_top && cy < outer_bottom;
            let in_inner = cx > inner_left && cx < inner_right && cy > inner_top && cy < inner_bottom;
            if in_outer && !in_inner {
                image.get_pixel_mut(px, py).blend(&color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Prediction;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

    fn track(label: Option<&str>, region: Region) -> Track {
        Track {
            predictions: label
                .map(|l| vec![Prediction { label: l.to_string(), confidence: 0.8 }])
                .unwrap_or_default(),
            positions: vec![Region::new(0.0, 0.0, 1.0, 1.0), region],
        }
    }

    fn box_colors(overlay: &Overlay) -> Vec<Rgba<u8>> {
        overlay
            .commands()
            .iter()
            .filter_map(|c| match c {
                OverlayCommand::StrokeRect { line_width, color, .. } if *line_width == BOX_WIDTH => {
                    Some(*color)
                }
                _ => None,
            })
            .collect()
    }

    fn text_origin(overlay: &Overlay) -> (f32, f32) {
        overlay
            .commands()
            .iter()
            .find_map(|c| match c {
                OverlayCommand::FillText { x, y, .. } => Some((*x, *y)),
                _ => None,
            })
            .expect("label drawn")
    }

    fn draw(tracks: &[Track]) -> Overlay {
        let mut overlay = Overlay::new();
        overlay.clear(160, 120);
        overlay.draw_tracks(tracks, &[RED, GREEN], &FixedAdvance::for_font_size(10.0));
        overlay
    }

    fn box_color_at(overlay: &Overlay, x: f32) -> Rgba<u8> {
        overlay
            .commands()
            .iter()
            .find_map(|c| match c {
                OverlayCommand::StrokeRect { rect, line_width, color }
                    if *line_width == BOX_WIDTH && rect.x == x =>
                {
                    Some(*color)
                }
                _ => None,
            })
            .expect("box drawn")
    }

    #[test]
    fn colour_follows_list_position() {
        let a = track(Some("bird"), Region::new(10.0, 10.0, 20.0, 20.0));
        let b = track(Some("cat"), Region::new(50.0, 50.0, 20.0, 20.0));

        let forward = draw(&[a.clone(), b.clone()]);
        assert_eq!(box_color_at(&forward, 10.0), RED);
        assert_eq!(box_color_at(&forward, 50.0), GREEN);

        let swapped = draw(&[b, a]);
        assert_eq!(box_color_at(&swapped, 10.0), GREEN);
        assert_eq!(box_color_at(&swapped, 50.0), RED);
    }

    #[test]
    fn palette_wraps() {
        let tracks: Vec<Track> =
            (0..3).map(|i| track(None, Region::new(i as f64 * 10.0, 0.0, 5.0, 5.0))).collect();
        assert_eq!(box_colors(&draw(&tracks)), vec![RED, GREEN, RED]);
    }

    #[test]
    fn halo_precedes_box_and_uses_latest_position() {
        let overlay = draw(&[track(None, Region::new(30.0, 40.0, 10.0, 12.0))]);
        let commands = overlay.commands();
        assert_eq!(commands.len(), 2);
        match (&commands[0], &commands[1]) {
            (
                OverlayCommand::StrokeRect { rect: halo, line_width: halo_width, color: halo_color },
                OverlayCommand::StrokeRect { rect, color, .. },
            ) => {
                assert_eq!((*halo_width, *halo_color), (HALO_WIDTH, HALO_COLOR));
                assert_eq!(halo, rect);
                assert_eq!(*rect, Rect { x: 30.0, y: 40.0, width: 10.0, height: 12.0 });
                assert_eq!(*color, RED);
            }
            other => panic!("unexpected commands {other:?}"),
        }
    }

    #[test]
    fn rect_clamped_to_surface() {
        let overlay = draw(&[track(None, Region::new(150.0, 100.0, 30.0, 40.0))]);
        match &overlay.commands()[1] {
            OverlayCommand::StrokeRect { rect, .. } => {
                assert_eq!(rect.right(), 160.0);
                assert_eq!(rect.bottom(), 120.0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn label_below_box_by_default() {
        let overlay = draw(&[track(Some("rat"), Region::new(20.0, 20.0, 10.0, 10.0))]);
        assert_eq!(text_origin(&overlay), (20.0, 30.0 + LABEL_GAP + 10.0));
    }

    #[test]
    fn label_flips_above_near_bottom() {
        let overlay = draw(&[track(Some("rat"), Region::new(20.0, 100.0, 10.0, 15.0))]);
        assert_eq!(text_origin(&overlay), (20.0, 100.0 - LABEL_GAP));
    }

    #[test]
    fn label_clamped_off_left_edge() {
        let overlay = draw(&[track(Some("rat"), Region::new(-5.0, 20.0, 10.0, 10.0))]);
        assert_eq!(text_origin(&overlay).0, LABEL_MARGIN);
    }

    #[test]
    fn long_label_kept_inside_right_edge() {
        let width = FixedAdvance::for_font_size(10.0).measure("hedgehog").width;
        let overlay = draw(&[track(Some("hedgehog"), Region::new(150.0, 20.0, 8.0, 10.0))]);
        let (left, _) = text_origin(&overlay);
        assert_eq!(left, 160.0 - width);
        assert!(left < 150.0);
    }

    #[test]
    fn label_wider_than_surface_starts_at_margin() {
        let mut overlay = Overlay::new();
        overlay.clear(20, 60);
        overlay.draw_tracks(
            &[track(Some("hedgehog"), Region::new(5.0, 5.0, 8.0, 8.0))],
            &[RED],
            &FixedAdvance::for_font_size(10.0),
        );
        assert_eq!(text_origin(&overlay).0, LABEL_MARGIN);
    }

    #[test]
    fn label_stroke_then_fill() {
        let overlay = draw(&[track(Some("hedgehog"), Region::new(20.0, 20.0, 10.0, 10.0))]);
        let kinds: Vec<&str> = overlay
            .commands()
            .iter()
            .map(|c| match c {
                OverlayCommand::StrokeRect { .. } => "rect",
                OverlayCommand::StrokeText { .. } => "stroke",
                OverlayCommand::FillText { .. } => "fill",
            })
            .collect();
        assert_eq!(kinds, vec!["rect", "rect", "stroke", "fill"]);
    }

    #[test]
    fn track_without_positions_is_skipped() {
        let empty = Track { predictions: vec![], positions: vec![] };
        assert!(draw(&[empty]).is_empty());
    }

    #[test]
    fn clear_resets_commands() {
        let mut overlay = draw(&[track(None, Region::new(1.0, 1.0, 5.0, 5.0))]);
        overlay.clear(80, 60);
        assert!(overlay.is_empty());
    }

    #[test]
    fn composite_strokes_outline_only() {
        let mut image = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        let overlay = {
            let mut overlay = Overlay::new();
            overlay.clear(20, 20);
            overlay.draw_tracks(
                &[track(None, Region::new(4.0, 4.0, 10.0, 10.0))],
                &[RED],
                &FixedAdvance::for_font_size(10.0),
            );
            overlay
        };
        overlay.composite_onto(&mut image);

        assert_eq!(image.get_pixel(4, 9), &RED);
        assert_eq!(image.get_pixel(9, 9), &Rgba([0, 0, 0, 255]));
        assert_eq!(image.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
    }
}
