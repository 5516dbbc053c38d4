//! Annotation editor.
//!
//! This module provides:
//! - The drawing state machine (`Editor`): highlight strokes, circles, text
//! - Layer rasterization (`raster`) and text rendering (`text`)
//! - The egui editor window (`view`)
//!
//! The editor owns one base image plus an annotation layer and a preview
//! layer of the same size. Shapes in progress live on the preview layer and
//! move to the annotation layer on release.

pub mod raster;
pub mod text;
pub mod view;

use anyhow::Result;
use image::{DynamicImage, RgbImage, Rgba, RgbaImage};

use crate::geometry::Point;

use text::TextPainter;

pub use view::{EditorView, EditorVerdict};

pub const MIN_BRUSH_SIZE: u32 = 5;
pub const MAX_BRUSH_SIZE: u32 = 50;
pub const DEFAULT_BRUSH_SIZE: u32 = 20;

/// Circles whose radii are both at most this many pixels are discarded.
pub const CIRCLE_NOISE_RADIUS: i32 = 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawMode {
    #[default]
    Highlight,
    Circle,
    Text,
}

impl DrawMode {
    pub const ALL: [DrawMode; 3] = [DrawMode::Highlight, DrawMode::Circle, DrawMode::Text];

    pub fn label(&self) -> &'static str {
        match self {
            DrawMode::Highlight => "Highlight",
            DrawMode::Circle => "Circle",
            DrawMode::Text => "Text",
        }
    }
}

/// The fixed semi-transparent annotation colours.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HighlightColor {
    #[default]
    Yellow,
    Green,
    Blue,
    Red,
}

impl HighlightColor {
    pub const ALL: [HighlightColor; 4] = [
        HighlightColor::Yellow,
        HighlightColor::Green,
        HighlightColor::Blue,
        HighlightColor::Red,
    ];

    pub fn rgba(&self) -> Rgba<u8> {
        match self {
            HighlightColor::Yellow => Rgba([255, 255, 0, 100]),
            HighlightColor::Green => Rgba([0, 255, 0, 100]),
            HighlightColor::Blue => Rgba([0, 150, 255, 100]),
            HighlightColor::Red => Rgba([255, 0, 0, 100]),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HighlightColor::Yellow => "Yellow",
            HighlightColor::Green => "Green",
            HighlightColor::Blue => "Blue",
            HighlightColor::Red => "Red",
        }
    }
}

/// One drawn piece of a highlight stroke.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

/// What a pointer-down did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressOutcome {
    Drawing,
    /// Text mode: the caller should prompt for a string and pass it to
    /// [`Editor::draw_text`] with this point.
    TextRequested(Point),
}

#[derive(Debug, Clone, Copy)]
enum Gesture {
    Idle,
    Highlight { last: Point, locked_y: Option<i32> },
    /// `end` is where the preview was last drawn to.
    Circle { center: Point, end: Point },
}

pub struct Editor {
    base: RgbaImage,
    annotations: RgbaImage,
    preview: RgbaImage,
    pub mode: DrawMode,
    pub color: HighlightColor,
    brush_size: u32,
    pub horizontal_lock: bool,
    gesture: Gesture,
    text_painter: Option<TextPainter>,
    /// Bumped whenever the displayed composite changes.
    revision: u64,
}

impl Editor {
    pub fn new(image: RgbImage) -> Self {
        let base = DynamicImage::ImageRgb8(image).to_rgba8();
        let (w, h) = base.dimensions();
        Self {
            base,
            annotations: raster::new_layer(w, h),
            preview: raster::new_layer(w, h),
            mode: DrawMode::default(),
            color: HighlightColor::default(),
            brush_size: DEFAULT_BRUSH_SIZE,
            horizontal_lock: false,
            gesture: Gesture::Idle,
            text_painter: None,
            revision: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.base.width()
    }

    pub fn height(&self) -> u32 {
        self.base.height()
    }

    pub fn brush_size(&self) -> u32 {
        self.brush_size
    }

    pub fn set_brush_size(&mut self, size: u32) {
        self.brush_size = size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE);
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn half_brush(&self) -> i32 {
        (self.brush_size / 2) as i32
    }

    pub fn pointer_down(&mut self, p: Point) -> PressOutcome {
        match self.mode {
            DrawMode::Text => {
                self.gesture = Gesture::Idle;
                PressOutcome::TextRequested(p)
            }
            DrawMode::Circle => {
                self.gesture = Gesture::Circle { center: p, end: p };
                PressOutcome::Drawing
            }
            DrawMode::Highlight => {
                let color = self.color.rgba();
                let radius = self.half_brush();
                raster::fill_circle(&mut self.annotations, p, radius, color);
                self.gesture = Gesture::Highlight {
                    last: p,
                    locked_y: self.horizontal_lock.then_some(p.y),
                };
                self.revision += 1;
                PressOutcome::Drawing
            }
        }
    }

    /// Continues the current gesture. Returns the segment drawn for highlight
    /// strokes.
    pub fn pointer_drag(&mut self, p: Point) -> Option<Segment> {
        match self.gesture {
            Gesture::Idle => None,
            Gesture::Highlight { last, locked_y } => {
                let to = Point::new(p.x, locked_y.unwrap_or(p.y));
                if to == last {
                    return None;
                }
                let color = self.color.rgba();
                let radius = self.half_brush();
                raster::thick_line(&mut self.annotations, last, to, self.brush_size as i32, color);
                raster::fill_circle(&mut self.annotations, to, radius, color);
                self.gesture = Gesture::Highlight { last: to, locked_y };
                self.revision += 1;
                Some(Segment { from: last, to })
            }
            Gesture::Circle { center, end } => {
                if p == end {
                    return None;
                }
                self.gesture = Gesture::Circle { center, end: p };
                raster::clear(&mut self.preview);
                let (color, rings) = (self.color.rgba(), self.half_brush());
                draw_circle(&mut self.preview, center, p, rings, color);
                self.revision += 1;
                None
            }
        }
    }

    pub fn pointer_up(&mut self, p: Point) {
        if let Gesture::Circle { center, .. } = self.gesture {
            raster::clear(&mut self.preview);
            let (color, rings) = (self.color.rgba(), self.half_brush());
            if !draw_circle(&mut self.annotations, center, p, rings, color) {
                log::debug!("Discarded circle below noise radius at ({}, {})", center.x, center.y);
            }
            self.revision += 1;
        }
        self.gesture = Gesture::Idle;
    }

    /// Renders confirmed prompt text at `at`. Font size is twice the brush.
    pub fn draw_text(&mut self, at: Point, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        if self.text_painter.is_none() {
            self.text_painter = Some(TextPainter::load()?);
        }
        if let Some(painter) = &self.text_painter {
            let size = (self.brush_size * 2) as f32;
            painter.draw_outlined(&mut self.annotations, at, text, size, self.color.rgba());
            self.revision += 1;
        }
        Ok(())
    }

    /// Base with committed annotations and any in-progress shape, for display.
    pub fn display_image(&self) -> RgbaImage {
        let mut out = raster::composite(&self.base, &self.annotations);
        raster::composite_onto(&mut out, &self.preview);
        out
    }

    /// Base with committed annotations, flattened to opaque RGB.
    pub fn composite(&self) -> RgbImage {
        raster::flatten(&raster::composite(&self.base, &self.annotations))
    }

    #[cfg(test)]
    fn preview_is_clear(&self) -> bool {
        self.preview.pixels().all(|p| p.0[3] == 0)
    }
}

/// Draws `rings` concentric one-pixel ellipse outlines around `center`
/// reaching `edge`, each ring one pixel larger. Returns false (drawing
/// nothing) when both radii are within the noise threshold.
fn draw_circle(layer: &mut RgbaImage, center: Point, edge: Point, rings: i32, color: Rgba<u8>) -> bool {
    let rx = (edge.x - center.x).abs();
    let ry = (edge.y - center.y).abs();
    if rx <= CIRCLE_NOISE_RADIUS && ry <= CIRCLE_NOISE_RADIUS {
        return false;
    }
    for grow in 0..rings.max(1) {
        raster::ellipse_outline(layer, center, rx + grow, ry + grow, color);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| image::Rgb([(x * 2) as u8, (y * 2) as u8, 77]))
    }

    fn annotated_pixels(editor: &Editor) -> usize {
        editor.annotations.pixels().filter(|p| p.0[3] != 0).count()
    }

    #[test]
    fn test_stroke_changes_only_pixels_near_the_stroke() {
        let input = gradient(200, 100);
        let mut editor = Editor::new(input.clone());
        assert_eq!(editor.brush_size(), 20);

        editor.pointer_down(Point::new(10, 10));
        editor.pointer_drag(Point::new(30, 10));
        editor.pointer_drag(Point::new(50, 10));
        editor.pointer_up(Point::new(50, 10));
        let output = editor.composite();

        assert_eq!(output.dimensions(), input.dimensions());
        let mut changed = 0;
        for (x, y, px) in output.enumerate_pixels() {
            if px != input.get_pixel(x, y) {
                changed += 1;
                assert!(x <= 100 && y <= 20, "pixel ({}, {}) changed outside stroke", x, y);
            }
        }
        assert!(changed > 0);
    }

    #[test]
    fn test_horizontal_lock_pins_every_segment() {
        let mut editor = Editor::new(gradient(200, 100));
        editor.horizontal_lock = true;
        editor.pointer_down(Point::new(20, 40));
        let segments: Vec<Segment> = [(30, 45), (50, 70), (90, 12), (120, 40)]
            .iter()
            .filter_map(|&(x, y)| editor.pointer_drag(Point::new(x, y)))
            .collect();
        editor.pointer_up(Point::new(120, 40));

        assert_eq!(segments.len(), 4);
        for s in segments {
            assert_eq!(s.from.y, 40);
            assert_eq!(s.to.y, 40);
        }
    }

    #[test]
    fn test_unlocked_stroke_follows_pointer() {
        let mut editor = Editor::new(gradient(100, 100));
        editor.pointer_down(Point::new(10, 10));
        let s = editor.pointer_drag(Point::new(40, 60)).unwrap();
        assert_eq!(s, Segment { from: Point::new(10, 10), to: Point::new(40, 60) });
    }

    #[test]
    fn test_circle_noise_filter() {
        let mut editor = Editor::new(gradient(100, 100));
        editor.mode = DrawMode::Circle;

        editor.pointer_down(Point::new(50, 50));
        editor.pointer_drag(Point::new(52, 52));
        editor.pointer_up(Point::new(52, 52));
        assert_eq!(annotated_pixels(&editor), 0);

        editor.pointer_down(Point::new(50, 50));
        editor.pointer_drag(Point::new(53, 50));
        editor.pointer_up(Point::new(53, 50));
        assert!(annotated_pixels(&editor) > 0);
    }

    #[test]
    fn test_circle_preview_is_committed_on_release() {
        let mut editor = Editor::new(gradient(120, 120));
        editor.mode = DrawMode::Circle;
        editor.set_brush_size(6);

        editor.pointer_down(Point::new(60, 60));
        editor.pointer_drag(Point::new(100, 60));
        assert!(!editor.preview_is_clear());
        assert_eq!(annotated_pixels(&editor), 0);
        // The preview is rebuilt, not accumulated
        editor.pointer_drag(Point::new(80, 70));
        assert_eq!(editor.preview.get_pixel(100, 60).0[3], 0);

        editor.pointer_up(Point::new(80, 70));
        assert!(editor.preview_is_clear());
        assert!(annotated_pixels(&editor) > 0);
        assert_ne!(editor.annotations.get_pixel(80, 60).0[3], 0);
        assert_eq!(editor.annotations.get_pixel(60, 60).0[3], 0);
    }

    #[test]
    fn test_text_mode_requests_prompt() {
        let mut editor = Editor::new(gradient(100, 100));
        editor.mode = DrawMode::Text;
        assert_eq!(
            editor.pointer_down(Point::new(5, 6)),
            PressOutcome::TextRequested(Point::new(5, 6))
        );
        assert!(editor.pointer_drag(Point::new(50, 50)).is_none());
        assert_eq!(annotated_pixels(&editor), 0);
    }

    #[test]
    fn test_empty_text_draws_nothing() {
        let mut editor = Editor::new(gradient(100, 100));
        editor.draw_text(Point::new(5, 5), "").unwrap();
        assert_eq!(annotated_pixels(&editor), 0);
        assert_eq!(editor.revision(), 0);
    }

    #[test]
    fn test_stationary_drag_keeps_revision() {
        let mut editor = Editor::new(gradient(100, 100));
        editor.mode = DrawMode::Circle;
        editor.pointer_down(Point::new(50, 50));
        assert_eq!(editor.revision(), 0);

        editor.pointer_drag(Point::new(70, 50));
        let moved = editor.revision();
        assert!(moved > 0);
        for _ in 0..5 {
            editor.pointer_drag(Point::new(70, 50));
        }
        assert_eq!(editor.revision(), moved);

        editor.mode = DrawMode::Highlight;
        editor.pointer_up(Point::new(70, 50));
        editor.pointer_down(Point::new(10, 10));
        editor.pointer_drag(Point::new(30, 10));
        let drawn = editor.revision();
        assert!(editor.pointer_drag(Point::new(30, 10)).is_none());
        assert_eq!(editor.revision(), drawn);
    }

    #[test]
    fn test_composite_is_repeatable() {
        let mut editor = Editor::new(gradient(120, 80));
        editor.pointer_down(Point::new(10, 10));
        editor.pointer_drag(Point::new(100, 60));
        editor.pointer_up(Point::new(100, 60));

        assert_eq!(editor.composite().as_raw(), editor.composite().as_raw());
    }

    #[test]
    fn test_brush_size_is_clamped() {
        let mut editor = Editor::new(gradient(10, 10));
        editor.set_brush_size(1);
        assert_eq!(editor.brush_size(), MIN_BRUSH_SIZE);
        editor.set_brush_size(99);
        assert_eq!(editor.brush_size(), MAX_BRUSH_SIZE);
    }

    #[test]
    fn test_colors_are_semi_transparent() {
        for color in HighlightColor::ALL {
            assert_eq!(color.rgba().0[3], 100);
        }
        assert_eq!(HighlightColor::Blue.rgba(), Rgba([0, 150, 255, 100]));
    }
}
