//! Text rendering onto annotation layers with `ab_glyph`.

use std::borrow::Cow;

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use anyhow::{anyhow, Result};
use image::{Rgba, RgbaImage};

use crate::geometry::Point;

use super::raster;

/// System fonts tried first, in order.
const SYSTEM_FONTS: &[&str] = &[
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

/// Outline colour drawn behind annotation text.
pub const OUTLINE: Rgba<u8> = Rgba([0, 0, 0, 150]);

/// The eight one-pixel offsets used for the text outline.
pub const OUTLINE_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

pub struct TextPainter {
    font: FontArc,
}

impl TextPainter {
    /// Loads the first available system font, falling back to the UI's
    /// built-in font.
    pub fn load() -> Result<Self> {
        for path in SYSTEM_FONTS {
            if let Ok(bytes) = std::fs::read(path) {
                match FontArc::try_from_vec(bytes) {
                    Ok(font) => {
                        log::info!("Loaded annotation font from: {}", path);
                        return Ok(Self { font });
                    }
                    Err(e) => log::warn!("Font {} is unusable: {}", path, e),
                }
            }
        }
        log::warn!("No system font found, using built-in font for annotations");
        Self::builtin()
    }

    /// The proportional font bundled with egui.
    pub fn builtin() -> Result<Self> {
        let defs = eframe::egui::FontDefinitions::default();
        let data = defs
            .font_data
            .get("Ubuntu-Light")
            .or_else(|| defs.font_data.values().next())
            .ok_or_else(|| anyhow!("No built-in font available"))?;
        let font = match &data.font {
            Cow::Borrowed(bytes) => FontArc::try_from_slice(*bytes),
            Cow::Owned(bytes) => FontArc::try_from_vec(bytes.clone()),
        }
        .map_err(|e| anyhow!("Built-in font is unusable: {}", e))?;
        Ok(Self { font })
    }

    /// Draws `text` with its top-left at `origin`, blending glyph coverage
    /// into the layer. Control characters are skipped.
    pub fn draw(&self, layer: &mut RgbaImage, origin: Point, text: &str, size: f32, color: Rgba<u8>) {
        let scale = PxScale::from(size);
        let scaled = self.font.as_scaled(scale);
        let mut caret = point(origin.x as f32, origin.y as f32 + scaled.ascent());
        let mut previous: Option<GlyphId> = None;

        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                caret.x += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, caret);
            caret.x += scaled.h_advance(id);
            previous = Some(id);

            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    raster::blend_coverage(
                        layer,
                        bounds.min.x as i32 + gx as i32,
                        bounds.min.y as i32 + gy as i32,
                        color,
                        coverage,
                    );
                });
            }
        }
    }

    /// Outlined annotation text: eight offset passes in the outline colour,
    /// then the text itself.
    pub fn draw_outlined(
        &self,
        layer: &mut RgbaImage,
        origin: Point,
        text: &str,
        size: f32,
        color: Rgba<u8>,
    ) {
        for (dx, dy) in OUTLINE_OFFSETS {
            self.draw(layer, Point::new(origin.x + dx, origin.y + dy), text, size, OUTLINE);
        }
        self.draw(layer, origin, text, size, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn painted(layer: &RgbaImage) -> Vec<(u32, u32)> {
        layer
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[3] != 0)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[test]
    fn test_builtin_font_draws_below_and_right_of_origin() {
        let painter = TextPainter::builtin().unwrap();
        let mut layer = raster::new_layer(200, 80);
        painter.draw(&mut layer, Point::new(20, 10), "Hi", 40.0, Rgba([255, 0, 0, 255]));

        let pixels = painted(&layer);
        assert!(!pixels.is_empty());
        for (x, y) in pixels {
            assert!(x >= 19 && y >= 10, "glyph pixel ({}, {}) above/left of origin", x, y);
        }
    }

    #[test]
    fn test_outlined_text_has_outline_and_fill() {
        let painter = TextPainter::builtin().unwrap();
        let mut layer = raster::new_layer(200, 80);
        let fill = Rgba([0, 150, 255, 255]);
        painter.draw_outlined(&mut layer, Point::new(10, 10), "Wl", 40.0, fill);

        assert!(layer.pixels().any(|p| *p == fill));
        // Edge pixels keep the dark outline
        assert!(layer.pixels().any(|p| p.0[3] != 0 && p.0[0] == 0 && p.0[2] < 100));
    }

    #[test]
    fn test_control_characters_are_skipped() {
        let painter = TextPainter::builtin().unwrap();
        let mut layer = raster::new_layer(50, 50);
        painter.draw(&mut layer, Point::new(0, 0), "\n\t", 30.0, Rgba([255, 255, 255, 255]));
        assert!(painted(&layer).is_empty());
    }
}
