//! Pixel-level drawing on annotation layers.
//!
//! Shapes overwrite layer pixels with their colour (no blending inside a
//! layer); layers are alpha-composited onto the base image only when the
//! result is displayed or saved.

use image::{Rgb, RgbImage, Rgba, RgbaImage};

use crate::geometry::Point;

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// A fresh fully transparent layer.
pub fn new_layer(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, TRANSPARENT)
}

pub fn clear(layer: &mut RgbaImage) {
    for px in layer.pixels_mut() {
        *px = TRANSPARENT;
    }
}

fn put(layer: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < layer.width() && (y as u32) < layer.height() {
        layer.put_pixel(x as u32, y as u32, color);
    }
}

/// Filled disc: every pixel within `radius` of `center`.
pub fn fill_circle(layer: &mut RgbaImage, center: Point, radius: i32, color: Rgba<u8>) {
    let r = radius.max(0);
    let r2 = (r as i64) * (r as i64);
    for dy in -r..=r {
        for dx in -r..=r {
            if (dx as i64) * (dx as i64) + (dy as i64) * (dy as i64) <= r2 {
                put(layer, center.x + dx, center.y + dy, color);
            }
        }
    }
}

/// Thick segment: every pixel within `width / 2` of the segment `from`-`to`.
pub fn thick_line(layer: &mut RgbaImage, from: Point, to: Point, width: i32, color: Rgba<u8>) {
    let half = width.max(1) as f64 / 2.0;
    let reach = half.ceil() as i32;
    let (ax, ay) = (from.x as f64, from.y as f64);
    let (bx, by) = (to.x as f64, to.y as f64);
    let (vx, vy) = (bx - ax, by - ay);
    let len2 = vx * vx + vy * vy;

    let x0 = from.x.min(to.x) - reach;
    let x1 = from.x.max(to.x) + reach;
    let y0 = from.y.min(to.y) - reach;
    let y1 = from.y.max(to.y) + reach;

    for y in y0.max(0)..=y1.min(layer.height() as i32 - 1) {
        for x in x0.max(0)..=x1.min(layer.width() as i32 - 1) {
            let (px, py) = (x as f64, y as f64);
            let t = if len2 == 0.0 {
                0.0
            } else {
                (((px - ax) * vx + (py - ay) * vy) / len2).clamp(0.0, 1.0)
            };
            let (cx, cy) = (ax + t * vx, ay + t * vy);
            let d2 = (px - cx) * (px - cx) + (py - cy) * (py - cy);
            if d2 <= half * half {
                put(layer, x, y, color);
            }
        }
    }
}

/// One-pixel Bresenham line.
pub fn line(layer: &mut RgbaImage, from: Point, to: Point, color: Rgba<u8>) {
    let (mut x, mut y) = (from.x, from.y);
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put(layer, x, y, color);
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// One-pixel ellipse outline with radii `rx`/`ry` around `center`.
///
/// The outline is sampled densely enough that consecutive samples are at
/// most about half a pixel apart, then joined with 1px segments so it has no
/// gaps. Degenerate radii collapse to a line or a point.
pub fn ellipse_outline(layer: &mut RgbaImage, center: Point, rx: i32, ry: i32, color: Rgba<u8>) {
    let (rx, ry) = (rx.max(0), ry.max(0));
    if rx == 0 || ry == 0 {
        line(
            layer,
            Point::new(center.x - rx, center.y - ry),
            Point::new(center.x + rx, center.y + ry),
            color,
        );
        return;
    }

    let steps = ((rx.max(ry) as f64) * std::f64::consts::TAU * 2.0).ceil().max(16.0) as usize;
    let sample = |i: usize| {
        let theta = i as f64 / steps as f64 * std::f64::consts::TAU;
        Point::new(
            center.x + (rx as f64 * theta.cos()).round() as i32,
            center.y + (ry as f64 * theta.sin()).round() as i32,
        )
    };
    let mut prev = sample(0);
    for i in 1..=steps {
        let next = sample(i);
        if next != prev {
            line(layer, prev, next, color);
            prev = next;
        }
    }
}

/// Mixes `color` into a layer pixel by `coverage` (0..=1), used for
/// anti-aliased glyph edges.
pub fn blend_coverage(layer: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x as u32 >= layer.width() || y as u32 >= layer.height() {
        return;
    }
    let c = coverage.clamp(0.0, 1.0);
    if c <= 0.0 {
        return;
    }
    let dst = layer.get_pixel_mut(x as u32, y as u32);
    for i in 0..4 {
        let mixed = color.0[i] as f32 * c + dst.0[i] as f32 * (1.0 - c);
        dst.0[i] = mixed.round() as u8;
    }
}

/// Straight-alpha "over" operator for a single pixel.
fn over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src.0[3] as f32 / 255.0;
    if sa <= 0.0 {
        return dst;
    }
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return TRANSPARENT;
    }
    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (src.0[i] as f32 * sa + dst.0[i] as f32 * da * (1.0 - sa)) / out_a;
        out[i] = c.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round() as u8;
    Rgba(out)
}

/// Composites `layer` over `base` in place. Sizes must match; extra pixels
/// on either side are ignored.
pub fn composite_onto(base: &mut RgbaImage, layer: &RgbaImage) {
    let w = base.width().min(layer.width());
    let h = base.height().min(layer.height());
    for y in 0..h {
        for x in 0..w {
            let src = *layer.get_pixel(x, y);
            if src.0[3] == 0 {
                continue;
            }
            let dst = *base.get_pixel(x, y);
            base.put_pixel(x, y, over(dst, src));
        }
    }
}

/// Returns `base` with `layer` composited over it.
pub fn composite(base: &RgbaImage, layer: &RgbaImage) -> RgbaImage {
    let mut out = base.clone();
    composite_onto(&mut out, layer);
    out
}

/// Drops the alpha channel; the editor's base is always opaque.
pub fn flatten(img: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let p = img.get_pixel(x, y);
        Rgb([p.0[0], p.0[1], p.0[2]])
    })
}
