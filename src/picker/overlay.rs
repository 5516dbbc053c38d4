//! Full-screen egui overlay that hosts the region and window pickers.
//!
//! The overlay shows a frozen screenshot of the virtual screen in an
//! undecorated, always-on-top viewport and feeds pointer/keyboard input to
//! the active picker. Results are in screenshot pixel space.

use eframe::egui::{self, Color32, Pos2, Sense, Stroke, TextureHandle, Vec2};
use image::RgbImage;

use crate::capture::WindowInfo;
use crate::geometry::{Point, Rect};

use super::{PickerOutcome, RegionSelector, WindowPicker};

const SELECTION_COLOR: Color32 = Color32::from_rgb(255, 0, 0);
const DIM: Color32 = Color32::from_black_alpha(70);

/// What the overlay is asking the user to pick.
pub enum PickerMode {
    Region(RegionSelector),
    Window(WindowPicker),
}

/// Final answer from the overlay.
#[derive(Debug, PartialEq)]
pub enum OverlayResult {
    Pending,
    /// Rectangle in screenshot pixel space.
    Region(Rect),
    Window(WindowInfo),
    Cancelled,
}

pub struct PickerOverlay {
    frozen: RgbImage,
    /// Screen position of the screenshot's top-left pixel.
    origin: Point,
    mode: PickerMode,
    texture: Option<TextureHandle>,
}

impl PickerOverlay {
    pub fn region(frozen: RgbImage, origin: Point) -> Self {
        Self {
            frozen,
            origin,
            mode: PickerMode::Region(RegionSelector::new()),
            texture: None,
        }
    }

    pub fn window(frozen: RgbImage, origin: Point, windows: Vec<WindowInfo>) -> Self {
        Self {
            frozen,
            origin,
            mode: PickerMode::Window(WindowPicker::new(windows, origin)),
            texture: None,
        }
    }

    pub fn into_frozen(self) -> RgbImage {
        self.frozen
    }

    /// Draws the overlay viewport for this frame and processes its input.
    pub fn show(&mut self, ctx: &egui::Context) -> OverlayResult {
        if self.texture.is_none() {
            let size = [self.frozen.width() as usize, self.frozen.height() as usize];
            let color_image = egui::ColorImage::from_rgb(size, self.frozen.as_raw());
            self.texture = Some(ctx.load_texture(
                "picker_frozen_screen",
                color_image,
                egui::TextureOptions::LINEAR,
            ));
        }

        let ppp = ctx.pixels_per_point();
        let position = Pos2::new(self.origin.x as f32 / ppp, self.origin.y as f32 / ppp);
        let size = Vec2::new(
            self.frozen.width() as f32 / ppp,
            self.frozen.height() as f32 / ppp,
        );
        let title = match self.mode {
            PickerMode::Region(_) => "Select region",
            PickerMode::Window(_) => "Select window",
        };
        let builder = egui::ViewportBuilder::default()
            .with_title(title)
            .with_position(position)
            .with_inner_size(size)
            .with_decorations(false)
            .with_always_on_top()
            .with_taskbar(false)
            .with_resizable(false);

        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("snapmark_picker"),
            builder,
            |ctx, _class| self.frame(ctx),
        )
    }

    fn frame(&mut self, ctx: &egui::Context) -> OverlayResult {
        let (escape, close_requested, pressed, released, pointer) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Escape),
                i.viewport().close_requested(),
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.interact_pos().or(i.pointer.hover_pos()),
            )
        });

        let img_w = self.frozen.width() as f32;
        let img_h = self.frozen.height() as f32;
        let mut result = OverlayResult::Pending;

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
                let rect = response.rect;
                let to_image = |pos: Pos2| {
                    Point::new(
                        ((pos.x - rect.min.x) * img_w / rect.width()).round() as i32,
                        ((pos.y - rect.min.y) * img_h / rect.height()).round() as i32,
                    )
                };
                let to_ui = |r: Rect| {
                    egui::Rect::from_min_max(
                        Pos2::new(
                            rect.min.x + r.left as f32 * rect.width() / img_w,
                            rect.min.y + r.top as f32 * rect.height() / img_h,
                        ),
                        Pos2::new(
                            rect.min.x + r.right as f32 * rect.width() / img_w,
                            rect.min.y + r.bottom as f32 * rect.height() / img_h,
                        ),
                    )
                };

                if let Some(texture) = &self.texture {
                    painter.image(
                        texture.id(),
                        rect,
                        egui::Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                        Color32::WHITE,
                    );
                }
                painter.rect_filled(rect, 0.0, DIM);

                let cancel = escape || close_requested;
                match &mut self.mode {
                    PickerMode::Region(selector) => {
                        let outcome = if cancel {
                            selector.cancel()
                        } else {
                            if let Some(pos) = pointer {
                                if pressed {
                                    selector.press(to_image(pos));
                                } else {
                                    selector.drag(to_image(pos));
                                }
                            }
                            match (released, pointer) {
                                (true, Some(pos)) => selector.release(to_image(pos)),
                                _ => PickerOutcome::Pending,
                            }
                        };
                        if let Some(sel) = selector.preview() {
                            let outline = to_ui(sel);
                            painter.rect_stroke(outline, 0.0, Stroke::new(2.0, SELECTION_COLOR));
                            if selector.is_dragging() {
                                painter.text(
                                    outline.right_bottom() + Vec2::new(4.0, 4.0),
                                    egui::Align2::LEFT_TOP,
                                    format!("{} x {}", sel.width(), sel.height()),
                                    egui::FontId::proportional(14.0),
                                    Color32::WHITE,
                                );
                            }
                        }
                        result = match outcome {
                            PickerOutcome::Pending => OverlayResult::Pending,
                            PickerOutcome::Selected(r) => OverlayResult::Region(r),
                            PickerOutcome::Cancelled => OverlayResult::Cancelled,
                        };
                    }
                    PickerMode::Window(picker) => {
                        let outcome = if cancel {
                            picker.cancel()
                        } else if let (true, Some(pos)) = (pressed, pointer) {
                            picker.click(to_image(pos))
                        } else {
                            PickerOutcome::Pending
                        };
                        if let Some(hovered) = pointer.and_then(|pos| picker.hover(to_image(pos))) {
                            let origin = picker.origin();
                            let local = hovered.rect.offset(-origin.x, -origin.y);
                            let highlight = to_ui(local).intersect(rect);
                            painter.rect_stroke(highlight, 0.0, Stroke::new(3.0, SELECTION_COLOR));
                            painter.text(
                                highlight.left_top() + Vec2::new(6.0, 6.0),
                                egui::Align2::LEFT_TOP,
                                &hovered.title,
                                egui::FontId::proportional(16.0),
                                Color32::WHITE,
                            );
                        }
                        result = match outcome {
                            PickerOutcome::Pending => OverlayResult::Pending,
                            PickerOutcome::Selected(w) => OverlayResult::Window(w),
                            PickerOutcome::Cancelled => OverlayResult::Cancelled,
                        };
                    }
                }

                painter.text(
                    rect.center_top() + Vec2::new(0.0, 24.0),
                    egui::Align2::CENTER_TOP,
                    match self.mode {
                        PickerMode::Region(_) => "Drag to select a region. Esc to cancel.",
                        PickerMode::Window(_) => "Click a window to capture it. Esc to cancel.",
                    },
                    egui::FontId::proportional(20.0),
                    Color32::WHITE,
                );
            });

        ctx.set_cursor_icon(egui::CursorIcon::Crosshair);
        ctx.request_repaint();
        result
    }
}
