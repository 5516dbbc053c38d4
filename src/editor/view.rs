//! The editor window: toolbar, scaled canvas and the text prompt.

use eframe::egui::{self, Color32, Pos2, RichText, Sense, TextureHandle, Vec2};
use image::RgbImage;

use crate::geometry::Point;

use super::{DrawMode, Editor, HighlightColor, PressOutcome, MAX_BRUSH_SIZE, MIN_BRUSH_SIZE};

/// Space left around the canvas when fitting it to the monitor.
const SCREEN_MARGIN: Vec2 = Vec2::new(80.0, 180.0);

/// Result of one editor frame.
pub enum EditorVerdict {
    Pending,
    Save(RgbImage),
    Cancel,
}

struct TextPrompt {
    at: Point,
    text: String,
}

pub struct EditorView {
    editor: Editor,
    texture: Option<TextureHandle>,
    uploaded_revision: Option<u64>,
    prompt: Option<TextPrompt>,
    drawing: bool,
    error: Option<String>,
}

fn swatch(color: HighlightColor) -> Color32 {
    let [r, g, b, _] = color.rgba().0;
    Color32::from_rgb(r, g, b)
}

impl EditorView {
    pub fn new(image: RgbImage) -> Self {
        log::info!("Editor opened for {}x{} image", image.width(), image.height());
        Self {
            editor: Editor::new(image),
            texture: None,
            uploaded_revision: None,
            prompt: None,
            drawing: false,
            error: None,
        }
    }

    /// Re-uploads the canvas texture at most once per frame, and only when
    /// the editor changed since the last upload.
    fn sync_texture(&mut self, ctx: &egui::Context) {
        if self.uploaded_revision == Some(self.editor.revision()) && self.texture.is_some() {
            return;
        }
        let display = self.editor.display_image();
        let size = [display.width() as usize, display.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, display.as_raw());
        match &mut self.texture {
            Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture(
                    "editor_canvas",
                    color_image,
                    egui::TextureOptions::LINEAR,
                ))
            }
        }
        self.uploaded_revision = Some(self.editor.revision());
    }

    /// Canvas size in points: the image at 1:1 pixels, shrunk to fit the
    /// monitor when needed.
    fn canvas_size(&self, ctx: &egui::Context) -> Vec2 {
        let ppp = ctx.pixels_per_point();
        let image = Vec2::new(self.editor.width() as f32, self.editor.height() as f32) / ppp;
        let monitor = ctx
            .input(|i| i.viewport().monitor_size)
            .unwrap_or(Vec2::new(1920.0, 1080.0) / ppp);
        let room = (monitor - SCREEN_MARGIN).max(Vec2::splat(100.0));
        let scale = (room.x / image.x).min(room.y / image.y).min(1.0);
        image * scale
    }

    /// Shows the editor viewport for this frame.
    pub fn show(&mut self, ctx: &egui::Context) -> EditorVerdict {
        let canvas = self.canvas_size(ctx);
        let builder = egui::ViewportBuilder::default()
            .with_title("SnapMark Editor")
            .with_inner_size(canvas + Vec2::new(24.0, 90.0))
            .with_min_inner_size(Vec2::new(480.0, 240.0))
            .with_always_on_top();

        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("snapmark_editor"),
            builder,
            |ctx, _class| self.frame(ctx, canvas),
        )
    }

    fn frame(&mut self, ctx: &egui::Context, canvas: Vec2) -> EditorVerdict {
        self.sync_texture(ctx);

        let (escape, close_requested) =
            ctx.input(|i| (i.key_pressed(egui::Key::Escape), i.viewport().close_requested()));
        if close_requested || (escape && self.prompt.is_none()) {
            log::info!("Editor cancelled");
            return EditorVerdict::Cancel;
        }

        let mut verdict = EditorVerdict::Pending;

        egui::TopBottomPanel::top("editor_toolbar").show(ctx, |ui| {
            let (save, cancel) = self.render_toolbar(ui);
            if save {
                verdict = EditorVerdict::Save(self.editor.composite());
            } else if cancel {
                log::info!("Editor cancelled");
                verdict = EditorVerdict::Cancel;
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                let (response, painter) = ui.allocate_painter(canvas, Sense::click_and_drag());
                if let Some(texture) = &self.texture {
                    painter.image(
                        texture.id(),
                        response.rect,
                        egui::Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                        Color32::WHITE,
                    );
                }
                if self.prompt.is_none() {
                    self.handle_pointer(ctx, response.rect);
                }
                if response.hovered() {
                    ctx.set_cursor_icon(egui::CursorIcon::Crosshair);
                }
            });
        });

        self.render_prompt(ctx);
        verdict
    }

    fn to_image(&self, rect: egui::Rect, pos: Pos2) -> Point {
        let x = (pos.x - rect.min.x) / rect.width() * self.editor.width() as f32;
        let y = (pos.y - rect.min.y) / rect.height() * self.editor.height() as f32;
        Point::new(x.round() as i32, y.round() as i32)
    }

    fn handle_pointer(&mut self, ctx: &egui::Context, rect: egui::Rect) {
        let (pressed, down, released, moved, pos) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.primary_released(),
                i.pointer.delta() != Vec2::ZERO,
                i.pointer.interact_pos(),
            )
        });
        let Some(pos) = pos else {
            return;
        };
        let point = self.to_image(rect, pos);

        if pressed && rect.contains(pos) {
            match self.editor.pointer_down(point) {
                PressOutcome::Drawing => self.drawing = true,
                PressOutcome::TextRequested(at) => {
                    self.prompt = Some(TextPrompt {
                        at,
                        text: String::new(),
                    })
                }
            }
        } else if self.drawing && down && moved {
            self.editor.pointer_drag(point);
        }

        if self.drawing && released {
            self.editor.pointer_up(point);
            self.drawing = false;
        }
    }

    /// Returns (save_clicked, cancel_clicked).
    fn render_toolbar(&mut self, ui: &mut egui::Ui) -> (bool, bool) {
        let mut save_clicked = false;
        let mut cancel_clicked = false;

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            for color in HighlightColor::ALL {
                let text = RichText::new(format!("● {}", color.label())).color(swatch(color));
                if ui.selectable_label(self.editor.color == color, text).clicked() {
                    self.editor.color = color;
                }
            }

            ui.separator();

            for mode in DrawMode::ALL {
                ui.radio_value(&mut self.editor.mode, mode, mode.label());
            }

            ui.separator();

            let mut size = self.editor.brush_size();
            if ui
                .add(egui::Slider::new(&mut size, MIN_BRUSH_SIZE..=MAX_BRUSH_SIZE).text("Size"))
                .changed()
            {
                self.editor.set_brush_size(size);
            }
            ui.checkbox(&mut self.editor.horizontal_lock, "Straight Line");

            ui.separator();

            if ui.button(RichText::new("💾 Save").strong()).clicked() {
                save_clicked = true;
            }
            if ui.button("✖ Cancel").clicked() {
                cancel_clicked = true;
            }
        });

        if let Some(error) = &self.error {
            ui.label(RichText::new(error).color(Color32::from_rgb(200, 0, 0)));
        }
        ui.add_space(4.0);

        (save_clicked, cancel_clicked)
    }

    fn render_prompt(&mut self, ctx: &egui::Context) {
        let Some(prompt) = &mut self.prompt else {
            return;
        };

        let mut confirmed = false;
        let mut dismissed = false;
        egui::Window::new("Add text")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label("Enter text:");
                let edit = ui.text_edit_singleline(&mut prompt.text);
                edit.request_focus();
                if edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    confirmed = true;
                }
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() {
                        confirmed = true;
                    }
                    if ui.button("Cancel").clicked() {
                        dismissed = true;
                    }
                });
            });
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            dismissed = true;
        }

        if confirmed {
            if let Some(prompt) = self.prompt.take() {
                if let Err(e) = self.editor.draw_text(prompt.at, &prompt.text) {
                    log::warn!("Text annotation failed: {:#}", e);
                    self.error = Some(format!("Text unavailable: {}", e));
                }
            }
        } else if dismissed {
            self.prompt = None;
        }
    }
}
