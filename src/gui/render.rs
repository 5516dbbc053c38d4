//! GUI rendering functions.
//!
//! Contains UI layout and component rendering logic.

use eframe::egui::{self, Color32, RichText, Vec2};

use crate::capture::ScreenScope;
use crate::delivery::push::{ClickAnchor, ClickOffset};
use crate::delivery::PushTarget;
use crate::hotkeys::HotkeyAction;
use crate::settings::{Settings, DELAY_CHOICES, THUMBNAIL_SIZES};
use crate::workflow::CaptureKind;

use super::state::{self, FolderPrompt, GalleryAction, GuiState};

fn delay_label(seconds: u32) -> String {
    if seconds == 0 {
        "No delay".to_string()
    } else {
        format!("{}s", seconds)
    }
}

/// Render the capture buttons. Returns the capture the user asked for.
pub fn render_capture_buttons(ui: &mut egui::Ui, in_flight: bool) -> Option<CaptureKind> {
    let mut requested = None;

    ui.add_enabled_ui(!in_flight, |ui| {
        ui.horizontal(|ui| {
            let buttons = [
                ("Region", HotkeyAction::Region),
                ("Full Screen", HotkeyAction::FullScreen),
                ("Window", HotkeyAction::Window),
            ];
            for (text, action) in buttons {
                let button = ui
                    .button(RichText::new(text).size(16.0))
                    .on_hover_text(action.label());
                if button.clicked() {
                    requested = Some(CaptureKind::from(action));
                }
            }
        });
    });

    requested
}

/// Render the status line and session counter.
pub fn render_status(
    ui: &mut egui::Ui,
    status: &str,
    in_flight: bool,
    has_error: bool,
    session_count: u32,
    hotkey_warning: Option<&str>,
) {
    ui.horizontal(|ui| {
        ui.label("Status:");
        ui.label(RichText::new(status).color(state::status_color(in_flight, has_error)));
    });
    ui.label(RichText::new(format!("Screenshots this session: {}", session_count)).weak());
    if let Some(warning) = hotkey_warning {
        ui.label(RichText::new(warning).color(Color32::from_rgb(200, 150, 0)));
    }
}

/// Render the quick options: delay, auto-paste and save location.
/// Returns (apply_save_dir_clicked, open_folder_clicked, settings_clicked).
pub fn render_options(
    ui: &mut egui::Ui,
    settings: &mut Settings,
    state: &mut GuiState,
) -> (bool, bool, bool) {
    let mut apply_clicked = false;
    let mut open_clicked = false;
    let mut settings_clicked = false;

    ui.add_space(8.0);
    ui.separator();
    ui.add_space(8.0);

    ui.horizontal(|ui| {
        ui.label("Delay:");
        egui::ComboBox::from_id_salt("delay")
            .selected_text(delay_label(settings.delay_seconds))
            .show_ui(ui, |ui| {
                for seconds in DELAY_CHOICES {
                    ui.selectable_value(&mut settings.delay_seconds, seconds, delay_label(seconds));
                }
            });

        ui.add_space(12.0);
        ui.checkbox(&mut settings.edit_before_save, "Edit before save");

        ui.add_space(12.0);
        let target = settings
            .active_push_target()
            .map(|t| t.name.clone())
            .unwrap_or_else(|| "target".to_string());
        ui.checkbox(&mut settings.auto_paste, format!("Auto-paste to {}", target));
    });

    ui.add_space(4.0);
    ui.horizontal(|ui| {
        ui.label("Save to:");
        ui.add(egui::TextEdit::singleline(&mut state.save_dir_input).desired_width(260.0));
        if ui.button("Apply").clicked() {
            apply_clicked = true;
        }
        if ui.button("Open Folder").clicked() {
            open_clicked = true;
        }
        if ui.button("Settings").clicked() {
            settings_clicked = true;
        }
    });

    (apply_clicked, open_clicked, settings_clicked)
}

/// Render the folder tabs. Changes `active` in place.
/// Returns (new_clicked, rename_clicked, refresh_clicked).
pub fn render_folder_tabs(
    ui: &mut egui::Ui,
    folders: &[String],
    active: &mut Option<String>,
) -> (bool, bool, bool) {
    let mut new_clicked = false;
    let mut rename_clicked = false;
    let mut refresh_clicked = false;

    ui.add_space(8.0);
    ui.separator();
    ui.add_space(8.0);

    ui.horizontal_wrapped(|ui| {
        ui.selectable_value(active, None, "(root)");
        for folder in folders {
            ui.selectable_value(active, Some(folder.clone()), folder.as_str());
        }

        ui.add_space(12.0);
        if ui.small_button("+ New").clicked() {
            new_clicked = true;
        }
        ui.add_enabled_ui(active.is_some(), |ui| {
            if ui.small_button("Rename").clicked() {
                rename_clicked = true;
            }
        });
        if ui.small_button("Refresh").clicked() {
            refresh_clicked = true;
        }
    });

    (new_clicked, rename_clicked, refresh_clicked)
}

/// Render the thumbnail gallery. Returns the first action clicked.
pub fn render_gallery(
    ui: &mut egui::Ui,
    state: &GuiState,
    active: Option<&str>,
    thumbnail_width: u32,
) -> Option<GalleryAction> {
    let mut action = None;

    if state.entries.is_empty() {
        ui.label(RichText::new("No screenshots yet").weak());
        return None;
    }

    let [box_w, box_h] = state::thumbnail_box(thumbnail_width);
    let box_size = Vec2::new(box_w as f32, box_h as f32);

    ui.horizontal_wrapped(|ui| {
        for entry in &state.entries {
            ui.group(|ui| {
                ui.vertical(|ui| {
                    ui.set_width(box_size.x);

                    let (rect, response) = ui.allocate_exact_size(box_size, egui::Sense::click());
                    ui.painter().rect_filled(rect, 4.0, Color32::from_gray(40));
                    if let Some(thumb) = state.thumbnails.get(&entry.path) {
                        let size = thumb.texture.size_vec2();
                        let scale = (box_size.x / size.x).min(box_size.y / size.y);
                        let fitted = egui::Rect::from_center_size(rect.center(), size * scale);
                        ui.painter().image(
                            thumb.texture.id(),
                            fitted,
                            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                            Color32::WHITE,
                        );
                    }
                    if response.on_hover_text(entry.name.as_str()).double_clicked() {
                        action = Some(GalleryAction::Open(entry.path.clone()));
                    }

                    ui.label(RichText::new(state::entry_caption(entry)).small());

                    ui.horizontal_wrapped(|ui| {
                        if ui.small_button("Open").clicked() {
                            action = Some(GalleryAction::Open(entry.path.clone()));
                        }
                        if ui.small_button("Edit").clicked() {
                            action = Some(GalleryAction::Edit(entry.path.clone()));
                        }
                        if ui.small_button("Copy").clicked() {
                            action = Some(GalleryAction::Copy(entry.path.clone()));
                        }
                        if ui.small_button("Send").clicked() {
                            action = Some(GalleryAction::Send(entry.path.clone()));
                        }
                        ui.menu_button("Move", |ui| {
                            let destinations = std::iter::once(None)
                                .chain(state.folders.iter().map(|f| Some(f.as_str())));
                            for dest in destinations {
                                if dest == active {
                                    continue;
                                }
                                if ui.button(dest.unwrap_or("(root)")).clicked() {
                                    action = Some(GalleryAction::Move(
                                        entry.path.clone(),
                                        dest.map(str::to_string),
                                    ));
                                    ui.close_menu();
                                }
                            }
                        });
                        if ui
                            .small_button(RichText::new("Delete").color(Color32::from_rgb(200, 0, 0)))
                            .clicked()
                        {
                            action = Some(GalleryAction::Delete(entry.path.clone()));
                        }
                    });
                });
            });
        }
    });

    action
}

/// Render the countdown contents. Returns true when cancelled.
pub fn render_countdown(ui: &mut egui::Ui, remaining: u32) -> bool {
    let mut cancel_clicked = false;

    ui.vertical_centered(|ui| {
        ui.label(
            RichText::new(remaining.to_string())
                .size(48.0)
                .strong()
                .color(state::countdown_color(remaining)),
        );
        if ui.button("Cancel").clicked() {
            cancel_clicked = true;
        }
    });

    cancel_clicked
}

/// Render the folder name prompt. Returns (ok_clicked, cancel_clicked).
pub fn render_folder_prompt(ctx: &egui::Context, prompt: &mut FolderPrompt) -> (bool, bool) {
    let mut ok_clicked = false;
    let mut cancel_clicked = false;

    egui::Window::new(prompt.title())
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
        .show(ctx, |ui| {
            let edit = ui.text_edit_singleline(prompt.name_mut());
            if ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                ok_clicked = true;
            } else {
                edit.request_focus();
            }
            ui.horizontal(|ui| {
                if ui.button("OK").clicked() {
                    ok_clicked = true;
                }
                if ui.button("Cancel").clicked() || ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                    cancel_clicked = true;
                }
            });
        });

    (ok_clicked, cancel_clicked)
}

/// Render a yes/no dialog. Returns Some(answer) once clicked.
pub fn render_confirm(ctx: &egui::Context, title: &str, message: &str) -> Option<bool> {
    let mut answer = None;

    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
        .show(ctx, |ui| {
            ui.label(message);
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Yes").clicked() {
                    answer = Some(true);
                }
                if ui.button("No").clicked() {
                    answer = Some(false);
                }
            });
        });

    answer
}

/// Render the error dialog. Returns true when dismissed.
pub fn render_error(ctx: &egui::Context, message: &str) -> bool {
    let mut dismissed = false;

    egui::Window::new("Error")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
        .show(ctx, |ui| {
            ui.label(RichText::new(message).color(Color32::from_rgb(200, 0, 0)));
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });

    dismissed
}

fn render_push_target(ui: &mut egui::Ui, index: usize, target: &mut PushTarget) {
    ui.label("Name:");
    ui.add(egui::TextEdit::singleline(&mut target.name).desired_width(120.0));
    ui.label("Title contains:");
    ui.add(egui::TextEdit::singleline(&mut target.title_contains).desired_width(160.0));

    let mut clicks = target.click.is_some();
    if ui.checkbox(&mut clicks, "Click").changed() {
        target.click = clicks.then(ClickOffset::default);
    }
    if let Some(offset) = &mut target.click {
        egui::ComboBox::from_id_salt(("anchor", index))
            .selected_text(offset.anchor.label())
            .show_ui(ui, |ui| {
                for anchor in ClickAnchor::ALL {
                    ui.selectable_value(&mut offset.anchor, anchor, anchor.label());
                }
            });
        ui.add(egui::DragValue::new(&mut offset.dx).prefix("dx "));
        ui.add(egui::DragValue::new(&mut offset.dy).prefix("dy "));
    }
}

/// Render the settings window contents. Edits `settings` in place.
pub fn render_settings(ui: &mut egui::Ui, settings: &mut Settings) {
    egui::Grid::new("settings_grid")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            ui.label("Full screen captures:");
            egui::ComboBox::from_id_salt("capture_mode")
                .selected_text(settings.capture_mode.label())
                .show_ui(ui, |ui| {
                    for scope in ScreenScope::ALL {
                        ui.selectable_value(&mut settings.capture_mode, scope, scope.label());
                    }
                });
            ui.end_row();

            ui.label("Delay:");
            egui::ComboBox::from_id_salt("settings_delay")
                .selected_text(delay_label(settings.delay_seconds))
                .show_ui(ui, |ui| {
                    for seconds in DELAY_CHOICES {
                        ui.selectable_value(&mut settings.delay_seconds, seconds, delay_label(seconds));
                    }
                });
            ui.end_row();

            ui.label("Editor:");
            ui.checkbox(&mut settings.edit_before_save, "Edit before save");
            ui.end_row();

            ui.label("Thumbnail size:");
            ui.horizontal(|ui| {
                for size in THUMBNAIL_SIZES {
                    ui.radio_value(&mut settings.thumbnail_size, size, format!("{}px", size));
                }
            });
            ui.end_row();

            ui.label("Disk quota:");
            ui.add(
                egui::DragValue::new(&mut settings.disk_quota_mb)
                    .range(0..=100_000)
                    .suffix(" MB"),
            )
            .on_hover_text("0 turns the cleanup prompt off");
            ui.end_row();

            ui.label("Clean up older than:");
            ui.add(
                egui::DragValue::new(&mut settings.cleanup_age_days)
                    .range(1..=3650)
                    .suffix(" days"),
            );
            ui.end_row();
        });

    ui.add_space(8.0);
    ui.separator();
    ui.label(RichText::new("Push targets").strong());

    let mut remove = None;
    for (index, target) in settings.push_targets.iter_mut().enumerate() {
        ui.horizontal_wrapped(|ui| {
            ui.radio_value(&mut settings.active_target, index, "");
            render_push_target(ui, index, target);
            if ui.small_button("Remove").clicked() {
                remove = Some(index);
            }
        });
    }
    if let Some(index) = remove {
        settings.push_targets.remove(index);
        if settings.active_target >= settings.push_targets.len() || settings.active_target > index {
            settings.active_target = settings.active_target.saturating_sub(1);
        }
    }

    ui.horizontal(|ui| {
        if ui.button("Add target").clicked() {
            settings.push_targets.push(PushTarget {
                name: "New target".to_string(),
                title_contains: String::new(),
                click: None,
            });
        }
        if ui.button("Add VSCode Claude").clicked() {
            settings.push_targets.push(PushTarget::vscode_claude());
        }
    });
}
