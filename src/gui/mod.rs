//! GUI module for the application.
//!
//! The main window hosts the capture controls and the gallery. Pickers, the
//! editor and the countdown are extra viewports driven from the same
//! `update` loop as the workflow.

pub mod render;
pub mod state;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use eframe::egui::{self, Vec2};

use crate::hotkeys::HotkeyListener;
use crate::settings::Settings;
use crate::workflow::{CaptureKind, DesktopWorkflow};

use state::{FolderPrompt, GalleryAction, GuiState, Thumbnail};

/// Repaint interval while a capture is in flight.
const BUSY_REPAINT: Duration = Duration::from_millis(100);

/// Main GUI application struct.
pub struct GuiApp {
    /// Application state.
    state: GuiState,
    settings: Settings,
    /// Settings as last written, to detect changes.
    saved_settings: Settings,
    settings_path: PathBuf,
    workflow: DesktopWorkflow,
    hotkeys: Option<HotkeyListener>,
}

impl GuiApp {
    /// Create a new GUI application instance.
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings, settings_path: PathBuf) -> Self {
        let mut state = GuiState::new(&settings.save_dir, settings.thumbnail_size);
        let mut workflow = DesktopWorkflow::desktop(&settings.save_dir);
        if !settings.save_dir.exists() {
            workflow.change_save_dir(&settings.save_dir);
        }

        let hotkeys = match HotkeyListener::spawn(cc.egui_ctx.clone()) {
            Ok(listener) => Some(listener),
            Err(e) => {
                log::warn!("GUI: Hotkeys disabled: {:#}", e);
                state.hotkey_warning = Some(format!("Global hotkeys unavailable: {}", e));
                None
            }
        };

        Self {
            state,
            saved_settings: settings.clone(),
            settings,
            settings_path,
            workflow,
            hotkeys,
        }
    }

    fn start_capture(&mut self, kind: CaptureKind) {
        self.workflow.request_capture(kind, &self.settings, Instant::now());
    }

    /// Minimize the main window while a capture is in flight so it stays out
    /// of the grab, and bring it back afterwards.
    fn sync_main_window(&mut self, ctx: &egui::Context) {
        let in_flight = self.workflow.is_in_flight();
        if in_flight == self.state.hidden {
            return;
        }
        self.state.hidden = in_flight;
        ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(in_flight));
        if !in_flight {
            ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
            self.state.gallery_dirty = true;
        }
    }

    /// Show whichever capture viewport the workflow is in.
    fn show_capture_viewports(&mut self, ctx: &egui::Context) {
        let now = Instant::now();

        if let Some(remaining) = self.workflow.countdown_remaining(now) {
            if self.show_countdown(ctx, remaining) {
                self.workflow.cancel_countdown();
            }
        }

        if let Some(overlay) = self.workflow.overlay_mut() {
            let result = overlay.show(ctx);
            self.workflow.picker_result(result, &self.settings, now);
        }

        if let Some(editor) = self.workflow.editor_mut() {
            let verdict = editor.show(ctx);
            self.workflow.editor_result(verdict, &self.settings, now);
        }
    }

    /// Small always-on-top countdown in the top-right corner. Returns true
    /// when cancelled.
    fn show_countdown(&self, ctx: &egui::Context, remaining: u32) -> bool {
        let monitor = ctx
            .input(|i| i.viewport().monitor_size)
            .unwrap_or(Vec2::new(1280.0, 720.0));
        let size = Vec2::new(160.0, 110.0);
        let position = egui::pos2(monitor.x - size.x - 20.0, 20.0);

        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("snapmark_countdown"),
            egui::ViewportBuilder::default()
                .with_title("SnapMark Countdown")
                .with_inner_size(size)
                .with_position(position)
                .with_decorations(false)
                .with_resizable(false)
                .with_always_on_top(),
            |ctx, _class| {
                let mut cancel = ctx.input(|i| {
                    i.key_pressed(egui::Key::Escape) || i.viewport().close_requested()
                });
                egui::CentralPanel::default().show(ctx, |ui| {
                    if render::render_countdown(ui, remaining) {
                        cancel = true;
                    }
                });
                cancel
            },
        )
    }

    /// Re-read folders and screenshots, and build missing thumbnails.
    fn refresh_gallery(&mut self, ctx: &egui::Context) {
        self.state.folders = match self.workflow.store().folders() {
            Ok(folders) => folders,
            Err(e) => {
                log::warn!("GUI: Could not list folders: {}", e);
                Vec::new()
            }
        };
        let active_missing = self
            .settings
            .active_folder
            .as_ref()
            .is_some_and(|f| !self.state.folders.contains(f));
        if active_missing {
            self.settings.active_folder = None;
        }

        self.state.entries = self.workflow.refresh_gallery(&self.settings);

        if self.state.thumbnail_width != self.settings.thumbnail_size {
            self.state.thumbnail_width = self.settings.thumbnail_size;
            self.state.thumbnails.clear();
        }
        self.state.prune_thumbnails();
        let [w, h] = state::thumbnail_box(self.state.thumbnail_width);
        for entry in &self.state.entries {
            if self.state.thumbnails.contains_key(&entry.path) {
                continue;
            }
            match load_thumbnail(ctx, &entry.path, w, h) {
                Ok(texture) => {
                    self.state.thumbnails.insert(
                        entry.path.clone(),
                        Thumbnail {
                            modified: entry.modified,
                            texture,
                        },
                    );
                }
                Err(e) => log::warn!("GUI: Thumbnail for {} failed: {}", entry.name, e),
            }
        }
        self.state.gallery_dirty = false;
    }

    /// Handle apply save location button click.
    fn handle_apply_save_dir(&mut self) {
        let dir = PathBuf::from(self.state.save_dir_input.trim());
        if self.workflow.change_save_dir(&dir) {
            self.settings.save_dir = dir;
            self.settings.active_folder = None;
            self.state.thumbnails.clear();
            self.state.gallery_dirty = true;
        }
    }

    /// Handle open folder button click.
    fn handle_open_folder(&mut self) {
        let path = self
            .workflow
            .store()
            .folder_path(self.settings.active_folder.as_deref());
        self.workflow.open_externally(&path);
    }

    fn handle_gallery_action(&mut self, action: GalleryAction) {
        match action {
            GalleryAction::Open(path) => self.workflow.open_externally(&path),
            GalleryAction::Edit(path) => {
                self.workflow.edit_file(&path);
            }
            GalleryAction::Copy(path) => {
                self.workflow.copy_file(&path);
            }
            GalleryAction::Send(path) => self.workflow.send_file(&path, &self.settings),
            GalleryAction::Move(path, folder) => {
                if self.workflow.move_file(&path, folder.as_deref()) {
                    self.state.gallery_dirty = true;
                }
            }
            GalleryAction::Delete(path) => self.state.confirm_delete = Some(path),
        }
    }

    fn handle_folder_prompt(&mut self, prompt: FolderPrompt) {
        let result = match prompt {
            FolderPrompt::Create { name } => self.workflow.create_folder(&name),
            FolderPrompt::Rename { old, name } => self.workflow.rename_folder(&old, &name),
        };
        if let Some(folder) = result {
            self.settings.active_folder = Some(folder);
            self.state.gallery_dirty = true;
        }
    }

    fn show_dialogs(&mut self, ctx: &egui::Context) {
        if let Some(message) = self.workflow.error().map(str::to_string) {
            if render::render_error(ctx, &message) {
                self.workflow.dismiss_error();
            }
            return;
        }

        if let Some(prompt) = &mut self.state.folder_prompt {
            let (ok, cancel) = render::render_folder_prompt(ctx, prompt);
            if ok {
                if let Some(prompt) = self.state.folder_prompt.take() {
                    self.handle_folder_prompt(prompt);
                }
            } else if cancel {
                self.state.folder_prompt = None;
            }
        }

        if let Some(path) = self.state.confirm_delete.clone() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if let Some(answer) = render::render_confirm(ctx, "Delete screenshot", &format!("Delete {}?", name)) {
                self.state.confirm_delete = None;
                if answer && self.workflow.delete_file(&path) {
                    self.state.gallery_dirty = true;
                }
            }
        }

        if let Some(used) = self.workflow.cleanup_prompt() {
            let message = format!(
                "Screenshots use {:.1} MB of your {} MB quota.\nDelete screenshots older than {} days?",
                used as f64 / (1024.0 * 1024.0),
                self.settings.disk_quota_mb,
                self.settings.cleanup_age_days
            );
            if let Some(answer) = render::render_confirm(ctx, "Disk quota", &message) {
                if self.workflow.resolve_cleanup(answer, &self.settings).is_some() {
                    self.state.gallery_dirty = true;
                }
            }
        }

        let mut open = self.state.show_settings;
        egui::Window::new("Settings")
            .open(&mut open)
            .resizable(true)
            .default_width(520.0)
            .show(ctx, |ui| {
                render::render_settings(ui, &mut self.settings);
            });
        self.state.show_settings = open;
    }

    /// Write settings whenever they change.
    fn persist_settings(&mut self) {
        if self.settings == self.saved_settings {
            return;
        }
        match self.settings.save(&self.settings_path) {
            Ok(()) => self.saved_settings = self.settings.clone(),
            Err(e) => {
                log::error!("GUI: Failed to save settings: {:#}", e);
                // Avoid retrying every frame
                self.saved_settings = self.settings.clone();
            }
        }
    }
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Poll hotkeys
        let pressed: Vec<_> = self
            .hotkeys
            .as_ref()
            .map(|h| std::iter::from_fn(|| h.poll()).collect())
            .unwrap_or_default();
        for action in pressed {
            self.start_capture(CaptureKind::from(action));
        }

        self.workflow.tick(&self.settings, Instant::now());
        self.sync_main_window(ctx);
        self.show_capture_viewports(ctx);
        self.sync_main_window(ctx);

        if self.state.gallery_dirty {
            self.refresh_gallery(ctx);
        }

        // Keep deadlines moving while a capture is in flight
        if self.workflow.is_in_flight() || self.workflow.next_deadline().is_some() {
            ctx.request_repaint_after(BUSY_REPAINT);
        }

        // Main panel
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("SnapMark");
            ui.add_space(8.0);

            if let Some(kind) = render::render_capture_buttons(ui, self.workflow.is_in_flight()) {
                self.start_capture(kind);
            }
            ui.add_space(4.0);
            render::render_status(
                ui,
                self.workflow.status(),
                self.workflow.is_in_flight(),
                self.workflow.error().is_some(),
                self.workflow.session_count(),
                self.state.hotkey_warning.as_deref(),
            );

            let (apply_clicked, open_folder_clicked, settings_clicked) =
                render::render_options(ui, &mut self.settings, &mut self.state);
            if apply_clicked {
                self.handle_apply_save_dir();
            }
            if open_folder_clicked {
                self.handle_open_folder();
            }
            if settings_clicked {
                self.state.show_settings = true;
            }

            let before = self.settings.active_folder.clone();
            let (new_clicked, rename_clicked, refresh_clicked) =
                render::render_folder_tabs(ui, &self.state.folders, &mut self.settings.active_folder);
            if before != self.settings.active_folder || refresh_clicked {
                self.state.gallery_dirty = true;
            }
            if new_clicked {
                self.state.folder_prompt = Some(FolderPrompt::Create { name: String::new() });
            }
            if rename_clicked {
                if let Some(old) = self.settings.active_folder.clone() {
                    self.state.folder_prompt = Some(FolderPrompt::Rename { name: old.clone(), old });
                }
            }

            ui.add_space(8.0);
            // Scrollable gallery
            let action = egui::ScrollArea::vertical()
                .show(ui, |ui| {
                    render::render_gallery(
                        ui,
                        &self.state,
                        self.settings.active_folder.as_deref(),
                        self.settings.thumbnail_size,
                    )
                })
                .inner;
            if let Some(action) = action {
                self.handle_gallery_action(action);
            }
        });

        self.show_dialogs(ctx);

        if self.state.thumbnail_width != self.settings.thumbnail_size {
            self.state.gallery_dirty = true;
        }
        self.persist_settings();
    }
}

impl Drop for GuiApp {
    fn drop(&mut self) {
        // Last chance to write settings changed in the final frame
        self.persist_settings();
        log::info!("GUI: Shut down after {} screenshots", self.workflow.session_count());
    }
}

/// Decode a screenshot and upload a thumbnail fitting `w`x`h`.
fn load_thumbnail(ctx: &egui::Context, path: &Path, w: u32, h: u32) -> anyhow::Result<egui::TextureHandle> {
    let thumb = image::open(path)?.thumbnail(w, h).to_rgba8();
    let size = [thumb.width() as usize, thumb.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, thumb.as_raw());
    Ok(ctx.load_texture(
        format!("thumb_{}", path.display()),
        color_image,
        egui::TextureOptions::LINEAR,
    ))
}

/// Run the GUI application.
/// This function blocks until the window is closed.
pub fn run_gui(settings: Settings, settings_path: PathBuf) -> eframe::Result<()> {
    log::info!("GUI: Creating native options...");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(Vec2::new(760.0, 620.0))
            .with_min_inner_size(Vec2::new(480.0, 400.0))
            .with_title("SnapMark"),
        ..Default::default()
    };

    eframe::run_native(
        "SnapMark",
        options,
        Box::new(|cc| {
            log::info!("GUI: Creating GuiApp instance...");
            Ok(Box::new(GuiApp::new(cc, settings, settings_path)))
        }),
    )
}
