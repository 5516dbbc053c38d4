//! The capture flow: trigger, countdown, pick, edit, save, deliver.
//!
//! Everything runs on the UI thread. Waits are deadlines checked by
//! [`Workflow::tick`]; the in-flight flag admits one capture at a time and
//! is cleared exactly once when the flow ends.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use image::{imageops, RgbImage};

use crate::capture::{self, DesktopGrabber, ScreenGrabber};
use crate::delivery::{
    push_to_target, ClipboardSink, DesktopDriver, PushTarget, SystemClipboard, WindowDriver,
};
use crate::editor::{EditorVerdict, EditorView};
use crate::geometry::{Point, Rect};
use crate::hotkeys::HotkeyAction;
use crate::picker::overlay::{OverlayResult, PickerOverlay};
use crate::settings::{Settings, GALLERY_LIMIT};
use crate::storage::{quota, CleanupReport, QuotaGuard, ScreenshotEntry, ScreenshotStore};

/// Pause after hiding the main window so it is gone from the grab.
pub const SETTLE_DELAY: Duration = Duration::from_millis(200);

/// Pause between saving and auto-pasting.
pub const PASTE_DELAY: Duration = Duration::from_millis(200);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureKind {
    FullScreen,
    Region,
    Window,
}

impl From<HotkeyAction> for CaptureKind {
    fn from(action: HotkeyAction) -> Self {
        match action {
            HotkeyAction::Region => CaptureKind::Region,
            HotkeyAction::FullScreen => CaptureKind::FullScreen,
            HotkeyAction::Window => CaptureKind::Window,
        }
    }
}

impl CaptureKind {
    pub fn label(&self) -> &'static str {
        match self {
            CaptureKind::FullScreen => "full screen",
            CaptureKind::Region => "region",
            CaptureKind::Window => "window",
        }
    }
}

pub enum Stage {
    Idle,
    Countdown { kind: CaptureKind, deadline: Instant },
    Settling { kind: CaptureKind, deadline: Instant },
    /// Overlay over a frozen grab of the virtual screen at `origin`.
    Picking { overlay: PickerOverlay, origin: Point },
    Editing(EditorView),
}

pub struct Workflow<G: ScreenGrabber, C: ClipboardSink, D: WindowDriver> {
    grabber: G,
    clipboard: C,
    driver: D,
    store: ScreenshotStore,
    stage: Stage,
    in_flight: bool,
    session_count: u32,
    status: String,
    /// Message for the error dialog, cleared when acknowledged.
    error: Option<String>,
    pending_push: Option<Instant>,
    quota: QuotaGuard,
    /// Bytes used when the quota prompt fired, until the user answers.
    cleanup_prompt: Option<u64>,
}

pub type DesktopWorkflow = Workflow<DesktopGrabber, SystemClipboard, DesktopDriver>;

impl DesktopWorkflow {
    pub fn desktop(save_dir: &Path) -> Self {
        Workflow::new(DesktopGrabber, SystemClipboard, DesktopDriver, save_dir)
    }
}

impl<G: ScreenGrabber, C: ClipboardSink, D: WindowDriver> Workflow<G, C, D> {
    pub fn new(grabber: G, clipboard: C, driver: D, save_dir: &Path) -> Self {
        Self {
            grabber,
            clipboard,
            driver,
            store: ScreenshotStore::new(save_dir),
            stage: Stage::Idle,
            in_flight: false,
            session_count: 0,
            status: "Ready".to_string(),
            error: None,
            pending_push: None,
            quota: QuotaGuard::new(),
            cleanup_prompt: None,
        }
    }

    pub fn store(&self) -> &ScreenshotStore {
        &self.store
    }

    /// Points the store at a new root, creating it if needed.
    pub fn change_save_dir(&mut self, dir: &Path) -> bool {
        if dir.as_os_str().is_empty() {
            self.show_error("Save location cannot be empty".to_string());
            return false;
        }
        if let Err(e) = std::fs::create_dir_all(dir) {
            self.show_error(format!("Could not use {}: {}", dir.display(), e));
            return false;
        }
        self.store = ScreenshotStore::new(dir);
        self.set_status(format!("Save location changed to: {}", dir.display()));
        true
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn session_count(&self) -> u32 {
        self.session_count
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn cleanup_prompt(&self) -> Option<u64> {
        self.cleanup_prompt
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        log::info!("Status: {}", self.status);
    }

    fn show_error(&mut self, message: String) {
        log::error!("{}", message);
        self.error = Some(message);
    }

    /// Ends the current flow and releases the in-flight guard.
    fn finish_flow(&mut self, status: impl Into<String>) {
        self.stage = Stage::Idle;
        self.in_flight = false;
        self.set_status(status);
    }

    /// Starts a capture. Refused while another capture is in flight.
    pub fn request_capture(&mut self, kind: CaptureKind, settings: &Settings, now: Instant) -> bool {
        if self.in_flight {
            log::info!("Ignoring {} capture: another capture is in progress", kind.label());
            return false;
        }
        self.in_flight = true;
        log::info!("Starting {} capture", kind.label());

        if settings.delay_seconds > 0 {
            self.stage = Stage::Countdown {
                kind,
                deadline: now + Duration::from_secs(settings.delay_seconds as u64),
            };
            self.set_status(format!("Capturing {} in {}s...", kind.label(), settings.delay_seconds));
        } else {
            self.stage = Stage::Settling {
                kind,
                deadline: now + SETTLE_DELAY,
            };
        }
        true
    }

    /// Whole seconds left on the countdown, rounded up.
    pub fn countdown_remaining(&self, now: Instant) -> Option<u32> {
        match self.stage {
            Stage::Countdown { deadline, .. } => {
                let left = deadline.saturating_duration_since(now);
                Some(left.as_millis().div_ceil(1000) as u32)
            }
            _ => None,
        }
    }

    pub fn cancel_countdown(&mut self) {
        if matches!(self.stage, Stage::Countdown { .. }) {
            self.finish_flow("Capture cancelled");
        }
    }

    /// Advances deadline-driven steps. Call every frame.
    pub fn tick(&mut self, settings: &Settings, now: Instant) {
        match self.stage {
            Stage::Countdown { kind, deadline } if now >= deadline => {
                self.stage = Stage::Settling {
                    kind,
                    deadline: now + SETTLE_DELAY,
                };
            }
            Stage::Settling { kind, deadline } if now >= deadline => {
                if let Err(e) = self.grab(kind, settings, now) {
                    self.fail_capture(e);
                }
            }
            _ => {}
        }

        if self.pending_push.is_some_and(|due| now >= due) {
            self.pending_push = None;
            if let Some(target) = settings.active_push_target() {
                self.push(target);
            }
        }
    }

    /// Soonest deadline the UI should wake up for.
    pub fn next_deadline(&self) -> Option<Instant> {
        let stage = match self.stage {
            Stage::Countdown { deadline, .. } | Stage::Settling { deadline, .. } => Some(deadline),
            _ => None,
        };
        match (stage, self.pending_push) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn fail_capture(&mut self, e: anyhow::Error) {
        self.show_error(format!("Capture failed: {:#}", e));
        self.finish_flow(format!("Capture failed: {}", e));
    }

    fn grab(&mut self, kind: CaptureKind, settings: &Settings, now: Instant) -> Result<()> {
        match kind {
            CaptureKind::FullScreen => {
                let area = capture::full_screen_area(&self.grabber, settings.capture_mode)?;
                let image = self.grabber.grab(area)?;
                self.captured(image, settings, now);
            }
            CaptureKind::Region => {
                let screen = self.grabber.virtual_screen()?;
                let frozen = self.grabber.grab(screen)?;
                let origin = Point::new(screen.left, screen.top);
                self.stage = Stage::Picking {
                    overlay: PickerOverlay::region(frozen, origin),
                    origin,
                };
                self.set_status("Drag to select a region (Esc to cancel)");
            }
            CaptureKind::Window => {
                let windows = self.grabber.windows()?;
                let screen = self.grabber.virtual_screen()?;
                let frozen = self.grabber.grab(screen)?;
                let origin = Point::new(screen.left, screen.top);
                self.stage = Stage::Picking {
                    overlay: PickerOverlay::window(frozen, origin, windows),
                    origin,
                };
                self.set_status("Click a window to capture (Esc to cancel)");
            }
        }
        Ok(())
    }

    pub fn overlay_mut(&mut self) -> Option<&mut PickerOverlay> {
        match &mut self.stage {
            Stage::Picking { overlay, .. } => Some(overlay),
            _ => None,
        }
    }

    pub fn editor_mut(&mut self) -> Option<&mut EditorView> {
        match &mut self.stage {
            Stage::Editing(view) => Some(view),
            _ => None,
        }
    }

    /// Handles the overlay's answer. `Pending` is a no-op.
    pub fn picker_result(&mut self, result: OverlayResult, settings: &Settings, now: Instant) {
        if matches!(result, OverlayResult::Pending) || !matches!(self.stage, Stage::Picking { .. }) {
            return;
        }
        let Stage::Picking { overlay, origin } = std::mem::replace(&mut self.stage, Stage::Idle) else {
            return;
        };
        let frozen = overlay.into_frozen();
        let bounds = Rect::new(0, 0, frozen.width() as i32, frozen.height() as i32);

        let area = match result {
            OverlayResult::Pending | OverlayResult::Cancelled => {
                self.finish_flow("Capture cancelled");
                return;
            }
            OverlayResult::Region(rect) => rect.intersect(&bounds),
            OverlayResult::Window(window) => {
                log::info!("Capturing window \"{}\"", window.title);
                window.rect.offset(-origin.x, -origin.y).intersect(&bounds)
            }
        };
        let Some(area) = area else {
            self.finish_flow("Capture cancelled: selection is off screen");
            return;
        };

        let image = imageops::crop_imm(
            &frozen,
            area.left as u32,
            area.top as u32,
            area.width() as u32,
            area.height() as u32,
        )
        .to_image();
        self.captured(image, settings, now);
    }

    fn captured(&mut self, image: RgbImage, settings: &Settings, now: Instant) {
        log::info!("Captured {}x{}", image.width(), image.height());
        if settings.edit_before_save {
            self.stage = Stage::Editing(EditorView::new(image));
            self.set_status("Edit screenshot (add annotations, then Save or Cancel)");
        } else {
            self.save_image(&image, settings, now);
            self.stage = Stage::Idle;
            self.in_flight = false;
        }
    }

    /// Handles the editor's answer. `Pending` is a no-op.
    pub fn editor_result(&mut self, verdict: EditorVerdict, settings: &Settings, now: Instant) {
        match verdict {
            EditorVerdict::Pending => {}
            EditorVerdict::Cancel => self.finish_flow("Screenshot discarded"),
            EditorVerdict::Save(image) => {
                self.save_image(&image, settings, now);
                self.stage = Stage::Idle;
                self.in_flight = false;
            }
        }
    }

    /// Writes the PNG, copies it to the clipboard and schedules auto-paste.
    /// Clipboard failures are logged and swallowed. Auto-paste fires at the
    /// first `tick` at least `PASTE_DELAY` after `now`.
    pub fn save_image(&mut self, image: &RgbImage, settings: &Settings, now: Instant) -> Option<PathBuf> {
        let folder = settings.active_folder.as_deref();
        let path = match self.store.save_png(folder, image, &Local::now()) {
            Ok(path) => path,
            Err(e) => {
                self.show_error(format!("Could not save screenshot: {}", e));
                self.set_status("Save failed");
                return None;
            }
        };

        let name = file_name(&path);
        self.session_count += 1;
        match self.clipboard.set_image(image) {
            Ok(()) => self.set_status(format!("Saved & copied to clipboard: {}", name)),
            Err(e) => {
                log::warn!("Clipboard copy failed: {:#}", e);
                self.set_status(format!("Saved: {}", name));
            }
        }

        if settings.auto_paste {
            self.pending_push = Some(now + PASTE_DELAY);
        }
        Some(path)
    }

    fn push(&mut self, target: &PushTarget) {
        let outcome = push_to_target(&mut self.driver, target);
        self.set_status(outcome.status_text());
    }

    /// Newest screenshots in the active folder. Also runs the quota check.
    pub fn refresh_gallery(&mut self, settings: &Settings) -> Vec<ScreenshotEntry> {
        let entries = match self.store.list(settings.active_folder.as_deref(), GALLERY_LIMIT) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Could not list screenshots: {}", e);
                Vec::new()
            }
        };

        match quota::disk_usage(&self.store) {
            Ok(used) => {
                if self.quota.should_prompt(used, settings.disk_quota_mb) {
                    self.cleanup_prompt = Some(used);
                }
            }
            Err(e) => log::warn!("Could not measure disk usage: {}", e),
        }
        entries
    }

    /// Answers the quota prompt. Returns the cleanup report when accepted.
    pub fn resolve_cleanup(&mut self, accept: bool, settings: &Settings) -> Option<CleanupReport> {
        self.cleanup_prompt = None;
        if !accept {
            return None;
        }
        let max_age = Duration::from_secs(settings.cleanup_age_days as u64 * 86_400);
        match quota::cleanup_older_than(&self.store, max_age, SystemTime::now()) {
            Ok(report) => {
                self.set_status(report.summary());
                Some(report)
            }
            Err(e) => {
                self.show_error(format!("Cleanup failed: {}", e));
                None
            }
        }
    }

    fn load(path: &Path) -> Result<RgbImage> {
        Ok(image::open(path)
            .with_context(|| format!("Could not open {}", path.display()))?
            .to_rgb8())
    }

    /// Re-opens a saved screenshot in the editor. Saving writes a new file.
    pub fn edit_file(&mut self, path: &Path) -> bool {
        if self.in_flight {
            self.set_status("Finish the current capture first");
            return false;
        }
        match Self::load(path) {
            Ok(image) => {
                self.in_flight = true;
                self.stage = Stage::Editing(EditorView::new(image));
                self.set_status("Edit screenshot (add annotations, then Save or Cancel)");
                true
            }
            Err(e) => {
                self.show_error(format!("Could not open image for editing: {:#}", e));
                false
            }
        }
    }

    pub fn copy_file(&mut self, path: &Path) -> bool {
        let result = Self::load(path).and_then(|image| self.clipboard.set_image(&image));
        match result {
            Ok(()) => {
                self.set_status(format!("Copied to clipboard: {}", file_name(path)));
                true
            }
            Err(e) => {
                self.show_error(format!("Could not copy image: {:#}", e));
                false
            }
        }
    }

    /// Copies a screenshot and pushes it to the active target right away.
    pub fn send_file(&mut self, path: &Path, settings: &Settings) {
        if !self.copy_file(path) {
            return;
        }
        match settings.active_push_target() {
            Some(target) => self.push(target),
            None => self.set_status("No push target configured - image in clipboard"),
        }
    }

    pub fn delete_file(&mut self, path: &Path) -> bool {
        match self.store.delete(path) {
            Ok(()) => {
                self.set_status(format!("Deleted: {}", file_name(path)));
                true
            }
            Err(e) => {
                self.show_error(format!("Could not delete: {}", e));
                false
            }
        }
    }

    pub fn move_file(&mut self, path: &Path, folder: Option<&str>) -> bool {
        match self.store.move_to(path, folder) {
            Ok(dest) => {
                self.set_status(format!(
                    "Moved {} to {}",
                    file_name(path),
                    folder.unwrap_or("(root)")
                ));
                log::debug!("New location: {}", dest.display());
                true
            }
            Err(e) => {
                self.show_error(format!("Could not move: {}", e));
                false
            }
        }
    }

    pub fn create_folder(&mut self, name: &str) -> Option<String> {
        match self.store.create_folder(name) {
            Ok(path) => {
                let created = file_name(&path);
                self.set_status(format!("Created folder: {}", created));
                Some(created)
            }
            Err(e) => {
                self.show_error(format!("Could not create folder: {}", e));
                None
            }
        }
    }

    pub fn rename_folder(&mut self, old: &str, new: &str) -> Option<String> {
        match self.store.rename_folder(old, new) {
            Ok(path) => {
                let renamed = file_name(&path);
                self.set_status(format!("Renamed folder {} to {}", old, renamed));
                Some(renamed)
            }
            Err(e) => {
                self.show_error(format!("Could not rename folder: {}", e));
                None
            }
        }
    }

    /// Opens a file or folder with the OS default handler.
    pub fn open_externally(&mut self, path: &Path) {
        if let Err(e) = open_path(path) {
            self.show_error(format!("Could not open {}: {:#}", path.display(), e));
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Spawns the platform's "open" command for `path`.
pub fn open_path(path: &Path) -> Result<()> {
    let program = if cfg!(windows) {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    std::process::Command::new(program)
        .arg(path)
        .spawn()
        .map_err(|e| anyhow!("{} failed: {}", program, e))?;
    Ok(())
}
