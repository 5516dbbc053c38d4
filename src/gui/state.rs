//! GUI application state management.
//!
//! Tracks user input values, gallery contents and open dialogs.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::SystemTime;

use eframe::egui::{Color32, TextureHandle};

use crate::storage::ScreenshotEntry;

/// Something the user asked to do with a gallery thumbnail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GalleryAction {
    Open(PathBuf),
    Edit(PathBuf),
    Copy(PathBuf),
    Send(PathBuf),
    Move(PathBuf, Option<String>),
    /// Asks for confirmation first.
    Delete(PathBuf),
}

/// Folder name prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FolderPrompt {
    Create { name: String },
    Rename { old: String, name: String },
}

impl FolderPrompt {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Create { .. } => "New folder",
            Self::Rename { .. } => "Rename folder",
        }
    }

    pub fn name_mut(&mut self) -> &mut String {
        match self {
            Self::Create { name } | Self::Rename { name, .. } => name,
        }
    }
}

/// Colour of the status line.
pub fn status_color(in_flight: bool, has_error: bool) -> Color32 {
    if has_error {
        Color32::from_rgb(200, 0, 0)
    } else if in_flight {
        Color32::from_rgb(0, 120, 200)
    } else {
        Color32::from_rgb(0, 150, 0)
    }
}

/// Countdown digit colour: orange at 3, red below.
pub fn countdown_color(remaining: u32) -> Color32 {
    match remaining {
        0..=2 => Color32::from_rgb(220, 40, 40),
        3 => Color32::from_rgb(255, 150, 0),
        _ => Color32::WHITE,
    }
}

/// Thumbnail box for a configured width. Height is 3/4 of the width.
pub fn thumbnail_box(width: u32) -> [u32; 2] {
    [width, width * 3 / 4]
}

/// Card caption: capture time when the name carries one, else the name.
pub fn entry_caption(entry: &ScreenshotEntry) -> String {
    match entry.captured_at() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => entry.name.clone(),
    }
}

/// A loaded thumbnail plus the file mtime it was built from.
pub struct Thumbnail {
    pub modified: SystemTime,
    pub texture: TextureHandle,
}

/// GUI application state.
pub struct GuiState {
    /// Save location being edited; applied on demand.
    pub save_dir_input: String,
    /// Newest screenshots in the active folder.
    pub entries: Vec<ScreenshotEntry>,
    /// Subfolders of the save location.
    pub folders: Vec<String>,
    pub thumbnails: HashMap<PathBuf, Thumbnail>,
    /// Width the cached thumbnails were built at.
    pub thumbnail_width: u32,
    /// Gallery needs re-reading from disk.
    pub gallery_dirty: bool,
    pub folder_prompt: Option<FolderPrompt>,
    pub confirm_delete: Option<PathBuf>,
    pub show_settings: bool,
    /// Main window is minimized for a capture.
    pub hidden: bool,
    pub hotkey_warning: Option<String>,
}

impl GuiState {
    pub fn new(save_dir: &std::path::Path, thumbnail_width: u32) -> Self {
        Self {
            save_dir_input: save_dir.display().to_string(),
            entries: Vec::new(),
            folders: Vec::new(),
            thumbnails: HashMap::new(),
            thumbnail_width,
            gallery_dirty: true,
            folder_prompt: None,
            confirm_delete: None,
            show_settings: false,
            hidden: false,
            hotkey_warning: None,
        }
    }

    /// Drops cached thumbnails that no longer match an entry.
    pub fn prune_thumbnails(&mut self) {
        let entries = &self.entries;
        self.thumbnails.retain(|path, thumb| {
            entries
                .iter()
                .any(|e| &e.path == path && e.modified == thumb.modified)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_colors() {
        assert_eq!(countdown_color(10), Color32::WHITE);
        assert_eq!(countdown_color(3), Color32::from_rgb(255, 150, 0));
        assert_eq!(countdown_color(2), countdown_color(1));
        assert_ne!(countdown_color(2), countdown_color(3));
    }

    #[test]
    fn test_thumbnail_box_is_four_by_three() {
        assert_eq!(thumbnail_box(160), [160, 120]);
        assert_eq!(thumbnail_box(220), [220, 165]);
    }

    #[test]
    fn test_entry_caption() {
        let entry = ScreenshotEntry {
            path: PathBuf::from("screenshot_20240102_030405.png"),
            name: "screenshot_20240102_030405.png".into(),
            modified: SystemTime::UNIX_EPOCH,
            size: 10,
        };
        assert_eq!(entry_caption(&entry), "2024-01-02 03:04:05");
    }

    #[test]
    fn test_folder_prompt_name() {
        let mut prompt = FolderPrompt::Rename { old: "a".into(), name: "a".into() };
        prompt.name_mut().push('b');
        assert_eq!(prompt, FolderPrompt::Rename { old: "a".into(), name: "ab".into() });
        assert_eq!(prompt.title(), "Rename folder");
    }
}
