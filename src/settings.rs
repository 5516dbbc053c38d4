//! User settings persisted as `settings.json` next to the executable.
//!
//! Every field has a serde default so older or partial files still load.
//! A missing or unreadable file falls back to defaults with a warning.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::capture::ScreenScope;
use crate::delivery::PushTarget;
use crate::storage::gallery::validate_folder_name;

/// Countdown lengths offered in the UI, in seconds.
pub const DELAY_CHOICES: [u32; 4] = [0, 3, 5, 10];

/// Gallery thumbnail widths offered in the settings dialog.
pub const THUMBNAIL_SIZES: [u32; 3] = [120, 160, 220];

/// Number of screenshots shown in the gallery.
pub const GALLERY_LIMIT: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root folder screenshots are saved under.
    pub save_dir: PathBuf,
    /// Subfolder new captures go to; `None` is the root.
    pub active_folder: Option<String>,
    /// What a full-screen capture covers.
    pub capture_mode: ScreenScope,
    pub delay_seconds: u32,
    /// Open the editor before saving.
    pub edit_before_save: bool,
    pub auto_paste: bool,
    /// Index into `push_targets`.
    pub active_target: usize,
    pub push_targets: Vec<PushTarget>,
    /// Thumbnail width in points; height is 3/4 of it.
    pub thumbnail_size: u32,
    /// Cleanup prompt threshold in MB; 0 disables it.
    pub disk_quota_mb: u64,
    /// Files older than this are offered for cleanup.
    pub cleanup_age_days: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            save_dir: crate::paths::default_screenshots_dir(),
            active_folder: None,
            capture_mode: ScreenScope::AllMonitors,
            delay_seconds: 0,
            edit_before_save: true,
            auto_paste: false,
            active_target: 0,
            push_targets: vec![PushTarget::vscode_claude()],
            thumbnail_size: 160,
            disk_quota_mb: 500,
            cleanup_age_days: 30,
        }
    }
}

impl Settings {
    /// The push target auto-paste and Send use, if any are configured.
    pub fn active_push_target(&self) -> Option<&PushTarget> {
        self.push_targets
            .get(self.active_target)
            .or_else(|| self.push_targets.first())
    }

    /// Loads settings from `path`, returning defaults if it is missing or
    /// invalid.
    pub fn load_or_default(path: &Path) -> Self {
        log::info!("Looking for settings at: {}", path.display());

        if !path.exists() {
            log::info!("settings.json not found. Using defaults.");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Settings>(&contents) {
                Ok(mut settings) => {
                    settings.normalize();
                    log::info!("Settings loaded from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Failed to parse settings.json: {}. Using defaults.", e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read settings.json: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        log::debug!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Pulls out-of-range values back to something the UI can show.
    fn normalize(&mut self) {
        if !DELAY_CHOICES.contains(&self.delay_seconds) {
            self.delay_seconds = DELAY_CHOICES
                .iter()
                .copied()
                .min_by_key(|d| d.abs_diff(self.delay_seconds))
                .unwrap_or(0);
        }
        if self.active_target >= self.push_targets.len() {
            self.active_target = 0;
        }
        if self.thumbnail_size == 0 {
            self.thumbnail_size = Settings::default().thumbnail_size;
        }
        if let Some(folder) = self.active_folder.take() {
            match validate_folder_name(&folder) {
                Ok(name) => self.active_folder = Some(name),
                Err(e) => log::warn!("Settings: Ignoring active folder: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load_or_default(&dir.path().join("settings.json"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.active_push_target().unwrap().name, "VSCode Claude");
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"delay_seconds": 5, "auto_paste": true}"#).unwrap();

        let settings = Settings::load_or_default(&path);
        assert_eq!(settings.delay_seconds, 5);
        assert!(settings.auto_paste);
        assert_eq!(settings.thumbnail_size, 160);
        assert_eq!(settings.push_targets.len(), 1);
    }

    #[test]
    fn test_invalid_json_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_or_default(&path), Settings::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            save_dir: dir.path().join("shots"),
            active_folder: Some("bugs".into()),
            capture_mode: ScreenScope::MonitorUnderCursor,
            delay_seconds: 10,
            push_targets: vec![
                PushTarget::vscode_claude(),
                PushTarget {
                    name: "Slack".into(),
                    title_contains: "Slack".into(),
                    click: None,
                },
            ],
            active_target: 1,
            ..Default::default()
        };
        settings.save(&path).unwrap();

        let loaded = Settings::load_or_default(&path);
        assert_eq!(loaded, settings);
        assert_eq!(loaded.active_push_target().unwrap().name, "Slack");
    }

    #[test]
    fn test_out_of_range_values_are_normalized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"delay_seconds": 4, "active_target": 9, "thumbnail_size": 0, "active_folder": " "}"#,
        )
        .unwrap();

        let settings = Settings::load_or_default(&path);
        assert!(DELAY_CHOICES.contains(&settings.delay_seconds));
        assert_eq!(settings.active_target, 0);
        assert_eq!(settings.thumbnail_size, 160);
        assert_eq!(settings.active_folder, None);
    }

    #[test]
    fn test_active_folder_cannot_leave_save_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        for escape in ["..", "/etc", "C:\\Windows", "a/../../b"] {
            let json = serde_json::json!({ "active_folder": escape }).to_string();
            fs::write(&path, json).unwrap();
            let settings = Settings::load_or_default(&path);
            assert_eq!(settings.active_folder, None, "{escape}");
        }

        fs::write(&path, r#"{"active_folder": " bugs "}"#).unwrap();
        let settings = Settings::load_or_default(&path);
        assert_eq!(settings.active_folder.as_deref(), Some("bugs"));
    }
}
