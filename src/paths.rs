//! Files SnapMark keeps beside its executable: `settings.json` and `logs/`.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static APP_PATHS: OnceLock<AppPaths> = OnceLock::new();

#[derive(Debug)]
pub struct AppPaths {
    base: PathBuf,
}

impl AppPaths {
    /// Paths rooted at the executable's directory, or `.` if it is unknown.
    pub fn current() -> &'static AppPaths {
        APP_PATHS.get_or_init(|| {
            let base = std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf))
                .unwrap_or_else(|| PathBuf::from("."));
            AppPaths::at(base)
        })
    }

    fn at(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base.join("logs")
    }

    pub fn crash_log(&self) -> PathBuf {
        self.logs_dir().join("crash.log")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base.join("settings.json")
    }

    /// Creates `logs/` if needed and returns it.
    pub fn create_logs_dir(&self) -> io::Result<PathBuf> {
        let dir = self.logs_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn fallback_screenshots_dir(&self) -> PathBuf {
        self.base.join("screenshots")
    }
}

/// `<Pictures>/Screenshots`, or `screenshots/` beside the executable on
/// platforms without a pictures folder.
pub fn default_screenshots_dir() -> PathBuf {
    dirs::picture_dir()
        .map(|p| p.join("Screenshots"))
        .unwrap_or_else(|| AppPaths::current().fallback_screenshots_dir())
}
