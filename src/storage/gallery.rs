//! The screenshot store: a root folder plus one level of named subfolders.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDateTime};
use image::{ImageFormat, RgbImage};

use super::{naming, StorageError};

/// Characters Windows does not allow in folder names.
const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// One screenshot file as listed in the gallery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScreenshotEntry {
    pub path: PathBuf,
    pub name: String,
    pub modified: SystemTime,
    pub size: u64,
}

impl ScreenshotEntry {
    /// Capture time from the file name.
    pub fn captured_at(&self) -> Option<NaiveDateTime> {
        naming::parse_timestamp(&self.name)
    }
}

#[derive(Clone, Debug)]
pub struct ScreenshotStore {
    root: PathBuf,
}

/// Validates a user-entered folder name and returns it trimmed.
pub fn validate_folder_name(name: &str) -> Result<String, StorageError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(FORBIDDEN_CHARS)
        || trimmed.chars().any(char::is_control)
    {
        return Err(StorageError::InvalidFolderName(name.to_string()));
    }
    Ok(trimmed.to_string())
}

impl ScreenshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for `folder`; `None` is the root itself.
    pub fn folder_path(&self, folder: Option<&str>) -> PathBuf {
        match folder {
            Some(name) => self.root.join(name),
            None => self.root.clone(),
        }
    }

    /// Names of the subfolders of the root, sorted. A missing root has none.
    pub fn folders(&self) -> Result<Vec<String>, StorageError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort_by_key(|n| n.to_lowercase());
        Ok(names)
    }

    fn entries_in(dir: &Path) -> Result<Vec<ScreenshotEntry>, StorageError> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !naming::is_screenshot_name(&name) {
                continue;
            }
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            entries.push(ScreenshotEntry {
                path: entry.path(),
                name,
                modified: meta.modified()?,
                size: meta.len(),
            });
        }
        Ok(entries)
    }

    /// Newest-first (by modification time) screenshots in `folder`, at most
    /// `limit` of them.
    pub fn list(&self, folder: Option<&str>, limit: usize) -> Result<Vec<ScreenshotEntry>, StorageError> {
        let mut entries = Self::entries_in(&self.folder_path(folder))?;
        entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.name.cmp(&a.name)));
        entries.truncate(limit);
        Ok(entries)
    }

    /// Every screenshot in the root and its subfolders, unsorted.
    pub fn all_screenshots(&self) -> Result<Vec<ScreenshotEntry>, StorageError> {
        let mut all = Self::entries_in(&self.root)?;
        for folder in self.folders()? {
            all.extend(Self::entries_in(&self.root.join(folder))?);
        }
        Ok(all)
    }

    pub fn create_folder(&self, name: &str) -> Result<PathBuf, StorageError> {
        let name = validate_folder_name(name)?;
        let path = self.root.join(&name);
        if path.exists() {
            return Err(StorageError::DestinationExists(path));
        }
        fs::create_dir_all(&path)?;
        log::info!("Created folder {}", path.display());
        Ok(path)
    }

    pub fn rename_folder(&self, old: &str, new: &str) -> Result<PathBuf, StorageError> {
        let from = self.root.join(validate_folder_name(old)?);
        let to = self.root.join(validate_folder_name(new)?);
        if !from.is_dir() {
            return Err(StorageError::NotFound(from));
        }
        if to.exists() {
            return Err(StorageError::DestinationExists(to));
        }
        fs::rename(&from, &to)?;
        log::info!("Renamed folder {} -> {}", from.display(), to.display());
        Ok(to)
    }

    /// Writes `image` as a PNG named after `time` into `folder`, creating the
    /// folder if needed.
    pub fn save_png(
        &self,
        folder: Option<&str>,
        image: &RgbImage,
        time: &DateTime<Local>,
    ) -> Result<PathBuf, StorageError> {
        let dir = self.folder_path(folder);
        fs::create_dir_all(&dir)?;
        let path = naming::unique_path(&dir, time);
        image.save_with_format(&path, ImageFormat::Png)?;
        log::info!("Screenshot saved: {}", path.display());
        Ok(path)
    }

    pub fn delete(&self, path: &Path) -> Result<(), StorageError> {
        if !path.is_file() {
            return Err(StorageError::NotFound(path.to_path_buf()));
        }
        fs::remove_file(path)?;
        log::info!("Deleted {}", path.display());
        Ok(())
    }

    /// Moves a screenshot into `folder` (root when `None`), keeping its name.
    pub fn move_to(&self, path: &Path, folder: Option<&str>) -> Result<PathBuf, StorageError> {
        if !path.is_file() {
            return Err(StorageError::NotFound(path.to_path_buf()));
        }
        let Some(file_name) = path.file_name() else {
            return Err(StorageError::NotFound(path.to_path_buf()));
        };
        let dir = self.folder_path(folder);
        if !dir.is_dir() {
            return Err(StorageError::NotFound(dir));
        }
        let dest = dir.join(file_name);
        if dest.exists() {
            return Err(StorageError::DestinationExists(dest));
        }
        fs::rename(path, &dest)?;
        log::info!("Moved {} -> {}", path.display(), dest.display());
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;
    use tempfile::tempdir;

    fn tiny() -> RgbImage {
        RgbImage::from_pixel(4, 3, image::Rgb([10, 20, 30]))
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
    }

    fn set_mtime(path: &Path, secs_ago: u64) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(secs_ago)).unwrap();
    }

    #[test]
    fn test_save_png_writes_decodable_file() {
        let dir = tempdir().unwrap();
        let store = ScreenshotStore::new(dir.path().join("shots"));

        let path = store.save_png(None, &tiny(), &at(9, 0, 0)).unwrap();
        assert_eq!(path.file_name().unwrap(), "screenshot_20240501_090000.png");
        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.as_raw(), tiny().as_raw());
    }

    #[test]
    fn test_save_png_same_second_keeps_both() {
        let dir = tempdir().unwrap();
        let store = ScreenshotStore::new(dir.path());
        let a = store.save_png(None, &tiny(), &at(9, 0, 0)).unwrap();
        let b = store.save_png(None, &tiny(), &at(9, 0, 0)).unwrap();
        assert_ne!(a, b);
        assert!(a.exists() && b.exists());
    }

    #[test]
    fn test_list_newest_first_and_limited() {
        let dir = tempdir().unwrap();
        let store = ScreenshotStore::new(dir.path());
        let old = store.save_png(None, &tiny(), &at(8, 0, 0)).unwrap();
        let mid = store.save_png(None, &tiny(), &at(9, 0, 0)).unwrap();
        let new = store.save_png(None, &tiny(), &at(10, 0, 0)).unwrap();
        set_mtime(&old, 300);
        set_mtime(&mid, 200);
        set_mtime(&new, 100);
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let listed = store.list(None, 2).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].path, new);
        assert_eq!(listed[1].path, mid);
        assert_eq!(listed[0].captured_at(), Some(at(10, 0, 0).naive_local()));
    }

    #[test]
    fn test_list_missing_root_is_empty() {
        let dir = tempdir().unwrap();
        let store = ScreenshotStore::new(dir.path().join("nope"));
        assert!(store.list(None, 20).unwrap().is_empty());
        assert!(store.folders().unwrap().is_empty());
    }

    #[test]
    fn test_folders_create_and_rename() {
        let dir = tempdir().unwrap();
        let store = ScreenshotStore::new(dir.path());

        store.create_folder(" bugs ").unwrap();
        store.create_folder("Designs").unwrap();
        assert_eq!(store.folders().unwrap(), vec!["bugs", "Designs"]);

        assert!(matches!(
            store.create_folder("bugs"),
            Err(StorageError::DestinationExists(_))
        ));
        store.rename_folder("bugs", "issues").unwrap();
        assert_eq!(store.folders().unwrap(), vec!["Designs", "issues"]);
        assert!(matches!(
            store.rename_folder("bugs", "x"),
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            store.rename_folder("issues", "Designs"),
            Err(StorageError::DestinationExists(_))
        ));
    }

    #[test]
    fn test_invalid_folder_names() {
        for bad in ["", "   ", ".", "..", "a/b", "a\\b", "what?", "x:y"] {
            assert!(
                matches!(validate_folder_name(bad), Err(StorageError::InvalidFolderName(_))),
                "{:?} should be rejected",
                bad
            );
        }
        assert_eq!(validate_folder_name("Release 1.2").unwrap(), "Release 1.2");
    }

    #[test]
    fn test_move_and_delete() {
        let dir = tempdir().unwrap();
        let store = ScreenshotStore::new(dir.path());
        store.create_folder("archive").unwrap();
        let path = store.save_png(None, &tiny(), &at(11, 0, 0)).unwrap();

        let moved = store.move_to(&path, Some("archive")).unwrap();
        assert!(!path.exists());
        assert_eq!(store.list(Some("archive"), 20).unwrap()[0].path, moved);
        assert_eq!(store.all_screenshots().unwrap().len(), 1);

        assert!(matches!(
            store.move_to(&path, Some("archive")),
            Err(StorageError::NotFound(_))
        ));

        store.delete(&moved).unwrap();
        assert!(!moved.exists());
        assert!(matches!(store.delete(&moved), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_move_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let store = ScreenshotStore::new(dir.path());
        store.create_folder("archive").unwrap();
        let a = store.save_png(None, &tiny(), &at(12, 0, 0)).unwrap();
        store.save_png(Some("archive"), &tiny(), &at(12, 0, 0)).unwrap();

        assert!(matches!(
            store.move_to(&a, Some("archive")),
            Err(StorageError::DestinationExists(_))
        ));
        assert!(a.exists());
    }
}
