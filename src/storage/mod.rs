//! Screenshot files on disk.
//!
//! This module provides:
//! - Timestamped file naming (`naming`)
//! - The screenshot store: listing, folders, save/move/delete (`gallery`)
//! - Disk quota checks and age-based cleanup (`quota`)

pub mod gallery;
pub mod naming;
pub mod quota;

use std::path::PathBuf;

use thiserror::Error;

pub use gallery::{ScreenshotEntry, ScreenshotStore};
pub use quota::{CleanupReport, QuotaGuard};

/// Failures surfaced to the user as error dialogs.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid folder name: {0:?}")]
    InvalidFolderName(String),

    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not encode image: {0}")]
    Image(#[from] image::ImageError),
}
