//! Disk quota checks and age-based cleanup.

use std::time::{Duration, SystemTime};

use super::{ScreenshotStore, StorageError};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Total size of every screenshot under the store root.
pub fn disk_usage(store: &ScreenshotStore) -> Result<u64, StorageError> {
    Ok(store.all_screenshots()?.iter().map(|e| e.size).sum())
}

/// True once `used` reaches 90% of `limit`. A zero limit disables the check.
pub fn is_near_limit(used: u64, limit: u64) -> bool {
    limit > 0 && (used as u128) * 10 >= (limit as u128) * 9
}

/// Decides when to offer a cleanup. The prompt is shown at most once per
/// session, however many refreshes cross the threshold.
#[derive(Debug, Default)]
pub struct QuotaGuard {
    prompted: bool,
}

impl QuotaGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the caller should prompt now.
    pub fn should_prompt(&mut self, used: u64, limit_mb: u64) -> bool {
        if self.prompted || !is_near_limit(used, limit_mb.saturating_mul(BYTES_PER_MB)) {
            return false;
        }
        self.prompted = true;
        log::warn!(
            "Screenshot folder uses {:.1} MB of {} MB quota",
            used as f64 / BYTES_PER_MB as f64,
            limit_mb
        );
        true
    }
}

/// Result of a cleanup pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub count: usize,
    pub bytes: u64,
}

impl CleanupReport {
    pub fn summary(&self) -> String {
        format!(
            "Deleted {} screenshots, freed {:.1} MB",
            self.count,
            self.bytes as f64 / BYTES_PER_MB as f64
        )
    }
}

/// Deletes screenshots last modified more than `max_age` before `now`.
/// Files that cannot be removed are logged and skipped.
pub fn cleanup_older_than(
    store: &ScreenshotStore,
    max_age: Duration,
    now: SystemTime,
) -> Result<CleanupReport, StorageError> {
    let cutoff = now.checked_sub(max_age).unwrap_or(SystemTime::UNIX_EPOCH);
    let mut report = CleanupReport::default();
    for entry in store.all_screenshots()? {
        if entry.modified >= cutoff {
            continue;
        }
        match store.delete(&entry.path) {
            Ok(()) => {
                report.count += 1;
                report.bytes += entry.size;
            }
            Err(e) => log::warn!("Cleanup could not delete {}: {}", entry.path.display(), e),
        }
    }
    log::info!("Cleanup: {}", report.summary());
    Ok(report)
}
