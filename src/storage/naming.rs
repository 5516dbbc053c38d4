//! Screenshot file naming.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Local, NaiveDateTime};
use regex::Regex;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `screenshot_YYYYMMDD_HHMMSS.png`, with an optional `_N` collision suffix.
const NAME_PATTERN: &str = r"^screenshot_(\d{8}_\d{6})(?:_(\d+))?\.png$";

fn name_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(NAME_PATTERN).ok()).as_ref()
}

/// File name for a capture taken at `time`.
pub fn file_name_for(time: &DateTime<Local>) -> String {
    format!("screenshot_{}.png", time.format(TIMESTAMP_FORMAT))
}

/// A path in `dir` for a capture taken at `time` that does not exist yet.
/// Same-second collisions get `_2`, `_3`, ... appended to the stem.
pub fn unique_path(dir: &Path, time: &DateTime<Local>) -> PathBuf {
    let first = dir.join(file_name_for(time));
    if !first.exists() {
        return first;
    }
    let mut n = 2u32;
    loop {
        let candidate = dir.join(format!(
            "screenshot_{}_{}.png",
            time.format(TIMESTAMP_FORMAT),
            n
        ));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

pub fn is_screenshot_name(name: &str) -> bool {
    name_regex().is_some_and(|re| re.is_match(name))
}

/// Capture time encoded in a screenshot file name.
pub fn parse_timestamp(name: &str) -> Option<NaiveDateTime> {
    let caps = name_regex()?.captures(name)?;
    NaiveDateTime::parse_from_str(caps.get(1)?.as_str(), TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn sample_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_file_name_format() {
        assert_eq!(file_name_for(&sample_time()), "screenshot_20240309_140507.png");
    }

    #[test]
    fn test_unique_path_adds_suffix_on_collision() {
        let dir = tempdir().unwrap();
        let time = sample_time();

        let first = unique_path(dir.path(), &time);
        assert_eq!(first.file_name().unwrap(), "screenshot_20240309_140507.png");
        std::fs::write(&first, b"x").unwrap();

        let second = unique_path(dir.path(), &time);
        assert_eq!(second.file_name().unwrap(), "screenshot_20240309_140507_2.png");
        std::fs::write(&second, b"x").unwrap();

        let third = unique_path(dir.path(), &time);
        assert_eq!(third.file_name().unwrap(), "screenshot_20240309_140507_3.png");
    }

    #[test]
    fn test_recognizes_screenshot_names() {
        assert!(is_screenshot_name("screenshot_20240309_140507.png"));
        assert!(is_screenshot_name("screenshot_20240309_140507_12.png"));
        assert!(!is_screenshot_name("screenshot_2024.png"));
        assert!(!is_screenshot_name("holiday.png"));
        assert!(!is_screenshot_name("screenshot_20240309_140507.jpg"));
    }

    #[test]
    fn test_parse_timestamp() {
        let parsed = parse_timestamp("screenshot_20240309_140507_2.png").unwrap();
        assert_eq!(parsed, sample_time().naive_local());
        assert!(parse_timestamp("screenshot_20241399_999999.png").is_none());
    }
}
