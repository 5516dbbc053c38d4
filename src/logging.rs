//! env_logger backend for the `log` facade.
//!
//! Every record becomes one `[HH:MM:SS.mmm] LEVEL message` line printed to
//! stdout and appended to `logs/snapmark.log`. The crash log written by the
//! panic hook lives next to it.

use chrono::Local;
use env_logger::{Builder, Env, Target, WriteStyle};
use log::Level;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

const LOG_FILE_NAME: &str = "snapmark.log";
const LEVEL_ENV: &str = "SNAPMARK_LOG";

/// Copies every write to stdout and, when open, the log file.
struct TeeWriter {
    file: Option<File>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // No console under the windows subsystem
        let _ = io::stdout().write_all(buf);
        if let Some(file) = self.file.as_mut() {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = io::stdout().flush();
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

fn format_line(level: Level, msg: &str) -> String {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    format!("[{}] {:<5} {}\n", timestamp, level, msg)
}

/// Installs the logger. `SNAPMARK_LOG` takes env_logger filter syntax and
/// defaults to `info`. The log file is optional: if it cannot be opened the
/// logger still prints to the console.
pub fn init(log_dir: &Path) -> Result<(), log::SetLoggerError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(LOG_FILE_NAME))
        .ok();
    Builder::from_env(Env::default().filter_or(LEVEL_ENV, "info"))
        .format(|buf, record| {
            buf.write_all(format_line(record.level(), &record.args().to_string()).as_bytes())
        })
        .write_style(WriteStyle::Never)
        .target(Target::Pipe(Box::new(TeeWriter { file })))
        .try_init()
}

/// Appends an entry to the crash log. Used by the panic hook and by `main`
/// when it is about to exit with an error, so it must not depend on the
/// logger being installed.
pub fn write_crash_entry(crash_log: &Path, headline: &str, detail: &str) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let entry = format!("[{}] {}\n{}\n\n", timestamp, headline, detail);
    eprint!("{}", entry);
    if let Some(parent) = crash_log.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(crash_log) {
        let _ = file.write_all(entry.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_format_line_has_level_and_message() {
        let line = format_line(Level::Warn, "clipboard busy");
        assert!(line.starts_with('['));
        assert!(line.contains("WARN"));
        assert!(line.ends_with("clipboard busy\n"));
    }

    #[test]
    fn test_tee_writer_appends_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        let file = OpenOptions::new().create(true).append(true).open(&path).unwrap();

        let mut tee = TeeWriter { file: Some(file) };
        tee.write_all(format_line(Level::Info, "first").as_bytes()).unwrap();
        tee.write_all(format_line(Level::Error, "second").as_bytes()).unwrap();
        tee.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().nth(1).unwrap().contains("ERROR second"));
    }

    #[test]
    fn test_tee_writer_without_file_still_accepts() {
        let mut tee = TeeWriter { file: None };
        assert_eq!(tee.write(b"console only\n").unwrap(), 13);
    }

    #[test]
    fn test_crash_entries_accumulate() {
        let dir = tempdir().unwrap();
        let crash_log = dir.path().join("logs").join("crash.log");

        write_crash_entry(&crash_log, "PANIC first", "trace 1");
        write_crash_entry(&crash_log, "PANIC second", "trace 2");

        let content = std::fs::read_to_string(&crash_log).unwrap();
        assert!(content.contains("PANIC first"));
        assert!(content.contains("trace 2"));
        assert_eq!(content.matches("PANIC").count(), 2);
    }
}
