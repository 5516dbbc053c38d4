//! SnapMark
//!
//! A desktop screenshot tool: global hotkeys for region, full-screen and
//! window captures, a quick annotation editor, and delivery to the
//! clipboard or straight into another application's window.

// Hide console window on Windows for GUI mode
#![cfg_attr(windows, windows_subsystem = "windows")]

mod capture;
mod delivery;
mod editor;
mod geometry;
mod gui;
mod hotkeys;
mod logging;
mod paths;
mod picker;
mod settings;
mod storage;
mod workflow;

use std::any::Any;
use std::backtrace::Backtrace;

use anyhow::{anyhow, Result};

use paths::AppPaths;
use settings::Settings;

/// Text of a panic payload; `panic!` produces either `&str` or `String`.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("Unknown panic")
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();
        // Works even if the logger was never installed
        logging::write_crash_entry(
            &AppPaths::current().crash_log(),
            &format!("[PANIC]{} {}", location, panic_message(panic_info.payload())),
            &Backtrace::force_capture().to_string(),
        );
    }));
}

fn run() -> Result<()> {
    let paths = AppPaths::current();
    let logs_dir = paths.create_logs_dir()?;

    if let Err(e) = logging::init(&logs_dir) {
        eprintln!("Logger already installed: {}", e);
    }
    log::info!("SnapMark {} starting", env!("CARGO_PKG_VERSION"));

    let settings_path = paths.settings_file();
    let settings = Settings::load_or_default(&settings_path);
    log::info!("Saving screenshots under {}", settings.save_dir.display());

    log::info!("Starting GUI application...");
    match gui::run_gui(settings, settings_path) {
        Ok(()) => {
            log::info!("GUI application exited normally");
            Ok(())
        }
        Err(e) => {
            log::error!("GUI error: {}", e);
            Err(anyhow!("GUI error: {}", e))
        }
    }
}

fn main() -> Result<()> {
    install_panic_hook();

    let result = run();
    if let Err(e) = &result {
        logging::write_crash_entry(
            &AppPaths::current().crash_log(),
            "[FATAL] SnapMark exited with an error",
            &format!("{:?}", e),
        );
    }
    log::logger().flush();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_reads_both_payload_kinds() {
        let literal: Box<dyn Any + Send> = Box::new("index out of bounds");
        let owned: Box<dyn Any + Send> = Box::new(format!("bad rect {}", 3));
        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(&*literal), "index out of bounds");
        assert_eq!(panic_message(&*owned), "bad rect 3");
        assert_eq!(panic_message(&*other), "Unknown panic");
    }
}
