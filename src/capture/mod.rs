//! Screen capture backends.
//!
//! This module provides:
//! - Screen and monitor geometry (`screen`)
//! - Top-level window enumeration and matching (`window`)
//! - The `ScreenGrabber` seam the capture workflow talks to

pub mod screen;
pub mod window;

use anyhow::{anyhow, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

pub use window::WindowInfo;

/// Which part of the desktop a full-screen capture covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenScope {
    /// Bounding box of every monitor.
    #[default]
    AllMonitors,
    PrimaryMonitor,
    MonitorUnderCursor,
}

impl ScreenScope {
    pub const ALL: [ScreenScope; 3] = [
        ScreenScope::AllMonitors,
        ScreenScope::PrimaryMonitor,
        ScreenScope::MonitorUnderCursor,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ScreenScope::AllMonitors => "All monitors",
            ScreenScope::PrimaryMonitor => "Primary monitor",
            ScreenScope::MonitorUnderCursor => "Monitor under cursor",
        }
    }
}

/// A physical monitor in virtual-screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Monitor {
    pub rect: Rect,
    pub primary: bool,
}

/// OS capture backend used by the workflow. The desktop implementation talks
/// to GDI; tests substitute a fake.
pub trait ScreenGrabber {
    /// Bounding rectangle of all monitors in screen coordinates.
    fn virtual_screen(&self) -> Result<Rect>;

    fn monitors(&self) -> Result<Vec<Monitor>>;

    fn cursor_position(&self) -> Result<Point>;

    /// Visible, non-minimized top-level windows in z-order (topmost first),
    /// excluding this process's own windows.
    fn windows(&self) -> Result<Vec<WindowInfo>>;

    /// Grabs the pixels of `area` (screen coordinates).
    fn grab(&mut self, area: Rect) -> Result<RgbImage>;
}

/// Resolves the rectangle a full-screen capture should grab.
pub fn full_screen_area<G: ScreenGrabber + ?Sized>(grabber: &G, scope: ScreenScope) -> Result<Rect> {
    match scope {
        ScreenScope::AllMonitors => grabber.virtual_screen(),
        ScreenScope::PrimaryMonitor => {
            let monitors = grabber.monitors()?;
            monitors
                .iter()
                .find(|m| m.primary)
                .or_else(|| monitors.first())
                .map(|m| m.rect)
                .ok_or_else(|| anyhow!("No monitors found"))
        }
        ScreenScope::MonitorUnderCursor => {
            let cursor = grabber.cursor_position()?;
            let monitors = grabber.monitors()?;
            monitors
                .iter()
                .find(|m| m.rect.contains(cursor))
                .or_else(|| monitors.iter().find(|m| m.primary))
                .map(|m| m.rect)
                .ok_or_else(|| anyhow!("No monitor under cursor at ({}, {})", cursor.x, cursor.y))
        }
    }
}

/// GDI-backed grabber for the real desktop.
#[derive(Debug, Default)]
pub struct DesktopGrabber;

impl ScreenGrabber for DesktopGrabber {
    fn virtual_screen(&self) -> Result<Rect> {
        screen::virtual_screen_rect()
    }

    fn monitors(&self) -> Result<Vec<Monitor>> {
        screen::monitors()
    }

    fn cursor_position(&self) -> Result<Point> {
        screen::cursor_position()
    }

    fn windows(&self) -> Result<Vec<WindowInfo>> {
        window::list_top_level_windows(window::EnumOptions::PICKING)
    }

    fn grab(&mut self, area: Rect) -> Result<RgbImage> {
        screen::grab_rect(area)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeGrabber;
    use super::*;

    #[test]
    fn test_full_screen_area_all_monitors() {
        let grabber = FakeGrabber::default();
        let area = full_screen_area(&grabber, ScreenScope::AllMonitors).unwrap();
        assert_eq!(area, Rect::new(0, 0, 320, 120));
    }

    #[test]
    fn test_full_screen_area_primary() {
        let grabber = FakeGrabber::default();
        let area = full_screen_area(&grabber, ScreenScope::PrimaryMonitor).unwrap();
        assert_eq!(area, Rect::new(0, 0, 160, 120));
    }

    #[test]
    fn test_full_screen_area_under_cursor() {
        let grabber = FakeGrabber {
            cursor: Point::new(200, 50),
            ..Default::default()
        };
        let area = full_screen_area(&grabber, ScreenScope::MonitorUnderCursor).unwrap();
        assert_eq!(area, Rect::new(160, 0, 320, 120));
    }
}
