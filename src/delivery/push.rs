//! Push delivery: focus a target window, optionally click into it, paste.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::capture::window::{self, find_by_title, EnumOptions, WindowInfo};
use crate::geometry::{Point, Rect};

use super::input;

/// Reference point a click offset is measured from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickAnchor {
    /// `dx`/`dy` right of and below the window's top-left corner.
    #[default]
    TopLeft,
    /// `dx` right of the horizontal centre, `dy` above the bottom edge.
    BottomCenter,
}

impl ClickAnchor {
    pub const ALL: [ClickAnchor; 2] = [ClickAnchor::TopLeft, ClickAnchor::BottomCenter];

    pub fn label(&self) -> &'static str {
        match self {
            ClickAnchor::TopLeft => "Top-left",
            ClickAnchor::BottomCenter => "Bottom centre",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickOffset {
    #[serde(default)]
    pub anchor: ClickAnchor,
    #[serde(default)]
    pub dx: i32,
    #[serde(default)]
    pub dy: i32,
}

impl ClickOffset {
    /// Screen position to click for a window at `rect`.
    pub fn resolve(&self, rect: Rect) -> Point {
        match self.anchor {
            ClickAnchor::TopLeft => Point::new(rect.left + self.dx, rect.top + self.dy),
            ClickAnchor::BottomCenter => {
                Point::new(rect.left + rect.width() / 2 + self.dx, rect.bottom - self.dy)
            }
        }
    }
}

/// A named paste destination, matched by window title substring.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushTarget {
    pub name: String,
    pub title_contains: String,
    #[serde(default)]
    pub click: Option<ClickOffset>,
}

impl PushTarget {
    /// Pastes into the VS Code Claude chat input near the bottom of the window.
    pub fn vscode_claude() -> Self {
        Self {
            name: "VSCode Claude".to_string(),
            title_contains: "Visual Studio Code".to_string(),
            click: Some(ClickOffset {
                anchor: ClickAnchor::BottomCenter,
                dx: 0,
                dy: 60,
            }),
        }
    }
}

/// How a push attempt ended. None of these are fatal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Pasted { target: String },
    TargetNotFound { target: String },
    Failed { target: String, reason: String },
}

impl DeliveryOutcome {
    pub fn status_text(&self) -> String {
        match self {
            Self::Pasted { target } => format!("Pasted to {}!", target),
            Self::TargetNotFound { target } => format!("{} not found - image in clipboard", target),
            Self::Failed { reason, .. } => format!("Auto-paste failed: {}", reason),
        }
    }
}

/// OS operations push delivery needs. The desktop implementation drives
/// Win32; tests record calls instead.
pub trait WindowDriver {
    /// Visible top-level windows (minimized included) in enumeration order.
    fn windows(&self) -> Result<Vec<WindowInfo>>;

    /// Brings the window to the foreground and waits for it to settle.
    fn activate(&mut self, window: &WindowInfo) -> Result<()>;

    /// Current rectangle of a window, read after activation.
    fn window_rect(&self, window: &WindowInfo) -> Result<Rect>;

    fn click(&mut self, p: Point) -> Result<()>;

    fn paste(&mut self) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct DesktopDriver;

impl WindowDriver for DesktopDriver {
    fn windows(&self) -> Result<Vec<WindowInfo>> {
        window::list_top_level_windows(EnumOptions::DELIVERY)
    }

    fn activate(&mut self, window: &WindowInfo) -> Result<()> {
        input::activate_window(window.handle)
    }

    fn window_rect(&self, window: &WindowInfo) -> Result<Rect> {
        window::window_rect(window.handle)
    }

    fn click(&mut self, p: Point) -> Result<()> {
        input::click_at(p)
    }

    fn paste(&mut self) -> Result<()> {
        input::send_paste()
    }
}

/// Finds the first window matching `target`, focuses it, clicks the
/// configured offset if any, and sends a paste. No retries.
pub fn push_to_target<D: WindowDriver + ?Sized>(driver: &mut D, target: &PushTarget) -> DeliveryOutcome {
    let failed = |e: anyhow::Error| {
        log::warn!("Push to {} failed: {:#}", target.name, e);
        DeliveryOutcome::Failed {
            target: target.name.clone(),
            reason: e.to_string(),
        }
    };

    let windows = match driver.windows() {
        Ok(w) => w,
        Err(e) => return failed(e),
    };
    let Some(found) = find_by_title(&windows, &target.title_contains) else {
        log::info!(
            "No window title contains {:?} for target {}",
            target.title_contains,
            target.name
        );
        return DeliveryOutcome::TargetNotFound {
            target: target.name.clone(),
        };
    };
    log::info!("Pushing to \"{}\" ({})", found.title, target.name);

    if let Err(e) = driver.activate(found) {
        return failed(e);
    }
    if let Some(offset) = target.click {
        let rect = match driver.window_rect(found) {
            Ok(r) => r,
            Err(e) => return failed(e),
        };
        if let Err(e) = driver.click(offset.resolve(rect)) {
            return failed(e);
        }
    }
    if let Err(e) = driver.paste() {
        return failed(e);
    }

    DeliveryOutcome::Pasted {
        target: target.name.clone(),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Call, RecordingDriver};
    use super::*;

    fn code_window() -> WindowInfo {
        WindowInfo {
            handle: 42,
            title: "main.rs - snapmark - Visual Studio Code".to_string(),
            rect: Rect::new(100, 50, 1100, 850),
        }
    }

    #[test]
    fn test_click_offset_anchors() {
        let rect = Rect::new(100, 50, 1100, 850);
        let bottom = ClickOffset { anchor: ClickAnchor::BottomCenter, dx: 0, dy: 60 };
        assert_eq!(bottom.resolve(rect), Point::new(600, 790));
        let top_left = ClickOffset { anchor: ClickAnchor::TopLeft, dx: 15, dy: 30 };
        assert_eq!(top_left.resolve(rect), Point::new(115, 80));
    }

    #[test]
    fn test_push_activates_clicks_and_pastes() {
        let mut driver = RecordingDriver {
            windows: vec![
                WindowInfo { handle: 1, title: "Inbox".into(), rect: Rect::new(0, 0, 10, 10) },
                code_window(),
            ],
            ..Default::default()
        };
        let outcome = push_to_target(&mut driver, &PushTarget::vscode_claude());

        assert_eq!(outcome, DeliveryOutcome::Pasted { target: "VSCode Claude".into() });
        assert_eq!(
            driver.calls,
            vec![Call::Activate(42), Call::Click(Point::new(600, 790)), Call::Paste]
        );
    }

    #[test]
    fn test_push_without_click_offset_only_pastes() {
        let mut driver = RecordingDriver { windows: vec![code_window()], ..Default::default() };
        let target = PushTarget {
            name: "Code".into(),
            title_contains: "Visual Studio".into(),
            click: None,
        };
        push_to_target(&mut driver, &target);
        assert_eq!(driver.calls, vec![Call::Activate(42), Call::Paste]);
    }

    #[test]
    fn test_missing_target_is_soft_failure() {
        let mut driver = RecordingDriver::default();
        let outcome = push_to_target(&mut driver, &PushTarget::vscode_claude());
        assert_eq!(outcome.status_text(), "VSCode Claude not found - image in clipboard");
        assert!(driver.calls.is_empty());
    }

    #[test]
    fn test_activation_failure_stops_before_paste() {
        let mut driver = RecordingDriver {
            windows: vec![code_window()],
            fail_activate: true,
            ..Default::default()
        };
        let outcome = push_to_target(&mut driver, &PushTarget::vscode_claude());
        assert!(matches!(outcome, DeliveryOutcome::Failed { .. }));
        assert!(driver.calls.is_empty());
    }

    #[test]
    fn test_push_target_serde_defaults() {
        let target: PushTarget =
            serde_json::from_str(r#"{"name":"Slack","title_contains":"Slack"}"#).unwrap();
        assert_eq!(target.click, None);
        let offset: ClickOffset = serde_json::from_str(r#"{"anchor":"bottom_center"}"#).unwrap();
        assert_eq!(offset, ClickOffset { anchor: ClickAnchor::BottomCenter, dx: 0, dy: 0 });
    }
}
