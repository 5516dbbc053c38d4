//! Click-to-select window logic.

use crate::capture::window::{window_at, WindowInfo};
use crate::geometry::Point;

use super::PickerOutcome;

/// Resolves a click on the frozen screenshot to the topmost window under it.
///
/// `windows` is the z-ordered list captured before the overlay opened, in
/// screen coordinates; `origin` is the screen position of the screenshot's
/// top-left pixel. Only the first click or cancel is honoured.
#[derive(Debug)]
pub struct WindowPicker {
    windows: Vec<WindowInfo>,
    origin: Point,
    resolved: bool,
}

impl WindowPicker {
    pub fn new(windows: Vec<WindowInfo>, origin: Point) -> Self {
        Self {
            windows,
            origin,
            resolved: false,
        }
    }

    fn to_screen(&self, p: Point) -> Point {
        Point::new(p.x + self.origin.x, p.y + self.origin.y)
    }

    /// Window under an image-space point, for hover highlighting.
    pub fn hover(&self, p: Point) -> Option<&WindowInfo> {
        if self.resolved {
            return None;
        }
        window_at(&self.windows, self.to_screen(p))
    }

    /// Clicking empty desktop cancels.
    pub fn click(&mut self, p: Point) -> PickerOutcome<WindowInfo> {
        if self.resolved {
            return PickerOutcome::Pending;
        }
        self.resolved = true;
        match window_at(&self.windows, self.to_screen(p)) {
            Some(w) => {
                log::info!("Picked window \"{}\"", w.title);
                PickerOutcome::Selected(w.clone())
            }
            None => PickerOutcome::Cancelled,
        }
    }

    pub fn cancel(&mut self) -> PickerOutcome<WindowInfo> {
        if self.resolved {
            return PickerOutcome::Pending;
        }
        self.resolved = true;
        PickerOutcome::Cancelled
    }

    pub fn origin(&self) -> Point {
        self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn picker() -> WindowPicker {
        // Virtual screen starts at x=-100 (a monitor left of the primary)
        WindowPicker::new(
            vec![
                WindowInfo {
                    handle: 7,
                    title: "Calculator".into(),
                    rect: Rect::new(-50, 0, 50, 100),
                },
                WindowInfo {
                    handle: 9,
                    title: "Editor".into(),
                    rect: Rect::new(-100, 0, 400, 300),
                },
            ],
            Point::new(-100, 0),
        )
    }

    #[test]
    fn test_click_translates_image_to_screen_space() {
        let mut p = picker();
        // Image (60, 10) is screen (-40, 10): inside Calculator
        match p.click(Point::new(60, 10)) {
            PickerOutcome::Selected(w) => assert_eq!(w.handle, 7),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_only_first_click_is_honoured() {
        let mut p = picker();
        assert!(matches!(p.click(Point::new(300, 200)), PickerOutcome::Selected(_)));
        assert_eq!(p.click(Point::new(60, 10)), PickerOutcome::Pending);
        assert_eq!(p.cancel(), PickerOutcome::Pending);
        assert!(p.hover(Point::new(60, 10)).is_none());
    }

    #[test]
    fn test_click_on_desktop_cancels() {
        let mut p = picker();
        assert_eq!(p.click(Point::new(590, 10)), PickerOutcome::Cancelled);
    }

    #[test]
    fn test_cancel_then_click_ignored() {
        let mut p = picker();
        assert_eq!(p.cancel(), PickerOutcome::Cancelled);
        assert_eq!(p.click(Point::new(60, 10)), PickerOutcome::Pending);
    }
}
