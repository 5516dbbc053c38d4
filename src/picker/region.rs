//! Drag-to-select rectangle logic.

use crate::geometry::{Point, Rect};

use super::PickerOutcome;

/// A selection must be strictly larger than this in both dimensions.
pub const MIN_REGION_SIZE: i32 = 10;

/// Tracks one press-drag-release gesture on the region overlay.
///
/// Coordinates are in the frozen screenshot's pixel space. Once a result has
/// been reported, further events are ignored.
#[derive(Debug, Default)]
pub struct RegionSelector {
    start: Option<Point>,
    current: Option<Point>,
    finished: bool,
}

impl RegionSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, p: Point) {
        if self.finished {
            return;
        }
        self.start = Some(p);
        self.current = Some(p);
    }

    pub fn drag(&mut self, p: Point) {
        if self.finished || self.start.is_none() {
            return;
        }
        self.current = Some(p);
    }

    /// Finishes the gesture. A release without a prior press is ignored.
    pub fn release(&mut self, p: Point) -> PickerOutcome<Rect> {
        if self.finished {
            return PickerOutcome::Pending;
        }
        let Some(start) = self.start else {
            return PickerOutcome::Pending;
        };
        self.finished = true;
        let rect = Rect::from_corners(start, p);
        if rect.width() > MIN_REGION_SIZE && rect.height() > MIN_REGION_SIZE {
            PickerOutcome::Selected(rect)
        } else {
            log::info!(
                "Region {}x{} is below the {}px minimum",
                rect.width(),
                rect.height(),
                MIN_REGION_SIZE
            );
            PickerOutcome::Cancelled
        }
    }

    /// Escape: cancels unconditionally (once).
    pub fn cancel(&mut self) -> PickerOutcome<Rect> {
        if self.finished {
            return PickerOutcome::Pending;
        }
        self.finished = true;
        PickerOutcome::Cancelled
    }

    /// The rectangle being dragged, for drawing feedback.
    pub fn preview(&self) -> Option<Rect> {
        match (self.start, self.current) {
            (Some(a), Some(b)) if !self.finished => Some(Rect::from_corners(a, b)),
            _ => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.start.is_some() && !self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(from: (i32, i32), to: (i32, i32)) -> PickerOutcome<Rect> {
        let mut selector = RegionSelector::new();
        selector.press(Point::new(from.0, from.1));
        selector.drag(Point::new(to.0, to.1));
        selector.release(Point::new(to.0, to.1))
    }

    #[test]
    fn test_valid_region_any_direction() {
        assert_eq!(
            select((100, 80), (20, 30)),
            PickerOutcome::Selected(Rect::new(20, 30, 100, 80))
        );
    }

    #[test]
    fn test_small_regions_cancel() {
        // Exactly 10 px in either dimension is not enough
        assert_eq!(select((0, 0), (10, 50)), PickerOutcome::Cancelled);
        assert_eq!(select((0, 0), (50, 10)), PickerOutcome::Cancelled);
        assert_eq!(select((5, 5), (5, 5)), PickerOutcome::Cancelled);
        assert_eq!(
            select((0, 0), (11, 11)),
            PickerOutcome::Selected(Rect::new(0, 0, 11, 11))
        );
    }

    #[test]
    fn test_escape_cancels_mid_drag() {
        let mut selector = RegionSelector::new();
        selector.press(Point::new(0, 0));
        selector.drag(Point::new(300, 300));
        assert_eq!(selector.cancel(), PickerOutcome::Cancelled);
        assert!(selector.preview().is_none());
    }

    #[test]
    fn test_only_first_result_is_reported() {
        let mut selector = RegionSelector::new();
        assert_eq!(selector.cancel(), PickerOutcome::Cancelled);
        selector.press(Point::new(0, 0));
        assert_eq!(selector.release(Point::new(200, 200)), PickerOutcome::Pending);
        assert_eq!(selector.cancel(), PickerOutcome::Pending);
    }

    #[test]
    fn test_release_without_press_is_ignored() {
        let mut selector = RegionSelector::new();
        assert_eq!(selector.release(Point::new(50, 50)), PickerOutcome::Pending);
        assert!(!selector.is_dragging());
    }
}
