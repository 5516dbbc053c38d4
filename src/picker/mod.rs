//! Transient full-screen pickers that turn pointer input into a capture
//! target.
//!
//! Both pickers work on a frozen screenshot of the whole virtual screen, so
//! the overlay itself never shows up in what gets captured.

pub mod overlay;
pub mod region;
pub mod window;

pub use region::RegionSelector;
pub use window::WindowPicker;

/// Result of feeding one input event to a picker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PickerOutcome<T> {
    /// Still waiting for the user.
    Pending,
    Selected(T),
    Cancelled,
}
