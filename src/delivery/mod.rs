//! Getting finished screenshots to the user: clipboard and push-to-window.
//!
//! This module provides:
//! - DIB encoding and the clipboard sink (`clipboard`)
//! - Window activation and synthetic input (`input`)
//! - Push targets and the paste sequence (`push`)

pub mod clipboard;
pub mod input;
pub mod push;

pub use clipboard::{ClipboardSink, SystemClipboard};
pub use push::{push_to_target, DeliveryOutcome, DesktopDriver, PushTarget, WindowDriver};
