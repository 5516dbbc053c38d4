//! Top-level window discovery used by the window picker and push targets.

use crate::geometry::{Point, Rect};

/// A top-level window as seen at enumeration time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowInfo {
    /// Raw window handle (`HWND` value).
    pub handle: isize,
    pub title: String,
    /// Window rectangle in screen coordinates.
    pub rect: Rect,
}

/// Which windows `list_top_level_windows` reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnumOptions {
    pub include_minimized: bool,
    pub include_own_process: bool,
    /// DWM-cloaked windows: suspended UWP apps, other virtual desktops.
    pub include_cloaked: bool,
}

impl EnumOptions {
    /// Window picker: only windows that are actually on screen, never ours.
    pub const PICKING: EnumOptions = EnumOptions {
        include_minimized: false,
        include_own_process: false,
        include_cloaked: false,
    };

    /// Push delivery: minimized windows can be restored before pasting, and
    /// activating a window on another desktop switches to it.
    pub const DELIVERY: EnumOptions = EnumOptions {
        include_minimized: true,
        include_own_process: false,
        include_cloaked: true,
    };
}

/// What the window manager reports about one enumerated window.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WindowState {
    pub visible: bool,
    pub minimized: bool,
    pub cloaked: bool,
    pub own_process: bool,
    pub title: String,
    /// `GetWindowRect`, including the invisible resize borders.
    pub window_rect: Rect,
    /// `DWMWA_EXTENDED_FRAME_BOUNDS`, when DWM composes the window.
    pub frame_bounds: Option<Rect>,
}

/// On-screen bounds of a window: the DWM frame when known, else the raw rect.
pub fn visible_bounds(state: &WindowState) -> Rect {
    state.frame_bounds.unwrap_or(state.window_rect)
}

/// Applies the enumeration filter. Returns the window as reported, or `None`
/// when `options` exclude it.
pub fn accept_window(handle: isize, state: WindowState, options: EnumOptions) -> Option<WindowInfo> {
    if !state.visible {
        return None;
    }
    if state.minimized && !options.include_minimized {
        return None;
    }
    if state.cloaked && !options.include_cloaked {
        return None;
    }
    if state.own_process && !options.include_own_process {
        return None;
    }
    // Untitled windows are tool/shell surfaces, not applications
    if state.title.is_empty() {
        return None;
    }
    let rect = visible_bounds(&state);
    if rect.is_empty() && !options.include_minimized {
        return None;
    }
    Some(WindowInfo {
        handle,
        title: state.title,
        rect,
    })
}

/// Returns the first window (enumeration order) whose title contains `needle`.
/// Matching is case-sensitive; an empty needle matches nothing.
pub fn find_by_title<'a>(windows: &'a [WindowInfo], needle: &str) -> Option<&'a WindowInfo> {
    if needle.is_empty() {
        return None;
    }
    windows.iter().find(|w| w.title.contains(needle))
}

/// Hit-tests a z-ordered (topmost first) window list.
pub fn window_at(windows: &[WindowInfo], p: Point) -> Option<&WindowInfo> {
    windows.iter().find(|w| w.rect.contains(p))
}

#[cfg(windows)]
pub use win::{list_top_level_windows, window_rect};

#[cfg(not(windows))]
pub use fallback::{list_top_level_windows, window_rect};

#[cfg(windows)]
mod win {
    use anyhow::{anyhow, Context, Result};

    use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT, TRUE};
    use windows::Win32::Graphics::Dwm::{
        DwmGetWindowAttribute, DWMWA_CLOAKED, DWMWA_EXTENDED_FRAME_BOUNDS,
    };
    use windows::Win32::System::Threading::GetCurrentProcessId;
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetWindowRect, GetWindowTextLengthW, GetWindowTextW,
        GetWindowThreadProcessId, IsIconic, IsWindowVisible,
    };

    use super::{accept_window, visible_bounds, EnumOptions, WindowInfo, WindowState};
    use crate::geometry::Rect;

    fn window_title(hwnd: HWND) -> String {
        unsafe {
            let title_len = GetWindowTextLengthW(hwnd);
            if title_len <= 0 {
                return String::new();
            }
            let mut title_buf: Vec<u16> = vec![0; (title_len + 1) as usize];
            let copied = GetWindowTextW(hwnd, &mut title_buf);
            String::from_utf16_lossy(&title_buf[..copied.max(0) as usize])
        }
    }

    fn is_cloaked(hwnd: HWND) -> bool {
        let mut cloaked: u32 = 0;
        let result = unsafe {
            DwmGetWindowAttribute(
                hwnd,
                DWMWA_CLOAKED,
                &mut cloaked as *mut u32 as *mut std::ffi::c_void,
                std::mem::size_of::<u32>() as u32,
            )
        };
        result.is_ok() && cloaked != 0
    }

    /// Visible frame without the drop shadow and resize borders.
    fn frame_bounds(hwnd: HWND) -> Option<Rect> {
        let mut rect = RECT::default();
        unsafe {
            DwmGetWindowAttribute(
                hwnd,
                DWMWA_EXTENDED_FRAME_BOUNDS,
                &mut rect as *mut RECT as *mut std::ffi::c_void,
                std::mem::size_of::<RECT>() as u32,
            )
            .ok()?;
        }
        Some(Rect::new(rect.left, rect.top, rect.right, rect.bottom))
    }

    fn raw_window_rect(hwnd: HWND) -> Result<Rect> {
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd, &mut rect).context("GetWindowRect failed")? };
        Ok(Rect::new(rect.left, rect.top, rect.right, rect.bottom))
    }

    /// Returns the current on-screen rectangle of a window handle.
    pub fn window_rect(handle: isize) -> Result<Rect> {
        let hwnd = HWND(handle as *mut _);
        let state = WindowState {
            window_rect: raw_window_rect(hwnd)?,
            frame_bounds: frame_bounds(hwnd),
            ..WindowState::default()
        };
        Ok(visible_bounds(&state))
    }

    /// Enumerates visible, titled top-level windows in z-order.
    pub fn list_top_level_windows(options: EnumOptions) -> Result<Vec<WindowInfo>> {
        struct EnumData {
            windows: Vec<WindowInfo>,
            options: EnumOptions,
            own_pid: u32,
        }

        unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
            unsafe {
                let data = &mut *(lparam.0 as *mut EnumData);

                if !IsWindowVisible(hwnd).as_bool() {
                    return TRUE;
                }
                let Ok(window_rect) = raw_window_rect(hwnd) else {
                    return TRUE;
                };

                let mut process_id: u32 = 0;
                GetWindowThreadProcessId(hwnd, Some(&mut process_id));

                let state = WindowState {
                    visible: true,
                    minimized: IsIconic(hwnd).as_bool(),
                    cloaked: is_cloaked(hwnd),
                    own_process: process_id == data.own_pid,
                    title: window_title(hwnd),
                    window_rect,
                    frame_bounds: frame_bounds(hwnd),
                };
                if let Some(info) = accept_window(hwnd.0 as isize, state, data.options) {
                    data.windows.push(info);
                }
                TRUE
            }
        }

        let mut data = EnumData {
            windows: Vec::new(),
            options,
            own_pid: unsafe { GetCurrentProcessId() },
        };
        unsafe {
            EnumWindows(Some(enum_callback), LPARAM(&mut data as *mut _ as isize))
                .map_err(|e| anyhow!("EnumWindows failed: {}", e))?;
        }
        log::debug!("Enumerated {} top-level windows", data.windows.len());
        Ok(data.windows)
    }
}

#[cfg(not(windows))]
mod fallback {
    use anyhow::{bail, Result};

    use super::{EnumOptions, WindowInfo};
    use crate::geometry::Rect;

    pub fn window_rect(_handle: isize) -> Result<Rect> {
        bail!("Window queries are only supported on Windows")
    }

    pub fn list_top_level_windows(_options: EnumOptions) -> Result<Vec<WindowInfo>> {
        bail!("Window enumeration is only supported on Windows")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn win(handle: isize, title: &str, rect: Rect) -> WindowInfo {
        WindowInfo {
            handle,
            title: title.to_string(),
            rect,
        }
    }

    #[test]
    fn test_find_by_title_first_match_wins() {
        let windows = vec![
            win(1, "notes.txt - Notepad", Rect::new(0, 0, 10, 10)),
            win(2, "main.rs - snapmark - Visual Studio Code", Rect::new(0, 0, 10, 10)),
            win(3, "lib.rs - other - Visual Studio Code", Rect::new(0, 0, 10, 10)),
        ];
        let found = find_by_title(&windows, "Visual Studio Code").unwrap();
        assert_eq!(found.handle, 2);
    }

    #[test]
    fn test_find_by_title_is_case_sensitive_and_rejects_empty() {
        let windows = vec![win(1, "Slack", Rect::new(0, 0, 10, 10))];
        assert!(find_by_title(&windows, "slack").is_none());
        assert!(find_by_title(&windows, "").is_none());
    }

    #[test]
    fn test_window_at_prefers_topmost() {
        let windows = vec![
            win(1, "dialog", Rect::new(100, 100, 200, 200)),
            win(2, "browser", Rect::new(0, 0, 800, 600)),
        ];
        assert_eq!(window_at(&windows, Point::new(150, 150)).unwrap().handle, 1);
        assert_eq!(window_at(&windows, Point::new(50, 50)).unwrap().handle, 2);
        assert!(window_at(&windows, Point::new(900, 50)).is_none());
    }

    fn on_screen(title: &str, rect: Rect) -> WindowState {
        WindowState {
            visible: true,
            title: title.to_string(),
            window_rect: rect,
            ..WindowState::default()
        }
    }

    #[test]
    fn test_cloaked_window_is_skipped_when_picking() {
        let mut state = on_screen("Microsoft Text Input Application", Rect::new(0, 0, 1920, 1080));
        state.cloaked = true;
        assert!(accept_window(1, state.clone(), EnumOptions::PICKING).is_none());
        assert!(accept_window(1, state, EnumOptions::DELIVERY).is_some());
    }

    #[test]
    fn test_cloaked_fullscreen_does_not_shadow_target() {
        let mut cloaked = on_screen("Settings", Rect::new(0, 0, 1920, 1080));
        cloaked.cloaked = true;
        let target = on_screen("notes.txt - Notepad", Rect::new(200, 200, 800, 600));

        let windows: Vec<WindowInfo> = [(1, cloaked), (2, target)]
            .into_iter()
            .filter_map(|(h, s)| accept_window(h, s, EnumOptions::PICKING))
            .collect();

        assert_eq!(window_at(&windows, Point::new(300, 300)).unwrap().handle, 2);
        assert!(window_at(&windows, Point::new(50, 50)).is_none());
    }

    #[test]
    fn test_frame_bounds_replace_resize_borders() {
        let mut state = on_screen("browser", Rect::new(93, 93, 907, 707));
        state.frame_bounds = Some(Rect::new(100, 100, 900, 700));
        let info = accept_window(7, state, EnumOptions::PICKING).unwrap();
        assert_eq!(info.rect, Rect::new(100, 100, 900, 700));

        let plain = on_screen("legacy", Rect::new(0, 0, 300, 200));
        let info = accept_window(8, plain, EnumOptions::PICKING).unwrap();
        assert_eq!(info.rect, Rect::new(0, 0, 300, 200));
    }

    #[test]
    fn test_filter_drops_untitled_own_and_minimized() {
        let untitled = on_screen("", Rect::new(0, 0, 100, 100));
        assert!(accept_window(1, untitled, EnumOptions::PICKING).is_none());

        let mut own = on_screen("SnapMark", Rect::new(0, 0, 100, 100));
        own.own_process = true;
        assert!(accept_window(2, own, EnumOptions::DELIVERY).is_none());

        let mut minimized = on_screen("Slack", Rect::new(-32000, -32000, -31840, -31972));
        minimized.minimized = true;
        assert!(accept_window(3, minimized.clone(), EnumOptions::PICKING).is_none());
        assert!(accept_window(3, minimized, EnumOptions::DELIVERY).is_some());

        let mut hidden = on_screen("Hidden", Rect::new(0, 0, 100, 100));
        hidden.visible = false;
        assert!(accept_window(4, hidden, EnumOptions::DELIVERY).is_none());
    }
}
