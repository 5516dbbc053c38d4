//! Window activation and synthetic input for auto-paste.
//!
//! Uses SendInput, which simulates hardware-level input: the target window
//! must be in the foreground and the real cursor moves.

#[cfg(windows)]
pub use win::{activate_window, click_at, send_paste};

#[cfg(not(windows))]
pub use fallback::{activate_window, click_at, send_paste};

#[cfg(windows)]
mod win {
    use std::thread::sleep;
    use std::time::Duration;

    use anyhow::{bail, Result};

    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYBD_EVENT_FLAGS,
        KEYEVENTF_KEYUP, MOUSEEVENTF_ABSOLUTE, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
        MOUSEEVENTF_MOVE, MOUSEEVENTF_VIRTUALDESK, MOUSEINPUT, MOUSE_EVENT_FLAGS, VIRTUAL_KEY,
        VK_CONTROL, VK_V,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        GetSystemMetrics, IsIconic, SetForegroundWindow, ShowWindow, SM_CXVIRTUALSCREEN,
        SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN, SW_MINIMIZE, SW_RESTORE,
    };

    use crate::geometry::Point;

    /// Time allowed for the target to come to the foreground.
    const ACTIVATION_SETTLE: Duration = Duration::from_millis(300);

    fn send(inputs: &[INPUT]) -> Result<()> {
        let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
        if sent as usize != inputs.len() {
            bail!("SendInput delivered {} of {} events", sent, inputs.len());
        }
        Ok(())
    }

    /// Brings a window to the foreground. If Windows refuses, the window is
    /// minimized and restored, which usually grants it focus.
    pub fn activate_window(handle: isize) -> Result<()> {
        let hwnd = HWND(handle as *mut _);
        unsafe {
            if IsIconic(hwnd).as_bool() {
                let _ = ShowWindow(hwnd, SW_RESTORE);
            }
            if !SetForegroundWindow(hwnd).as_bool() {
                log::warn!("SetForegroundWindow refused, trying minimize/restore");
                let _ = ShowWindow(hwnd, SW_MINIMIZE);
                let _ = ShowWindow(hwnd, SW_RESTORE);
            }
        }
        sleep(ACTIVATION_SETTLE);
        Ok(())
    }

    fn mouse(dx: i32, dy: i32, flags: MOUSE_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx,
                    dy,
                    dwFlags: flags | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_VIRTUALDESK | MOUSEEVENTF_MOVE,
                    ..Default::default()
                },
            },
        }
    }

    /// Left-clicks at a screen position.
    pub fn click_at(p: Point) -> Result<()> {
        let (vx, vy, vw, vh) = unsafe {
            (
                GetSystemMetrics(SM_XVIRTUALSCREEN),
                GetSystemMetrics(SM_YVIRTUALSCREEN),
                GetSystemMetrics(SM_CXVIRTUALSCREEN),
                GetSystemMetrics(SM_CYVIRTUALSCREEN),
            )
        };
        if vw <= 1 || vh <= 1 {
            bail!("Virtual screen has no area");
        }

        // Normalize to 0-65535 across the virtual desktop
        let norm_x = ((p.x - vx) as i64 * 65535 / (vw - 1) as i64) as i32;
        let norm_y = ((p.y - vy) as i64 * 65535 / (vh - 1) as i64) as i32;
        log::debug!("Clicking at ({}, {}) normalized ({}, {})", p.x, p.y, norm_x, norm_y);

        send(&[mouse(norm_x, norm_y, MOUSE_EVENT_FLAGS(0))])?;
        sleep(Duration::from_millis(50));
        send(&[
            mouse(norm_x, norm_y, MOUSEEVENTF_LEFTDOWN),
            mouse(norm_x, norm_y, MOUSEEVENTF_LEFTUP),
        ])?;
        sleep(Duration::from_millis(100));
        Ok(())
    }

    fn key(vk: VIRTUAL_KEY, flags: KEYBD_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: vk,
                    dwFlags: flags,
                    ..Default::default()
                },
            },
        }
    }

    /// Sends the Ctrl+V chord to the foreground window.
    pub fn send_paste() -> Result<()> {
        let none = KEYBD_EVENT_FLAGS(0);
        send(&[
            key(VK_CONTROL, none),
            key(VK_V, none),
            key(VK_V, KEYEVENTF_KEYUP),
            key(VK_CONTROL, KEYEVENTF_KEYUP),
        ])?;
        log::info!("Sent Ctrl+V");
        Ok(())
    }
}

#[cfg(not(windows))]
mod fallback {
    use anyhow::{bail, Result};

    use crate::geometry::Point;

    pub fn activate_window(_handle: isize) -> Result<()> {
        bail!("Window activation is only supported on Windows")
    }

    pub fn click_at(_p: Point) -> Result<()> {
        bail!("Input simulation is only supported on Windows")
    }

    pub fn send_paste() -> Result<()> {
        bail!("Input simulation is only supported on Windows")
    }
}
