//! Global hotkeys.
//!
//! A dedicated thread owns the registrations and its Win32 message queue.
//! Presses are forwarded over a channel and the UI is woken with a repaint
//! request; all handling happens on the UI thread.

use std::sync::mpsc::Receiver;

use anyhow::Result;
use eframe::egui;

/// Virtual-key codes for the bound letters.
const VK_R: u32 = 0x52;
const VK_S: u32 = 0x53;
const VK_W: u32 = 0x57;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HotkeyAction {
    Region,
    FullScreen,
    Window,
}

/// Hotkey id, virtual key and action. All use Ctrl+Shift.
pub const BINDINGS: [(i32, u32, HotkeyAction); 3] = [
    (1, VK_R, HotkeyAction::Region),
    (2, VK_S, HotkeyAction::FullScreen),
    (3, VK_W, HotkeyAction::Window),
];

impl HotkeyAction {
    pub fn from_id(id: i32) -> Option<Self> {
        BINDINGS.iter().find(|(i, _, _)| *i == id).map(|(_, _, a)| *a)
    }

    pub fn label(&self) -> &'static str {
        match self {
            HotkeyAction::Region => "Ctrl+Shift+R",
            HotkeyAction::FullScreen => "Ctrl+Shift+S",
            HotkeyAction::Window => "Ctrl+Shift+W",
        }
    }
}

pub struct HotkeyListener {
    receiver: Receiver<HotkeyAction>,
    #[cfg(windows)]
    thread_id: u32,
    #[cfg(windows)]
    handle: Option<std::thread::JoinHandle<()>>,
}

impl HotkeyListener {
    /// Next pending hotkey press, if any.
    pub fn poll(&self) -> Option<HotkeyAction> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(windows)]
impl HotkeyListener {
    /// Starts the listener thread and registers all bindings. A binding
    /// taken by another application is logged and skipped.
    pub fn spawn(ctx: egui::Context) -> Result<Self> {
        use std::sync::mpsc;

        use anyhow::{anyhow, Context as _};
        use windows::Win32::Foundation::HWND;
        use windows::Win32::System::Threading::GetCurrentThreadId;
        use windows::Win32::UI::Input::KeyboardAndMouse::{
            RegisterHotKey, UnregisterHotKey, MOD_CONTROL, MOD_NOREPEAT, MOD_SHIFT,
        };
        use windows::Win32::UI::WindowsAndMessaging::{
            GetMessageW, PeekMessageW, MSG, PM_NOREMOVE, WM_HOTKEY, WM_USER,
        };

        let (action_tx, action_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel::<u32>();

        let handle = std::thread::Builder::new()
            .name("hotkeys".to_string())
            .spawn(move || unsafe {
                // Force creation of this thread's message queue
                let mut msg = MSG::default();
                let _ = PeekMessageW(&mut msg, HWND::default(), WM_USER, WM_USER, PM_NOREMOVE);

                let mut registered = Vec::new();
                for (id, vk, action) in BINDINGS {
                    match RegisterHotKey(HWND::default(), id, MOD_CONTROL | MOD_SHIFT | MOD_NOREPEAT, vk) {
                        Ok(()) => {
                            log::info!("Hotkey: {} registered", action.label());
                            registered.push(id);
                        }
                        Err(e) => log::warn!("Hotkey {} unavailable: {}", action.label(), e),
                    }
                }
                let _ = ready_tx.send(GetCurrentThreadId());

                while GetMessageW(&mut msg, HWND::default(), 0, 0).as_bool() {
                    if msg.message != WM_HOTKEY {
                        continue;
                    }
                    if let Some(action) = HotkeyAction::from_id(msg.wParam.0 as i32) {
                        log::debug!("Hotkey pressed: {}", action.label());
                        if action_tx.send(action).is_err() {
                            break;
                        }
                        ctx.request_repaint();
                    }
                }

                for id in registered {
                    let _ = UnregisterHotKey(HWND::default(), id);
                }
                log::info!("Hotkeys unregistered");
            })
            .context("Failed to spawn hotkey thread")?;

        let thread_id = ready_rx
            .recv()
            .map_err(|_| anyhow!("Hotkey thread exited during startup"))?;

        Ok(Self {
            receiver: action_rx,
            thread_id,
            handle: Some(handle),
        })
    }
}

#[cfg(not(windows))]
impl HotkeyListener {
    pub fn spawn(_ctx: egui::Context) -> Result<Self> {
        anyhow::bail!("Global hotkeys are only supported on Windows")
    }
}

#[cfg(windows)]
impl Drop for HotkeyListener {
    fn drop(&mut self) {
        use windows::Win32::Foundation::{LPARAM, WPARAM};
        use windows::Win32::UI::WindowsAndMessaging::{PostThreadMessageW, WM_QUIT};

        unsafe {
            let _ = PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_map_to_actions() {
        assert_eq!(HotkeyAction::from_id(1), Some(HotkeyAction::Region));
        assert_eq!(HotkeyAction::from_id(2), Some(HotkeyAction::FullScreen));
        assert_eq!(HotkeyAction::from_id(3), Some(HotkeyAction::Window));
        assert_eq!(HotkeyAction::from_id(99), None);
    }

    #[test]
    fn test_bindings_are_unique() {
        for (i, a) in BINDINGS.iter().enumerate() {
            for b in &BINDINGS[i + 1..] {
                assert_ne!(a.0, b.0);
                assert_ne!(a.1, b.1);
            }
        }
    }
}
