//! Screen grabs and monitor geometry using Windows GDI.

use image::RgbImage;

/// Converts a top-down 32-bit BGRA/BGRX buffer to an RGB image.
pub fn bgra_to_rgb(data: &[u8], width: u32, height: u32) -> Option<RgbImage> {
    let expected = width as usize * height as usize * 4;
    if data.len() < expected {
        return None;
    }
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for px in data[..expected].chunks_exact(4) {
        rgb.extend_from_slice(&[px[2], px[1], px[0]]);
    }
    RgbImage::from_raw(width, height, rgb)
}

#[cfg(windows)]
pub use win::{cursor_position, grab_rect, monitors, virtual_screen_rect};

#[cfg(not(windows))]
pub use fallback::{cursor_position, grab_rect, monitors, virtual_screen_rect};

#[cfg(windows)]
mod win {
    use anyhow::{anyhow, bail, Context, Result};
    use image::RgbImage;

    use windows::Win32::Foundation::{BOOL, HWND, LPARAM, POINT, RECT, TRUE};
    use windows::Win32::Graphics::Gdi::{
        BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject,
        EnumDisplayMonitors, GetDC, GetDIBits, ReleaseDC, SelectObject, BITMAPINFO,
        BITMAPINFOHEADER, BI_RGB, CAPTUREBLT, DIB_RGB_COLORS, HDC, HMONITOR, ROP_CODE, SRCCOPY,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        GetCursorPos, GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN,
        SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN,
    };

    use super::bgra_to_rgb;
    use crate::capture::Monitor;
    use crate::geometry::{Point, Rect};

    /// Returns the bounding box of all monitors in screen coordinates.
    pub fn virtual_screen_rect() -> Result<Rect> {
        let rect = unsafe {
            Rect::from_origin_size(
                GetSystemMetrics(SM_XVIRTUALSCREEN),
                GetSystemMetrics(SM_YVIRTUALSCREEN),
                GetSystemMetrics(SM_CXVIRTUALSCREEN),
                GetSystemMetrics(SM_CYVIRTUALSCREEN),
            )
        };
        if rect.is_empty() {
            bail!("Virtual screen has no area");
        }
        Ok(rect)
    }

    /// Lists all monitors. The primary monitor is the one anchored at (0, 0).
    pub fn monitors() -> Result<Vec<Monitor>> {
        unsafe extern "system" fn enum_callback(
            _monitor: HMONITOR,
            _hdc: HDC,
            rect: *mut RECT,
            lparam: LPARAM,
        ) -> BOOL {
            unsafe {
                let list = &mut *(lparam.0 as *mut Vec<Monitor>);
                if let Some(r) = rect.as_ref() {
                    list.push(Monitor {
                        rect: Rect::new(r.left, r.top, r.right, r.bottom),
                        primary: r.left == 0 && r.top == 0,
                    });
                }
                TRUE
            }
        }

        let mut list: Vec<Monitor> = Vec::new();
        let ok = unsafe {
            EnumDisplayMonitors(
                HDC::default(),
                None,
                Some(enum_callback),
                LPARAM(&mut list as *mut _ as isize),
            )
        };
        if !ok.as_bool() {
            bail!("EnumDisplayMonitors failed");
        }
        Ok(list)
    }

    pub fn cursor_position() -> Result<Point> {
        let mut pt = POINT::default();
        unsafe { GetCursorPos(&mut pt).context("GetCursorPos failed")? };
        Ok(Point::new(pt.x, pt.y))
    }

    /// Copies `area` of the screen into an RGB image.
    ///
    /// The screen DC is blitted into a compatible bitmap, then read back as a
    /// top-down 32bpp DIB and converted from BGRX.
    pub fn grab_rect(area: Rect) -> Result<RgbImage> {
        let (width, height) = (area.width(), area.height());
        if width <= 0 || height <= 0 {
            bail!("Capture area is empty: {}x{}", width, height);
        }

        let mut buffer = vec![0u8; width as usize * height as usize * 4];
        let mut info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                biHeight: -height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let (blit, lines) = unsafe {
            let screen_dc = GetDC(HWND::default());
            if screen_dc.is_invalid() {
                bail!("GetDC failed");
            }
            let mem_dc = CreateCompatibleDC(screen_dc);
            let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
            let previous = SelectObject(mem_dc, bitmap);

            let blit = BitBlt(
                mem_dc,
                0,
                0,
                width,
                height,
                screen_dc,
                area.left,
                area.top,
                ROP_CODE(SRCCOPY.0 | CAPTUREBLT.0),
            );
            let lines = GetDIBits(
                mem_dc,
                bitmap,
                0,
                height as u32,
                Some(buffer.as_mut_ptr().cast()),
                &mut info,
                DIB_RGB_COLORS,
            );

            SelectObject(mem_dc, previous);
            let _ = DeleteObject(bitmap);
            let _ = DeleteDC(mem_dc);
            ReleaseDC(HWND::default(), screen_dc);
            (blit, lines)
        };

        blit.context("BitBlt failed")?;
        if lines == 0 {
            bail!("GetDIBits returned no scanlines");
        }
        log::debug!(
            "Grabbed {}x{} at ({}, {})",
            width,
            height,
            area.left,
            area.top
        );
        bgra_to_rgb(&buffer, width as u32, height as u32)
            .ok_or_else(|| anyhow!("Captured buffer has unexpected size"))
    }
}

#[cfg(not(windows))]
mod fallback {
    use anyhow::{bail, Result};
    use image::RgbImage;

    use crate::capture::Monitor;
    use crate::geometry::{Point, Rect};

    pub fn virtual_screen_rect() -> Result<Rect> {
        bail!("Screen capture is only supported on Windows")
    }

    pub fn monitors() -> Result<Vec<Monitor>> {
        bail!("Screen capture is only supported on Windows")
    }

    pub fn cursor_position() -> Result<Point> {
        bail!("Cursor position is only available on Windows")
    }

    pub fn grab_rect(_area: Rect) -> Result<RgbImage> {
        bail!("Screen capture is only supported on Windows")
    }
}
