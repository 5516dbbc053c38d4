//! Image clipboard output.
//!
//! On Windows the image is placed on the clipboard as `CF_DIB`: the BMP
//! encoding of the image without its 14-byte file header.

use std::io::Cursor;

use anyhow::{bail, Context, Result};
use image::{ImageFormat, RgbImage};

/// Size of `BITMAPFILEHEADER`, which a DIB payload omits.
const BMP_FILE_HEADER_LEN: usize = 14;

/// Encodes an image as a packed device-independent bitmap.
pub fn encode_dib(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bmp = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bmp), ImageFormat::Bmp)
        .context("Failed to encode BMP")?;
    if bmp.len() <= BMP_FILE_HEADER_LEN {
        bail!("BMP encoding is truncated ({} bytes)", bmp.len());
    }
    Ok(bmp.split_off(BMP_FILE_HEADER_LEN))
}

/// Where finished screenshots are copied.
pub trait ClipboardSink {
    fn set_image(&mut self, image: &RgbImage) -> Result<()>;
}

/// The OS clipboard.
#[derive(Debug, Default)]
pub struct SystemClipboard;

#[cfg(windows)]
impl ClipboardSink for SystemClipboard {
    fn set_image(&mut self, image: &RgbImage) -> Result<()> {
        use anyhow::anyhow;
        use windows::Win32::Foundation::{HANDLE, HWND};
        use windows::Win32::System::DataExchange::{
            CloseClipboard, EmptyClipboard, OpenClipboard, SetClipboardData,
        };
        use windows::Win32::System::Memory::{GlobalAlloc, GlobalFree, GlobalLock, GlobalUnlock, GMEM_MOVEABLE};
        use windows::Win32::System::Ole::CF_DIB;

        let dib = encode_dib(image)?;

        unsafe {
            OpenClipboard(HWND::default()).context("OpenClipboard failed")?;

            let result = (|| -> Result<()> {
                EmptyClipboard().context("EmptyClipboard failed")?;

                let hmem = GlobalAlloc(GMEM_MOVEABLE, dib.len()).context("GlobalAlloc failed")?;
                let ptr = GlobalLock(hmem);
                if ptr.is_null() {
                    let _ = GlobalFree(hmem);
                    return Err(anyhow!("GlobalLock failed"));
                }
                std::ptr::copy_nonoverlapping(dib.as_ptr(), ptr.cast::<u8>(), dib.len());
                // Returns an "error" with code 0 once the lock count drops to zero
                let _ = GlobalUnlock(hmem);

                if let Err(e) = SetClipboardData(CF_DIB.0 as u32, HANDLE(hmem.0)) {
                    let _ = GlobalFree(hmem);
                    return Err(anyhow!("SetClipboardData failed: {}", e));
                }
                // The clipboard owns the memory from here on
                Ok(())
            })();

            let _ = CloseClipboard();
            result?;
        }

        log::info!("Copied {}x{} image to clipboard", image.width(), image.height());
        Ok(())
    }
}

#[cfg(not(windows))]
impl ClipboardSink for SystemClipboard {
    fn set_image(&mut self, image: &RgbImage) -> Result<()> {
        use std::borrow::Cow;

        let rgba = image::DynamicImage::ImageRgb8(image.clone()).to_rgba8();
        let mut clipboard = arboard::Clipboard::new().context("Clipboard unavailable")?;
        clipboard
            .set_image(arboard::ImageData {
                width: rgba.width() as usize,
                height: rgba.height() as usize,
                bytes: Cow::Owned(rgba.into_raw()),
            })
            .context("Failed to set clipboard image")?;
        log::info!("Copied {}x{} image to clipboard", image.width(), image.height());
        Ok(())
    }
}
