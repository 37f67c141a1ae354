//! System clipboard helpers.

use arboard::Clipboard;
use image::{DynamicImage, RgbaImage};

use crate::Result;

pub fn copy_text(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new()?;
    clipboard.set_text(text.to_string())?;
    Ok(())
}

pub fn paste_image() -> Result<DynamicImage> {
    let mut clipboard = Clipboard::new()?;
    let data = clipboard.get_image()?;
    // arboard hands back RGBA rows
    let buffer = RgbaImage::from_raw(data.width as u32, data.height as u32, data.bytes.into_owned())
        .ok_or(arboard::Error::ConversionFailure)?;
    Ok(DynamicImage::ImageRgba8(buffer))
}
