//! Rendering finished ASCII art to PNG or SVG files.

use std::fmt::{self, Write as _};
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use font8x8::{BASIC_FONTS, BLOCK_FONTS, BOX_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{ImageFormat, Rgb, RgbImage};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const FONT_SIZE_RANGE: RangeInclusive<u32> = 8..=500;

/// Largest PNG canvas we will allocate (about 192 MB of RGB).
pub const MAX_EXPORT_PIXELS: u64 = 64_000_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    #[default]
    Png,
    Svg,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Png, ExportFormat::Svg];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.extension())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub font_size: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            font_size: 12,
        }
    }
}

/// Character cell metrics for a given point size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cell {
    advance: u32,
    line: u32,
    glyph_h: u32,
}

impl Cell {
    fn for_size(font_size: u32) -> Self {
        let size = font_size.clamp(*FONT_SIZE_RANGE.start(), *FONT_SIZE_RANGE.end());
        // 0.6em advance and 1.2em line spacing, rounded up
        Self {
            advance: (size * 6).div_ceil(10),
            line: (size * 12).div_ceil(10),
            glyph_h: size,
        }
    }
}

fn grid(text: &str) -> (u32, u32) {
    let lines: Vec<&str> = text.split('\n').collect();
    let cols = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0).max(1);
    (cols as u32, lines.len() as u32)
}

/// Final image size in pixels: the text grid plus one cell of margin.
pub fn resolution(text: &str, font_size: u32) -> (u32, u32) {
    let cell = Cell::for_size(font_size);
    let (cols, rows) = grid(text);
    (cell.advance * cols + cell.advance, cell.line * rows + cell.line)
}

/// Whether a PNG of this size stays under [`MAX_EXPORT_PIXELS`].
pub fn fits_png(width: u32, height: u32) -> bool {
    width as u64 * height as u64 <= MAX_EXPORT_PIXELS
}

fn palette(inverted: bool) -> (Rgb<u8>, Rgb<u8>) {
    if inverted {
        (Rgb([0, 0, 0]), Rgb([255, 255, 255]))
    } else {
        (Rgb([255, 255, 255]), Rgb([0, 0, 0]))
    }
}

fn glyph(ch: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(ch)
        .or_else(|| BLOCK_FONTS.get(ch))
        .or_else(|| BOX_FONTS.get(ch))
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
}

/// Rasterizes `text` with an 8x8 bitmap font stretched to the cell size.
pub fn render_png(text: &str, font_size: u32, inverted: bool) -> Result<RgbImage> {
    let cell = Cell::for_size(font_size);
    let (width, height) = resolution(text, font_size);
    if !fits_png(width, height) {
        return Err(Error::ExportTooLarge {
            width,
            height,
            limit: MAX_EXPORT_PIXELS,
        });
    }
    let (background, ink) = palette(inverted);
    let mut img = RgbImage::from_pixel(width, height, background);

    let margin_x = cell.advance / 2;
    let margin_y = cell.line / 2;
    let glyph_top = (cell.line - cell.glyph_h) / 2;

    for (row, line) in text.split('\n').enumerate() {
        let y0 = margin_y + row as u32 * cell.line + glyph_top;
        for (col, ch) in line.chars().enumerate() {
            if ch == ' ' {
                continue;
            }
            let Some(bits) = glyph(ch) else {
                continue;
            };
            let x0 = margin_x + col as u32 * cell.advance;
            for dy in 0..cell.glyph_h {
                let row_bits = bits[(dy * 8 / cell.glyph_h) as usize];
                for dx in 0..cell.advance {
                    if (row_bits >> (dx * 8 / cell.advance)) & 1 == 0 {
                        continue;
                    }
                    let (x, y) = (x0 + dx, y0 + dy);
                    if x < width && y < height {
                        img.put_pixel(x, y, ink);
                    }
                }
            }
        }
    }
    Ok(img)
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_svg(text: &str, font_size: u32, inverted: bool) -> String {
    let cell = Cell::for_size(font_size);
    let (width, height) = resolution(text, font_size);
    let (bg, fg) = if inverted { ("#000", "#fff") } else { ("#fff", "#000") };

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="{bg}"/>"#);
    let _ = writeln!(
        svg,
        r#"<text font-family="monospace" font-size="{}" fill="{fg}" xml:space="preserve">"#,
        cell.glyph_h
    );
    let margin_x = cell.advance as f32 / 2.0;
    for (row, line) in text.split('\n').enumerate() {
        let baseline = cell.line as f32 / 2.0 + row as f32 * cell.line as f32 + cell.glyph_h as f32;
        let _ = writeln!(
            svg,
            r#"<tspan x="{margin_x}" y="{baseline}">{}</tspan>"#,
            escape_xml(line)
        );
    }
    svg.push_str("</text>\n</svg>\n");
    svg
}

pub fn export_to(path: &Path, text: &str, options: &ExportOptions, inverted: bool) -> Result<()> {
    match options.format {
        ExportFormat::Png => {
            render_png(text, options.font_size, inverted)?.save_with_format(path, ImageFormat::Png)?
        }
        ExportFormat::Svg => fs::write(path, render_svg(text, options.font_size, inverted))?,
    }
    info!("exported {} to {}", options.format, path.display());
    Ok(())
}
