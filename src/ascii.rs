//! Charset ramps and the crop → adjust → resize → render pipeline.

use std::fmt;
use std::str::FromStr;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::adjust::Adjustments;
use crate::geometry::CropBox;
use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharsetPreset {
    Standard,
    Detailed,
    Blocks,
    Binary,
    Custom,
}

impl CharsetPreset {
    pub const ALL: [CharsetPreset; 5] = [
        CharsetPreset::Standard,
        CharsetPreset::Detailed,
        CharsetPreset::Blocks,
        CharsetPreset::Binary,
        CharsetPreset::Custom,
    ];

    /// Ramp ordered from lightest to densest. `None` for [`CharsetPreset::Custom`].
    pub fn chars(&self) -> Option<&'static str> {
        match self {
            CharsetPreset::Standard => Some(" .:-=+*#%@"),
            CharsetPreset::Detailed => Some(
                " .'`^\",:;Il!i><~+_-?][}{1)(|\\/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$",
            ),
            CharsetPreset::Blocks => Some(" ░▒▓█"),
            CharsetPreset::Binary => Some(" 01"),
            CharsetPreset::Custom => None,
        }
    }
}

impl fmt::Display for CharsetPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CharsetPreset::Standard => "Standard (10 chars)",
            CharsetPreset::Detailed => "Detailed (70 chars)",
            CharsetPreset::Blocks => "Blocks",
            CharsetPreset::Binary => "Binary",
            CharsetPreset::Custom => "Custom",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for CharsetPreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(CharsetPreset::Standard),
            "detailed" => Ok(CharsetPreset::Detailed),
            "blocks" => Ok(CharsetPreset::Blocks),
            "binary" => Ok(CharsetPreset::Binary),
            "custom" => Ok(CharsetPreset::Custom),
            other => Err(format!(
                "unknown charset '{other}' (expected standard, detailed, blocks, binary or custom)"
            )),
        }
    }
}

/// Selected preset plus the text of the custom ramp, which survives
/// switching back and forth between presets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Charset {
    preset: CharsetPreset,
    custom: String,
}

impl Default for Charset {
    fn default() -> Self {
        Self {
            preset: CharsetPreset::Standard,
            custom: CharsetPreset::Standard.chars().unwrap_or_default().to_owned(),
        }
    }
}

impl Charset {
    pub fn preset(&self) -> CharsetPreset {
        self.preset
    }

    pub fn select(&mut self, preset: CharsetPreset) {
        self.preset = preset;
    }

    /// Typing into the ramp field switches to the custom preset.
    pub fn edit(&mut self, text: impl Into<String>) {
        self.custom = text.into();
        self.preset = CharsetPreset::Custom;
    }

    pub fn ramp(&self) -> &str {
        self.preset.chars().unwrap_or(self.custom.as_str())
    }
}

/// Turns a grey image, already sized to the output grid, into text.
pub trait AsciiRenderer {
    fn render(&self, image: &GrayImage, ramp: &[char]) -> String;
}

/// One character per pixel; darker pixels pick denser characters so the art
/// reads correctly as dark text on a light background.
#[derive(Clone, Copy, Debug, Default)]
pub struct RampRenderer;

impl AsciiRenderer for RampRenderer {
    fn render(&self, image: &GrayImage, ramp: &[char]) -> String {
        let Some(last) = ramp.len().checked_sub(1) else {
            return String::new();
        };

        let mut rows = Vec::with_capacity(image.height() as usize);
        for y in 0..image.height() {
            let row: String = (0..image.width())
                .map(|x| {
                    let darkness = 255 - image.get_pixel(x, y).0[0] as usize;
                    ramp[(darkness * last + 127) / 255]
                })
                .collect();
            rows.push(row);
        }
        rows.join("\n")
    }
}

/// Everything the pipeline needs besides the source image.
#[derive(Clone, Debug)]
pub struct RenderSettings<'a> {
    pub crop: Option<CropBox>,
    pub adjustments: &'a Adjustments,
    pub width: u32,
    pub height: u32,
    pub ramp: &'a str,
}

pub struct Pipeline<R = RampRenderer> {
    renderer: R,
}

impl Default for Pipeline<RampRenderer> {
    fn default() -> Self {
        Self::new(RampRenderer)
    }
}

impl<R: AsciiRenderer> Pipeline<R> {
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }

    pub fn run(&self, source: &DynamicImage, settings: &RenderSettings<'_>) -> Result<String> {
        let ramp: Vec<char> = settings.ramp.chars().collect();
        if ramp.is_empty() {
            return Err(Error::EmptyCharset);
        }

        let working = match settings.crop {
            Some(b) if b.width() > 0 && b.height() > 0 => {
                source.crop_imm(b.left, b.top, b.width(), b.height())
            }
            _ => source.clone(),
        };

        let adjusted = settings.adjustments.apply(&working);
        let (w, h) = (settings.width.max(1), settings.height.max(1));
        let resized = image::imageops::resize(&adjusted, w, h, FilterType::Lanczos3);
        let gray = DynamicImage::ImageRgb8(resized).to_luma8();

        debug!(
            "rendering {}x{} grid from {}x{} source",
            w,
            h,
            working.width(),
            working.height()
        );
        Ok(self.renderer.render(&gray, &ramp))
    }
}
