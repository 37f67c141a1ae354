//! Image to ASCII art conversion with an interactive crop inspector.

pub mod adjust;
pub mod app;
pub mod ascii;
pub mod aspect;
pub mod clipboard;
pub mod debounce;
pub mod editor;
pub mod export;
pub mod geometry;
pub mod project;
pub mod settings;

pub use adjust::Adjustments;
pub use ascii::{AsciiRenderer, Charset, CharsetPreset, Pipeline, RampRenderer};
pub use aspect::OutputSize;
pub use editor::{CropEditor, Interaction};
pub use geometry::{CropBox, ImageBounds, ViewTransform};
pub use hit_test::{Handle, HitArea};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Project file error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Project archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Clipboard error: {0}")]
    Clipboard(#[from] arboard::Error),
    #[error("Charset ramp is empty")]
    EmptyCharset,
    #[error("Unsupported project version {0}")]
    ProjectVersion(u32),
    #[error("Export of {width}x{height} pixels exceeds the {limit} pixel limit")]
    ExportTooLarge { width: u32, height: u32, limit: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
