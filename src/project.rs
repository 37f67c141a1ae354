//! Saved workspaces: the source image, crop and every conversion setting,
//! packed into one zip archive.

use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use eframe::egui::{Rect, pos2, vec2};
use image::{DynamicImage, ImageFormat};
use log::info;
use serde::{Deserialize, Serialize};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::adjust::Adjustments;
use crate::ascii::Charset;
use crate::aspect::OutputSize;
use crate::geometry::CropBox;
use crate::{Error, Result};

pub const PROJECT_VERSION: u32 = 1;
pub const PROJECT_EXTENSION: &str = "asciigen";

const MANIFEST_ENTRY: &str = "project.json";
const SOURCE_ENTRY: &str = "source.png";

/// Selection in image pixels, as plain numbers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedSelection {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SavedSelection {
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            x: rect.min.x,
            y: rect.min.y,
            width: rect.width(),
            height: rect.height(),
        }
    }

    pub fn to_rect(self) -> Rect {
        Rect::from_min_size(pos2(self.x, self.y), vec2(self.width, self.height))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub version: u32,
    /// Where the image was first opened from. Only read back when the
    /// archive carries no embedded image.
    pub source: Option<PathBuf>,
    pub selection: Option<SavedSelection>,
    /// Pixel box actually used for conversion; written for other tools,
    /// ignored on load.
    pub crop_box: Option<CropBox>,
    pub adjustments: Adjustments,
    pub output: OutputSize,
    pub charset: Charset,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            version: PROJECT_VERSION,
            source: None,
            selection: None,
            crop_box: None,
            adjustments: Adjustments::default(),
            output: OutputSize::default(),
            charset: Charset::default(),
        }
    }
}

impl Project {
    /// Writes the manifest and, when given, the source image as PNG.
    pub fn save(&self, path: &Path, image: Option<&DynamicImage>) -> Result<()> {
        let mut zip = ZipWriter::new(File::create(path)?);

        zip.start_file(
            MANIFEST_ENTRY,
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        )?;
        zip.write_all(serde_json::to_string_pretty(self)?.as_bytes())?;

        if let Some(image) = image {
            let mut png = Vec::new();
            image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
            // already compressed
            zip.start_file(
                SOURCE_ENTRY,
                SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
            )?;
            zip.write_all(&png)?;
        }

        zip.finish()?;
        info!("project saved to {}", path.display());
        Ok(())
    }

    /// Reads a project and its image: the embedded copy if present, else the
    /// file at `source`. An image that cannot be restored fails the whole
    /// load. Values outside the editable ranges are clamped.
    pub fn load(path: &Path) -> Result<(Self, Option<DynamicImage>)> {
        let mut archive = ZipArchive::new(File::open(path)?)?;

        let mut manifest = String::new();
        archive
            .by_name(MANIFEST_ENTRY)?
            .read_to_string(&mut manifest)?;
        let mut project: Project = serde_json::from_str(&manifest)?;
        if project.version != PROJECT_VERSION {
            return Err(Error::ProjectVersion(project.version));
        }
        project.adjustments = project.adjustments.clamped();
        project.output = project.output.clamped();

        let image = match archive.by_name(SOURCE_ENTRY) {
            Ok(mut entry) => {
                let mut bytes = Vec::new();
                entry.read_to_end(&mut bytes)?;
                Some(image::load_from_memory_with_format(&bytes, ImageFormat::Png)?)
            }
            Err(ZipError::FileNotFound) => match &project.source {
                Some(source) => Some(image::open(source)?),
                None => None,
            },
            Err(e) => return Err(e.into()),
        };

        info!("project loaded from {}", path.display());
        Ok((project, image))
    }
}
