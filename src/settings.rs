//! User preferences persisted between sessions.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::export::ExportFormat;

const SETTINGS_FILE: &str = "settings.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory of the last opened image, used as the dialog start.
    pub last_dir: Option<PathBuf>,
    pub export_format: ExportFormat,
    pub font_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_dir: None,
            export_format: ExportFormat::Png,
            font_size: 12,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "example", "asciigen").map(|d| d.config_dir().join(SETTINGS_FILE))
    }

    /// Loads from the platform config dir. Problems are logged and yield
    /// defaults.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            warn!("no config directory available, using default settings");
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("ignoring unreadable settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("no settings at {}", path.display());
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn save(&self) -> Result<()> {
        match Self::default_path() {
            Some(path) => self.save_to(&path),
            None => Ok(()),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn remember_dir_of(&mut self, file: &Path) {
        self.last_dir = file.parent().map(Path::to_path_buf);
    }
}
