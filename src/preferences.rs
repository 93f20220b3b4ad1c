//! User toggles that outlive a session, stored as JSON in the data dir.

use crate::config::{self, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Preferences {
    /// Animations and depth blur. When off, transitions jump.
    pub visual_effects: bool,
    pub show_captions: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            visual_effects: true,
            show_captions: true,
        }
    }
}

#[derive(Error, Debug)]
pub enum PreferencesError {
    #[error("Failed to locate data directory: {0}")]
    Dirs(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed preferences: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn get_preferences_path() -> Result<PathBuf, PreferencesError> {
    Ok(config::project_dirs()?.data_dir().join("preferences.json"))
}

impl Preferences {
    pub fn load_from(path: &Path) -> Result<Self, PreferencesError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs_err::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), PreferencesError> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }
        fs_err::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load() -> Self {
        get_preferences_path()
            .and_then(|path| Self::load_from(&path))
            .unwrap_or_else(|e| {
                log::warn!("Failed to load preferences, using defaults: {}", e);
                Self::default()
            })
    }

    pub fn save(&self) {
        if let Err(e) = get_preferences_path().and_then(|path| self.save_to(&path)) {
            log::error!("Failed to save preferences: {}", e);
        }
    }

    pub fn toggle_effects(&mut self) -> bool {
        self.visual_effects = !self.visual_effects;
        self.visual_effects
    }

    pub fn toggle_captions(&mut self) -> bool {
        self.show_captions = !self.show_captions;
        self.show_captions
    }
}
