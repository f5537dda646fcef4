//! Persisted viewer preferences.
//!
//! Stored as JSON under the platform config directory. A missing or corrupt
//! file yields default settings rather than an error.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

const APP_DIR: &str = "parquet-media-viewer";
const SETTINGS_FILE: &str = "settings.json";

/// Last known window position and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub last_file: Option<PathBuf>,
    /// Directory the file picker starts in.
    pub last_dir: Option<PathBuf>,
    pub geometry: Option<WindowGeometry>,
}

impl Settings {
    /// Remembers a successfully opened dataset and its directory.
    pub fn record_opened_file(&mut self, path: &Path) {
        let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.last_dir = path.parent().map(Path::to_path_buf);
        self.last_file = Some(path);
    }
}

/// Reads and writes [`Settings`] at a fixed location.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store in the user's config directory, falling back to the home directory.
    pub fn new() -> Self {
        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::at(base.join(APP_DIR).join(SETTINGS_FILE))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Settings {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                debug!("No settings at {}: {}", self.path.display(), e);
                return Settings::default();
            }
        };

        match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring corrupt settings {}: {}", self.path.display(), e);
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Settings(format!("{}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)
            .map_err(|e| AppError::Settings(format!("{}: {}", self.path.display(), e)))?;
        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join("nested").join("settings.json"));

        let settings = Settings {
            last_file: Some(PathBuf::from("/data/a.parquet")),
            last_dir: Some(PathBuf::from("/data")),
            geometry: Some(WindowGeometry {
                x: 10,
                y: 20,
                width: 1200,
                height: 800,
            }),
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn missing_or_corrupt_files_give_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join("settings.json"));
        assert_eq!(store.load(), Settings::default());

        fs::write(store.path(), "{ not json").unwrap();
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn unknown_and_missing_keys_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join("settings.json"));
        fs::write(store.path(), r#"{"last_dir": "/tmp", "theme": "dark"}"#).unwrap();

        let settings = store.load();
        assert_eq!(settings.last_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(settings.last_file, None);
    }

    #[test]
    fn records_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.parquet");
        fs::write(&file, b"").unwrap();

        let mut settings = Settings::default();
        settings.record_opened_file(&file);
        let canonical = fs::canonicalize(&file).unwrap();
        assert_eq!(settings.last_file.as_deref(), Some(canonical.as_path()));
        assert_eq!(settings.last_dir.as_deref(), canonical.parent());
    }
}
