//! Run settings
//!
//! Persisted as JSON, by default at `<config dir>/batchconvert/settings.json`.
//! Every field has a default, so a partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::conversion::Format;
use crate::error::{Error, Result};

/// Names of the per-format source folders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFolders {
    pub wav: String,
    pub mp3: String,
    pub flac: String,
}

impl Default for SourceFolders {
    fn default() -> Self {
        Self {
            wav: "2wav".to_string(),
            mp3: "2mp3".to_string(),
            flac: "2flac".to_string(),
        }
    }
}

/// External tool binaries, looked up on PATH unless absolute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub flac: String,
    pub lame: String,
    pub sox: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            flac: "flac".to_string(),
            lame: "lame".to_string(),
            sox: "sox".to_string(),
        }
    }
}

/// Extra options passed through to the tool for each target format
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraOptions {
    pub wav: Vec<String>,
    pub mp3: Vec<String>,
    pub flac: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the source folders and the done tree
    pub base_dir: PathBuf,
    /// Done tree root, relative to `base_dir` unless absolute
    pub done_dir: PathBuf,
    pub source_folders: SourceFolders,
    /// Extension of cover images placed next to audio files
    pub cover_extension: String,
    pub tools: ToolPaths,
    /// Default lame quality option
    pub mp3_quality: String,
    pub extra_options: ExtraOptions,
    /// Added to the CPU count to size the worker pool
    pub jobs_adjustment: i32,
    /// Move sources into the done tree even when their conversion failed
    pub relocate_failed: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            done_dir: PathBuf::from("done"),
            source_folders: SourceFolders::default(),
            cover_extension: "jpg".to_string(),
            tools: ToolPaths::default(),
            mp3_quality: "-V2".to_string(),
            extra_options: ExtraOptions::default(),
            jobs_adjustment: 0,
            relocate_failed: false,
        }
    }
}

impl Settings {
    const SETTINGS_FILE: &'static str = "settings.json";

    /// Default settings file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("batchconvert").join(Self::SETTINGS_FILE))
    }

    /// Load settings from the default location, or return defaults
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            log::debug!("No config directory, using default settings");
            return Self::default();
        };
        if !path.exists() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => {
                log::debug!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings: {}", e);
                Self::default()
            }
        }
    }

    /// Load settings from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Settings {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&contents).map_err(|e| Error::Settings {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn source_folder(&self, format: Format) -> &str {
        match format {
            Format::Wav => &self.source_folders.wav,
            Format::Mp3 => &self.source_folders.mp3,
            Format::Flac => &self.source_folders.flac,
        }
    }

    pub fn source_dir(&self, format: Format) -> PathBuf {
        self.base_dir.join(self.source_folder(format))
    }

    pub fn done_root(&self) -> PathBuf {
        self.base_dir.join(&self.done_dir)
    }

    pub fn extra_options(&self, format: Format) -> &[String] {
        match format {
            Format::Wav => &self.extra_options.wav,
            Format::Mp3 => &self.extra_options.mp3,
            Format::Flac => &self.extra_options.flac,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.source_folder(Format::Mp3), "2mp3");
        assert_eq!(settings.source_dir(Format::Flac), PathBuf::from("./2flac"));
        assert_eq!(settings.done_root(), PathBuf::from("./done"));
        assert_eq!(settings.mp3_quality, "-V2");
        assert!(!settings.relocate_failed);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{ "jobs_adjustment": -2, "tools": { "lame": "/opt/bin/lame" } }"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();

        assert_eq!(settings.jobs_adjustment, -2);
        assert_eq!(settings.tools.lame, "/opt/bin/lame");
        assert_eq!(settings.tools.flac, "flac");
        assert_eq!(settings.cover_extension, "jpg");
    }

    #[test]
    fn test_absolute_done_dir_overrides_base() {
        let settings = Settings {
            base_dir: PathBuf::from("/music"),
            done_dir: PathBuf::from("/archive/done"),
            ..Settings::default()
        };
        assert_eq!(settings.done_root(), PathBuf::from("/archive/done"));
    }

    #[test]
    fn test_invalid_file_is_a_settings_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Settings { .. }));
        assert_eq!(err.exit_code(), 2);
    }
}
