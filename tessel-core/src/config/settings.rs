//! Settings loaded from TOML files.
//!
//! Non-sensitive configuration lives in the XDG config directory
//! (`~/.config/tessel/config.toml`). A missing file yields defaults.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::rag::RagSettings;

/// User-facing settings loaded from the TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub rag: RagSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("could not determine config directory")]
    MissingConfigDir,
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Settings {
    /// Load settings from the config file, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self, SettingsError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load settings from an explicit path. Missing file yields defaults.
    pub fn load_from(path: &PathBuf) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.clone(),
            source,
        })
    }

    /// Path of the TOML config file (`~/.config/tessel/config.toml`).
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        let dir = dirs::config_dir().ok_or(SettingsError::MissingConfigDir)?;
        Ok(dir.join("tessel").join("config.toml"))
    }
}
