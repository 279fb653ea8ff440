//! Application configuration

use crate::invoice::DEFAULT_DUE_IN_DAYS;
use crate::stt::Language;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "voice-invoice.json";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Cannot write config {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Rule locale: "auto", "en" or "fr"
    #[serde(default = "default_language")]
    pub language: String,
    /// Payment terms for new invoices, in days
    #[serde(default = "default_due_in_days")]
    pub due_in_days: u32,
    #[serde(default = "default_feedback_capacity")]
    pub feedback_capacity: usize,
    #[serde(default = "default_segment_queue")]
    pub segment_queue: usize,
}

fn default_language() -> String {
    "auto".to_string()
}

fn default_due_in_days() -> u32 {
    DEFAULT_DUE_IN_DAYS
}

fn default_feedback_capacity() -> usize {
    100
}

fn default_segment_queue() -> usize {
    32
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            due_in_days: default_due_in_days(),
            feedback_capacity: default_feedback_capacity(),
            segment_queue: default_segment_queue(),
        }
    }
}

impl AppConfig {
    /// Config file path in the working directory
    pub fn default_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE)
    }

    /// Load config from disk, or return defaults
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(config) => {
                tracing::info!("Config loaded from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Load config from disk, failing on a missing or invalid file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save config to disk
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Config saved to {}", path.display());
        Ok(())
    }

    /// Configured rule locale
    pub fn language(&self) -> Language {
        Language::from_code(&self.language)
    }
}
