//! Configuration loading and management

mod settings;

pub use settings::{Settings, ValidateSettings};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub settings: Settings,

    /// Validation settings
    #[serde(default)]
    pub validate: ValidateSettings,
}

impl Config {
    /// Get the global config file path (~/.threatspec/config.toml)
    pub fn global_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".threatspec")
            .join("config.toml")
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a directory
    /// Looks for: .threatspec/config.toml (preferred), threatspec.toml,
    /// then the global config
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let local_path = dir.join(".threatspec/config.toml");
        if local_path.exists() {
            return Self::from_file(&local_path);
        }

        let flat_path = dir.join("threatspec.toml");
        if flat_path.exists() {
            return Self::from_file(&flat_path);
        }

        let global_path = Self::global_config_path();
        if global_path.exists() {
            return Self::from_file(&global_path);
        }

        Ok(Self::with_defaults())
    }

    /// Create a config with defaults
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Output file for generated documents, unless overridden on the command line
    pub fn output_path(&self, project: &str) -> PathBuf {
        match &self.settings.output {
            Some(output) => PathBuf::from(output),
            None => PathBuf::from(format!("{}.threatspec.json", project)),
        }
    }
}
