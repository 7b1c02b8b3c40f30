use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use transaction::RefinerConfig;

use crate::paths;

// ============================================================================
// Config Schema
// ============================================================================

/// The txplan configuration (`config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Plugin types and platform naming used when reordering local installs
    pub refiner: RefinerConfig,

    /// Output preferences
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Config {
    /// Load config from an explicit path, or from the default location.
    ///
    /// An explicit path must exist. A missing default config file means
    /// defaults.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load_from(path)?, Some(path.to_path_buf())));
        }

        let path = paths::config_file()?;
        if !path.exists() {
            log::debug!("Config file {} does not exist, using defaults", path.display());
            return Ok((Self::default(), None));
        }
        Ok((Self::load_from(&path)?, Some(path)))
    }

    /// Load config from a TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config format in {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

// ============================================================================
// Tests
// ============================================================================
