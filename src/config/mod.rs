//! Application Configuration
//!
//! User settings stored in TOML format. Every section and key is optional in the
//! file; missing values fall back to their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analysis::RuleSpec;
use crate::vision::DEFAULT_MIN_CONFIDENCE;

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Field extraction settings
    pub extraction: ExtractionSettings,
    /// Object detector settings
    pub detector: DetectorSettings,
    /// Output settings
    pub output: OutputSettings,
}

/// Field extraction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Minimum detection confidence for a region of interest (0.0 - 1.0)
    pub min_confidence: f32,
    /// Additional rules appended after the built-in rules of their field
    pub extra_rules: Vec<RuleSpec>,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            extra_rules: Vec::new(),
        }
    }
}

/// Object detector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// Square model input size in pixels
    pub input_size: u32,
    /// Camera sensor rotation relative to the screen, in degrees
    pub sensor_orientation: i32,
    /// Keep aspect ratio when scaling frames to the model input
    pub maintain_aspect: bool,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            input_size: 640,
            sensor_orientation: 0,
            maintain_aspect: true,
        }
    }
}

/// How extracted records are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// JSON object with all record keys
    #[default]
    Json,
    /// One `key: value` line per field
    Text,
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Output format
    pub format: OutputFormat,
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
            pretty: true,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
