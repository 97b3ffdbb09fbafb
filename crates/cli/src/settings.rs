use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use blinkwatch_core::blink::domain::blink_event::BlinkEye;
use blinkwatch_core::pipeline::processor_config::ProcessorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Text,
    Json,
}

/// Which blink events get printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BlinkPolicy {
    /// Left and right eye events only.
    PerEye,
    /// Only blinks where both eyes closed together.
    Both,
    All,
}

impl BlinkPolicy {
    pub fn accepts(&self, eye: BlinkEye) -> bool {
        match self {
            BlinkPolicy::PerEye => eye != BlinkEye::Both,
            BlinkPolicy::Both => eye == BlinkEye::Both,
            BlinkPolicy::All => true,
        }
    }
}

/// Settings file contents. Missing keys fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub processor: ProcessorConfig,
    pub format: OutputFormat,
    pub blink_policy: BlinkPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            processor: ProcessorConfig::default(),
            format: OutputFormat::Text,
            blink_policy: BlinkPolicy::Both,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("blinkwatch").join("settings.json"))
    }

    /// Loads an explicitly requested settings file. Unlike `load`, a missing
    /// or malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read settings {}: {e}", path.display()))?;
        let settings = serde_json::from_str(&json)
            .map_err(|e| format!("Invalid settings {}: {e}", path.display()))?;
        Ok(settings)
    }

    /// Loads the per-user settings file, falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => {
                log::debug!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }
}
