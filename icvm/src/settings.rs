use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::VmError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Print output values 0..=127 as characters
    pub ascii_output: bool,

    // Log every executed instruction
    pub trace: bool,

    // Print the exit reason after a run
    pub show_exit_reason: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ascii_output: false,
            trace: false,
            show_exit_reason: true,
        }
    }
}

impl Settings {
    /// Get the path to the settings file
    pub fn settings_path() -> PathBuf {
        // Try to use XDG config directory on Unix-like systems
        if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(config_dir).join("icvm").join("settings.json")
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".config").join("icvm").join("settings.json")
        } else {
            // Fallback to current directory
            PathBuf::from(".icvm_settings.json")
        }
    }

    /// Load settings from the default location
    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }

    /// Load settings from `path`, or return defaults if it is missing or invalid
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(settings) => return settings,
                Err(e) => log::warn!("Failed to parse settings {}: {}", path.display(), e),
            },
            Err(e) => log::warn!("Failed to read settings {}: {}", path.display(), e),
        }

        Self::default()
    }

    pub fn from_json(contents: &str) -> Result<Self, VmError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn to_json(&self) -> Result<String, VmError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save settings to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), VmError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_json()?)?;

        Ok(())
    }
}
