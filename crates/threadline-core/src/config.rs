//! Configuration for thread handling
//!
//! Loaded from an optional YAML file, then overridden by `THREADLINE_*`
//! environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{ThreadError, ThreadResult};

/// Thread handling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadConfig {
    /// Folder new notes are created in (vault-relative)
    #[serde(default = "default_notes_folder")]
    pub notes_folder: String,

    /// Metadata key holding the predecessor reference
    #[serde(default = "default_prev_property")]
    pub prev_property: String,

    /// Metadata key holding the main-thread marker
    #[serde(default = "default_main_thread_property")]
    pub main_thread_property: String,

    /// Document extension, without the dot
    #[serde(default = "default_extension")]
    pub default_extension: String,

    /// Trailing blank lines that trigger an insertion
    #[serde(default = "default_trigger_blank_lines")]
    pub trigger_blank_lines: usize,
}

fn default_notes_folder() -> String {
    "threads".to_string()
}

fn default_prev_property() -> String {
    "prev".to_string()
}

fn default_main_thread_property() -> String {
    "main_thread".to_string()
}

fn default_extension() -> String {
    "md".to_string()
}

fn default_trigger_blank_lines() -> usize {
    5
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            notes_folder: default_notes_folder(),
            prev_property: default_prev_property(),
            main_thread_property: default_main_thread_property(),
            default_extension: default_extension(),
            trigger_blank_lines: default_trigger_blank_lines(),
        }
    }
}

impl ThreadConfig {
    /// Parse configuration from YAML; missing fields take their defaults
    pub fn from_yaml_str(yaml: &str) -> ThreadResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
            .map_err(|e| ThreadError::Configuration(format!("invalid YAML: {}", e)))
    }

    /// Load configuration from an optional file plus environment overrides
    pub fn load(path: Option<&Path>) -> ThreadResult<Self> {
        let mut config = match path {
            Some(path) => {
                let yaml = std::fs::read_to_string(path).map_err(|e| {
                    ThreadError::Configuration(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::from_yaml_str(&yaml)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;

        info!(notes_folder = %config.notes_folder, "Loaded thread configuration");
        Ok(config)
    }

    /// Apply `THREADLINE_*` environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Ok(folder) = env::var("THREADLINE_NOTES_FOLDER") {
            self.notes_folder = folder;
        }

        if let Ok(key) = env::var("THREADLINE_PREV_PROPERTY") {
            self.prev_property = key;
        }

        if let Ok(key) = env::var("THREADLINE_MAIN_THREAD_PROPERTY") {
            self.main_thread_property = key;
        }

        if let Ok(ext) = env::var("THREADLINE_DEFAULT_EXTENSION") {
            self.default_extension = ext;
        }

        if let Ok(lines) = env::var("THREADLINE_TRIGGER_BLANK_LINES") {
            if let Ok(lines) = lines.parse::<usize>() {
                self.trigger_blank_lines = lines;
            } else {
                warn!("Invalid THREADLINE_TRIGGER_BLANK_LINES value: {}", lines);
            }
        }
    }

    /// Reject values the rest of the system cannot work with
    pub fn validate(&self) -> ThreadResult<()> {
        if self.prev_property.trim().is_empty() {
            return Err(ThreadError::Configuration(
                "prev_property must not be empty".to_string(),
            ));
        }

        if self.main_thread_property.trim().is_empty() {
            return Err(ThreadError::Configuration(
                "main_thread_property must not be empty".to_string(),
            ));
        }

        if self.prev_property == self.main_thread_property {
            return Err(ThreadError::Configuration(
                "prev_property and main_thread_property must differ".to_string(),
            ));
        }

        let extension = &self.default_extension;
        if extension.is_empty() || extension.contains(['/', '.']) {
            return Err(ThreadError::Configuration(format!(
                "invalid default_extension: {:?}",
                self.default_extension
            )));
        }

        if self.trigger_blank_lines == 0 {
            return Err(ThreadError::Configuration(
                "trigger_blank_lines must be at least 1".to_string(),
            ));
        }

        if self.notes_folder.starts_with('/') || self.notes_folder.split('/').any(|s| s == "..") {
            return Err(ThreadError::Configuration(format!(
                "notes_folder must be vault-relative: {}",
                self.notes_folder
            )));
        }

        Ok(())
    }
}
