//! # Configuration
//!
//! Optional `stagewise.toml`, layered as: built-in defaults, then the file,
//! then environment variables.
//!
//! ```toml
//! [logging]
//! format = "json"          # "text" (default) or "json"
//! filter = "stagewise=debug"
//!
//! [display]
//! precision = 4            # decimal places for sub-progress
//! clamp = true             # show progress clamped to [0, 1]
//! ```
//!
//! ## Environment
//!
//! - `STAGEWISE_LOG_FORMAT` overrides `logging.format`
//! - `STAGEWISE_LOG` overrides `logging.filter`
//! - `RUST_LOG`, when set, wins over both filters at subscriber setup

use serde::{Deserialize, Serialize};
use stagewise_core::ProgressError;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "stagewise.toml";

/// Largest accepted config file (64 KB).
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

/// Highest `display.precision` accepted. f64 carries ~15 significant digits.
pub const MAX_DISPLAY_PRECISION: usize = 15;

const DEFAULT_FILTER: &str = "stagewise=info";
const VERBOSE_FILTER: &str = "stagewise=debug";

// =============================================================================
// SECTIONS
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ProgressError::Configuration(format!(
                "Unknown log format: {}. Use: text, json",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive. `None` means the built-in default.
    pub filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    pub precision: usize,
    pub clamp: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            precision: 4,
            clamp: true,
        }
    }
}

impl DisplayConfig {
    /// Format a sub-progress value with the configured precision.
    pub fn format_progress(&self, value: f64) -> String {
        format!("{:.*}", self.precision, value)
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub logging: LoggingConfig,
    pub display: DisplayConfig,
}

impl Config {
    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ProgressError> {
        let config: Config = toml::from_str(text)
            .map_err(|e| ProgressError::Configuration(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from disk.
    ///
    /// An explicit path must exist. Without one, `stagewise.toml` in the
    /// working directory is used if present, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ProgressError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let metadata = std::fs::metadata(&path).map_err(|e| {
            ProgressError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ProgressError::Configuration(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(&path).map_err(|e| {
            ProgressError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ProgressError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(format) = lookup("STAGEWISE_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }
        if let Some(filter) = lookup("STAGEWISE_LOG").filter(|f| !f.trim().is_empty()) {
            self.logging.filter = Some(filter);
        }
        self.validate()?;
        Ok(self)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ProgressError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Filter directive used when `RUST_LOG` is unset.
    pub fn filter_directive(&self, verbose: bool) -> String {
        match &self.logging.filter {
            Some(filter) => filter.clone(),
            None if verbose => VERBOSE_FILTER.to_string(),
            None => DEFAULT_FILTER.to_string(),
        }
    }

    fn validate(&self) -> Result<(), ProgressError> {
        if self.display.precision > MAX_DISPLAY_PRECISION {
            return Err(ProgressError::Configuration(format!(
                "display.precision {} exceeds maximum {}",
                self.display.precision, MAX_DISPLAY_PRECISION
            )));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
