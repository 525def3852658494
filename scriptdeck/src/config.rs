//! Configuration file loading and management
//!
//! This module handles loading and parsing the configuration from
//! `$XDG_CONFIG_HOME/scriptdeck/config.toml`. If the configuration file doesn't
//! exist, a default configuration is created with documented comments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Log levels accepted by `[logging] level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Plugin script configuration
    #[serde(default)]
    pub scripts: ScriptsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Plugin script configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScriptsConfig {
    /// Directory scanned for `.rhai` plugin scripts
    /// Overridden by `scriptdeck set-dir` and by `--dir`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    /// Default: "warn"
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Plugin log file
    /// If None, uses XDG_DATA_HOME/scriptdeck/scriptdeck.log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from the specified path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default XDG config location
    ///
    /// If the configuration file doesn't exist, creates a default configuration
    /// file with documented comments.
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_or_create(&config_path)
    }

    /// Load `path`, writing the documented defaults there first if it is absent.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            Self::create_default_file(path)?;
        }

        Self::load(path)
    }

    /// Get the default configuration file path
    ///
    /// Returns `$XDG_CONFIG_HOME/scriptdeck/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Create a default configuration file with documented comments
    fn create_default_file(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, Self::default_config_content())
            .with_context(|| format!("Failed to write default config file: {}", path.display()))?;

        tracing::info!("Created default configuration file at: {}", path.display());
        Ok(())
    }

    /// Generate the default configuration file content with comments
    fn default_config_content() -> String {
        r#"# scriptdeck Configuration

[scripts]
# Directory containing .rhai plugin scripts.
# `scriptdeck set-dir <path>` stores an override that takes priority,
# and `--dir <path>` overrides both for a single invocation.
# directory = "/path/to/plugins"

[logging]
# Log level: trace, debug, info, warn, error
# RUST_LOG takes precedence when set.
# Default: "warn"
level = "warn"

# File receiving every plugin log line, regardless of level.
# If not specified, defaults to $XDG_DATA_HOME/scriptdeck/scriptdeck.log
# file = "/path/to/scriptdeck.log"
"#
        .to_string()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid log_level: {}. Must be one of: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            );
        }

        if let Some(dir) = &self.scripts.directory {
            if dir.as_os_str().is_empty() {
                anyhow::bail!("scripts.directory must not be empty");
            }
        }

        Ok(())
    }

    /// Get the plugin log file path
    ///
    /// Returns the configured file or the default XDG data directory path
    pub fn log_file_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.logging.file {
            return Ok(path.clone());
        }

        Ok(project_dirs()?.data_dir().join("scriptdeck.log"))
    }
}

/// Platform directories for scriptdeck.
pub fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "raibid-labs", "scriptdeck")
        .context("Failed to determine project directories")
}
