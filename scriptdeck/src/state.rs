//! Local state persisted between runs.
//!
//! The only state kept today is the scripts directory chosen with
//! `scriptdeck set-dir`, stored in `$XDG_DATA_HOME/scriptdeck/state.toml`.

use crate::config::{project_dirs, Config};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// State written by the CLI itself, as opposed to user configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LocalState {
    /// Directory override chosen with `set-dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts_directory: Option<PathBuf>,
}

impl LocalState {
    /// Load state from `path`. A missing file is an empty state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))
    }

    /// Load state from `path`, starting over from an empty state when the
    /// file cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("Ignoring unusable state file: {:#}", e);
            Self::default()
        })
    }

    /// Write state to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize state")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))
    }

    /// Returns `$XDG_DATA_HOME/scriptdeck/state.toml`
    pub fn default_path() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().join("state.toml"))
    }

    /// Remember `dir` as the scripts directory.
    ///
    /// The path is trimmed and must name an existing directory.
    pub fn set_scripts_directory(&mut self, dir: &str) -> Result<PathBuf> {
        let dir = PathBuf::from(dir.trim());
        if !dir.is_dir() {
            anyhow::bail!("Directory does not exist: {}", dir.display());
        }

        self.scripts_directory = Some(dir.clone());
        Ok(dir)
    }
}

/// Pick the scripts directory for this run.
///
/// Priority: the `--dir` flag, then the stored override, then the
/// configured directory.
pub fn resolve_scripts_directory(
    flag: Option<&Path>,
    state: &LocalState,
    config: &Config,
) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| state.scripts_directory.clone())
        .or_else(|| config.scripts.directory.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_state_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let state = LocalState::load(&temp_dir.path().join("state.toml")).unwrap();
        assert_eq!(state, LocalState::default());
    }

    #[test]
    fn test_corrupt_state_can_be_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.toml");
        fs::write(&path, "scripts_directory = [unterminated").unwrap();
        assert!(LocalState::load(&path).is_err());

        let mut state = LocalState::load_or_default(&path);
        assert_eq!(state, LocalState::default());

        state
            .set_scripts_directory(&temp_dir.path().display().to_string())
            .unwrap();
        state.save(&path).unwrap();
        assert_eq!(LocalState::load(&path).unwrap(), state);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("state.toml");
        let plugins = temp_dir.path().join("plugins");
        fs::create_dir(&plugins).unwrap();

        let mut state = LocalState::default();
        let stored = state
            .set_scripts_directory(&format!("  {}  ", plugins.display()))
            .unwrap();
        state.save(&path).unwrap();

        assert_eq!(stored, plugins);
        assert_eq!(LocalState::load(&path).unwrap(), state);
    }

    #[test]
    fn test_set_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = LocalState::default();

        let missing = temp_dir.path().join("missing");
        assert!(state
            .set_scripts_directory(&missing.display().to_string())
            .is_err());
        assert!(state.scripts_directory.is_none());
    }

    #[test]
    fn test_resolve_priority() {
        let mut config = Config::default();
        config.scripts.directory = Some(PathBuf::from("/from/config"));
        let state = LocalState {
            scripts_directory: Some(PathBuf::from("/from/state")),
        };

        assert_eq!(
            resolve_scripts_directory(Some(Path::new("/from/flag")), &state, &config),
            Some(PathBuf::from("/from/flag"))
        );
        assert_eq!(
            resolve_scripts_directory(None, &state, &config),
            Some(PathBuf::from("/from/state"))
        );
        assert_eq!(
            resolve_scripts_directory(None, &LocalState::default(), &config),
            Some(PathBuf::from("/from/config"))
        );
        assert_eq!(
            resolve_scripts_directory(None, &LocalState::default(), &Config::default()),
            None
        );
    }
}
