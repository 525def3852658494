//! One CLI run: a scanned directory and the host driving its plugins.

use crate::config::Config;
use crate::logger::FileLogger;
use crate::state::{resolve_scripts_directory, LocalState};
use anyhow::{Context, Result};
use scriptdeck_plugin_api::{LoadedPlugin, PluginHost, PluginItem, PluginRegistry};
use scriptdeck_runtime::PluginLogger;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Scanned plugins of one scripts directory.
pub struct Session {
    dir: PathBuf,
    host: PluginHost,
    registry: PluginRegistry,
}

impl Session {
    /// Scan `dir` with a host logging through `logger`.
    pub fn open(dir: &Path, logger: Arc<dyn PluginLogger>) -> Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!("Directory not found: {}", dir.display());
        }

        let host = PluginHost::new(logger);
        let registry = host.scan(dir);
        debug!(dir = %dir.display(), plugins = registry.len(), "Session opened");

        Ok(Self {
            dir: dir.to_path_buf(),
            host,
            registry,
        })
    }

    /// Resolve the scripts directory from `flag`, the state stored at
    /// `state_path` and `config`, then open it with a [`FileLogger`].
    pub fn open_configured(flag: Option<&Path>, config: &Config, state_path: &Path) -> Result<Self> {
        let state = LocalState::load(state_path)?;
        let dir = resolve_scripts_directory(flag, &state, config)
            .context("No scripts directory configured; run `scriptdeck set-dir <path>`")?;

        let log_path = config.log_file_path()?;
        debug!("Plugin log file: {}", log_path.display());
        let logger: Arc<dyn PluginLogger> = Arc::new(FileLogger::new(log_path));
        Self::open(&dir, logger)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn host(&self) -> &PluginHost {
        &self.host
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Plugin matching `query` by display name or filename.
    pub fn plugin(&self, query: &str) -> Result<&LoadedPlugin> {
        self.registry
            .find(query)
            .with_context(|| format!("No plugin named '{}' in {}", query, self.dir.display()))
    }
}

/// Pick an item by 1-based position or by name, ignoring case.
pub fn select_item<'a>(items: &'a [PluginItem], query: &str) -> Option<&'a PluginItem> {
    let query = query.trim();

    if let Ok(position) = query.parse::<usize>() {
        if let Some(item) = position.checked_sub(1).and_then(|index| items.get(index)) {
            return Some(item);
        }
    }

    let query = query.to_lowercase();
    items.iter().find(|item| item.name().to_lowercase() == query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhai::{Dynamic, Map};

    fn named(name: &str) -> PluginItem {
        let mut map = Map::new();
        map.insert("name".into(), Dynamic::from(name.to_string()));
        PluginItem::from_map(map)
    }

    #[test]
    fn test_select_by_position() {
        let items = vec![named("zsh"), named("vim")];

        assert_eq!(select_item(&items, "2").unwrap().name(), "vim");
        assert!(select_item(&items, "0").is_none());
        assert!(select_item(&items, "3").is_none());
    }

    #[test]
    fn test_select_by_name() {
        let items = vec![named("zsh"), named("Vim")];

        assert_eq!(select_item(&items, " vim ").unwrap().name(), "Vim");
        assert!(select_item(&items, "emacs").is_none());
    }

    #[test]
    fn test_numeric_name_falls_back_to_name() {
        let items = vec![named("2048")];
        assert_eq!(select_item(&items, "2048").unwrap().name(), "2048");
    }

    #[test]
    fn test_open_missing_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let logger: Arc<dyn PluginLogger> = Arc::new(scriptdeck_runtime::MemoryLogger::new());

        let result = Session::open(&temp_dir.path().join("missing"), logger);
        assert!(result.is_err());
    }
}
