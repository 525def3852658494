//! Plugin registry for one scan of a script directory.
//!
//! The registry holds the plugins that passed validation, in sorted filename
//! order, plus the rejections encountered along the way.

use crate::plugin::{load_plugin, LoadOutcome, LoadedPlugin, RejectReason, Rejection};
use scriptdeck_runtime::{read_source, script_files, PluginLogger, RuntimeError, ScriptDirectory};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Loaded plugins of one scan.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<LoadedPlugin>,
    rejected: Vec<Rejection>,
}

impl PluginRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `dir` and load every script in it.
    ///
    /// A missing directory is logged and yields an empty registry. Scripts
    /// that fail to load are logged and recorded, and the scan moves on.
    pub fn scan(dir: &Path, store: &dyn ScriptDirectory, logger: Arc<dyn PluginLogger>) -> Self {
        let mut registry = Self::new();

        let files = match script_files(store, dir) {
            Ok(files) => files,
            Err(RuntimeError::DirectoryNotFound(path)) => {
                logger.warn(&format!("Directory not found: {}", path.display()));
                return registry;
            }
            Err(err) => {
                logger.error(&format!("Could not list {}: {}", dir.display(), err));
                return registry;
            }
        };
        debug!(dir = %dir.display(), count = files.len(), "Discovered scripts");

        for filename in files {
            logger.log(&format!("Loading script execution for {}", filename));

            let source = match read_source(store, dir, &filename) {
                Ok(source) => source,
                Err(err) => {
                    logger.error(&format!("Error reading script {}: {}", filename, err));
                    continue;
                }
            };

            match load_plugin(source, Arc::clone(&logger)) {
                LoadOutcome::Loaded(plugin) => registry.register(plugin),
                LoadOutcome::Rejected(rejection) => registry.reject(rejection, logger.as_ref()),
            }
        }

        info!(
            "Loaded {} plugins ({} rejected)",
            registry.len(),
            registry.rejected.len()
        );
        registry
    }

    fn register(&mut self, plugin: LoadedPlugin) {
        if self.plugins.iter().any(|p| p.filename() == plugin.filename()) {
            debug!(plugin = %plugin.filename(), "Skipping duplicate script");
            return;
        }
        info!(plugin = %plugin.filename(), "Registered plugin: {}", plugin.name());
        self.plugins.push(plugin);
    }

    fn reject(&mut self, rejection: Rejection, logger: &dyn PluginLogger) {
        match &rejection.reason {
            RejectReason::ContractMissing(missing) => logger.warn(&format!(
                "Script {} does not export the required functions ({})",
                rejection.filename, missing
            )),
            reason => logger.error(&format!(
                "Error executing script {}: {}",
                rejection.filename, reason
            )),
        }
        self.rejected.push(rejection);
    }

    /// First plugin whose display name or filename equals `query`, ignoring
    /// case.
    pub fn find(&self, query: &str) -> Option<&LoadedPlugin> {
        let query = query.trim().to_lowercase();
        self.plugins.iter().find(|p| {
            p.name().to_lowercase() == query || p.filename().to_lowercase() == query
        })
    }

    /// Plugin at `index` in scan order.
    pub fn get(&self, index: usize) -> Option<&LoadedPlugin> {
        self.plugins.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadedPlugin> {
        self.plugins.iter()
    }

    /// Number of loaded plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn plugins(&self) -> &[LoadedPlugin] {
        &self.plugins
    }

    /// Scripts that failed to load, in scan order.
    pub fn rejections(&self) -> &[Rejection] {
        &self.rejected
    }

    /// List plugin information.
    pub fn list_plugins(&self) -> Vec<PluginInfo> {
        self.plugins
            .iter()
            .map(|p| PluginInfo {
                name: p.name().to_string(),
                filename: p.filename().to_string(),
                list_export: p.contract().list_export().to_string(),
            })
            .collect()
    }
}

/// Information about a loaded plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub filename: String,
    pub list_export: String,
}
