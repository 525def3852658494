//! Host-side entry point for presentation layers.
//!
//! `PluginHost` owns the collaborators a scan and its later invocations
//! share: the logger every plugin writes to and the directory store scripts
//! are read from.

use crate::invoke::{self, ActionError, ListingError, PluginInvoker};
use crate::item::PluginItem;
use crate::plugin::LoadedPlugin;
use crate::registry::PluginRegistry;
use async_trait::async_trait;
use scriptdeck_runtime::{FsScriptDirectory, PluginLogger, ScriptDirectory, TracingLogger};
use std::path::Path;
use std::sync::Arc;

/// Scans script directories and drives the loaded plugins.
#[derive(Clone)]
pub struct PluginHost {
    logger: Arc<dyn PluginLogger>,
    directory: Arc<dyn ScriptDirectory>,
}

impl PluginHost {
    /// Host reading from the filesystem and logging through `logger`.
    pub fn new(logger: Arc<dyn PluginLogger>) -> Self {
        Self {
            logger,
            directory: Arc::new(FsScriptDirectory),
        }
    }

    /// Replace the directory store.
    pub fn with_directory(mut self, directory: Arc<dyn ScriptDirectory>) -> Self {
        self.directory = directory;
        self
    }

    pub fn logger(&self) -> &Arc<dyn PluginLogger> {
        &self.logger
    }

    /// Build a fresh registry from `dir`.
    pub fn scan(&self, dir: &Path) -> PluginRegistry {
        PluginRegistry::scan(dir, self.directory.as_ref(), Arc::clone(&self.logger))
    }
}

impl Default for PluginHost {
    fn default() -> Self {
        Self::new(Arc::new(TracingLogger))
    }
}

#[async_trait]
impl PluginInvoker for PluginHost {
    async fn list(&self, plugin: &LoadedPlugin) -> Result<Vec<PluginItem>, ListingError> {
        invoke::list(plugin, &self.logger).await
    }

    async fn act(&self, plugin: &LoadedPlugin, item: &PluginItem) -> Result<(), ActionError> {
        invoke::act(plugin, item, &self.logger).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptdeck_runtime::{LogLevel, MemoryLogger, RuntimeResult};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    /// In-memory script directory.
    struct MemoryDirectory {
        root: PathBuf,
        files: BTreeMap<String, String>,
    }

    impl ScriptDirectory for MemoryDirectory {
        fn exists(&self, path: &Path) -> bool {
            path == self.root
        }

        fn list_files(&self, _path: &Path) -> RuntimeResult<Vec<String>> {
            Ok(self.files.keys().rev().cloned().collect())
        }

        fn read_file(&self, path: &Path) -> RuntimeResult<String> {
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();
            Ok(self.files.get(name).cloned().unwrap_or_default())
        }
    }

    fn host_with(files: &[(&str, &str)]) -> (PluginHost, Arc<MemoryLogger>) {
        let logger = Arc::new(MemoryLogger::new());
        let directory = MemoryDirectory {
            root: PathBuf::from("/plugins"),
            files: files
                .iter()
                .map(|(name, text)| (name.to_string(), text.to_string()))
                .collect(),
        };
        let host = PluginHost::new(logger.clone()).with_directory(Arc::new(directory));
        (host, logger)
    }

    #[tokio::test]
    async fn test_scan_and_list_through_host() {
        let (host, logger) = host_with(&[
            ("b.rhai", "exports.fetch = || [#{ name: \"B\" }]; exports.doActions = |item| ();"),
            ("a.rhai", "exports.fetch = || [#{ name: \"A\" }]; exports.doActions = |item| ();"),
            ("notes.txt", "not a script"),
        ]);

        let registry = host.scan(Path::new("/plugins"));

        let filenames: Vec<_> = registry.iter().map(|p| p.filename()).collect();
        assert_eq!(filenames, vec!["a.rhai", "b.rhai"]);

        let items = host.list(registry.get(1).unwrap()).await.unwrap();
        assert_eq!(items[0].name(), "B");
        assert_eq!(logger.count(LogLevel::Error), 0);
    }

    #[tokio::test]
    async fn test_act_through_host() {
        let (host, logger) = host_with(&[(
            "a.rhai",
            r#"
exports.fetch = || [#{ name: "A" }];
exports.doActions = |item| console::log("acted on " + item.name);
"#,
        )]);

        let registry = host.scan(Path::new("/plugins"));
        let plugin = registry.find("a.rhai").unwrap();
        let items = host.list(plugin).await.unwrap();
        host.act(plugin, &items[0]).await.unwrap();

        assert!(logger.contains(LogLevel::Info, "acted on A"));
    }
}
