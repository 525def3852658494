//! Script discovery in a plugin directory.
//!
//! A plugin directory is a flat folder of `.rhai` files. Each file is one
//! plugin. Files are enumerated in filename order so that repeated scans of
//! an unchanged directory produce the same sequence.

use crate::error::{RuntimeError, RuntimeResult};
use std::fs::DirEntry;
use std::path::Path;
use tracing::{debug, warn};

/// File extension of plugin scripts.
pub const SCRIPT_EXTENSION: &str = "rhai";

/// The raw text of one plugin script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSource {
    /// File name within the plugin directory.
    pub filename: String,

    /// Script text.
    pub raw_text: String,
}

/// Storage collaborator that owns the plugin directory.
pub trait ScriptDirectory: Send + Sync {
    /// Whether `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Names of the regular files directly inside `path`.
    fn list_files(&self, path: &Path) -> RuntimeResult<Vec<String>>;

    /// Contents of the file at `path`.
    fn read_file(&self, path: &Path) -> RuntimeResult<String>;
}

/// [`ScriptDirectory`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsScriptDirectory;

impl ScriptDirectory for FsScriptDirectory {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn list_files(&self, path: &Path) -> RuntimeResult<Vec<String>> {
        Ok(std::fs::read_dir(path)?
            .filter_map(|entry| regular_file_name(path, entry))
            .collect())
    }

    fn read_file(&self, path: &Path) -> RuntimeResult<String> {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Name of a directory entry if it is a readable regular file.
fn regular_file_name(dir: &Path, entry: std::io::Result<DirEntry>) -> Option<String> {
    let entry = match entry {
        Ok(entry) => entry,
        Err(e) => {
            warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
            return None;
        }
    };

    if !entry.path().is_file() {
        return None;
    }

    match entry.file_name().into_string() {
        Ok(name) => Some(name),
        Err(name) => {
            warn!("Skipping non UTF-8 file name {:?}", name);
            None
        }
    }
}

/// Check whether a file name carries the script extension.
pub fn is_script_file(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .map(|ext| ext == SCRIPT_EXTENSION)
        .unwrap_or(false)
}

/// List the plugin scripts in `dir`, sorted by file name.
pub fn script_files(store: &dyn ScriptDirectory, dir: &Path) -> RuntimeResult<Vec<String>> {
    if !store.exists(dir) {
        return Err(RuntimeError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut scripts: Vec<String> = store
        .list_files(dir)?
        .into_iter()
        .filter(|name| {
            let keep = is_script_file(name);
            if !keep {
                debug!("Skipping {}: not a .{} file", name, SCRIPT_EXTENSION);
            }
            keep
        })
        .collect();

    scripts.sort();
    Ok(scripts)
}

/// Read one script from `dir`.
pub fn read_source(
    store: &dyn ScriptDirectory,
    dir: &Path,
    filename: &str,
) -> RuntimeResult<PluginSource> {
    let raw_text = store.read_file(&dir.join(filename))?;
    Ok(PluginSource {
        filename: filename.to_string(),
        raw_text,
    })
}
