//! File-backed plugin logger.

use chrono::{SecondsFormat, Utc};
use scriptdeck_runtime::{LogLevel, PluginLogger, TracingLogger};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Appends every plugin log line to a file and echoes it through `tracing`.
///
/// Lines look like `[2026-01-02T03:04:05.678Z] [WARN] message`. Failing to
/// open or write the file is ignored.
#[derive(Debug)]
pub struct FileLogger {
    path: PathBuf,
    echo: TracingLogger,
    // Serializes appends from concurrently running plugin calls.
    write_lock: Mutex<()>,
}

impl FileLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            echo: TracingLogger,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, level: LogLevel, message: &str) {
        let line = format_line(level, message);
        let _guard = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = file.write_all(line.as_bytes());
        }
    }
}

impl PluginLogger for FileLogger {
    fn log(&self, message: &str) {
        self.echo.log(message);
        self.append(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.echo.warn(message);
        self.append(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.echo.error(message);
        self.append(LogLevel::Error, message);
    }
}

fn format_line(level: LogLevel, message: &str) -> String {
    format!(
        "[{}] [{}] {}\n",
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        level.as_str(),
        message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lines_are_appended() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs").join("scriptdeck.log");
        let logger = FileLogger::new(&path);

        logger.log("Loading script execution for tabs.rhai");
        logger.warn("Directory not found: /nope");
        logger.error("boom");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("] [INFO] Loading script execution for tabs.rhai"));
        assert!(lines[1].contains("[WARN] Directory not found: /nope"));
        assert!(lines[2].contains("[ERROR] boom"));
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let line = format_line(LogLevel::Info, "hello");
        let stamp = &line[1..line.find(']').unwrap()];

        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn test_unwritable_path_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        // A directory cannot be opened for appending.
        let logger = FileLogger::new(temp_dir.path());

        logger.error("dropped");
        assert!(temp_dir.path().is_dir());
    }
}
