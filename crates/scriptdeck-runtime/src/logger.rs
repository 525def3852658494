//! Logger collaborator used by the runtime and by plugin scripts.
//!
//! The host decides where log lines end up. The runtime only needs the three
//! operations of [`PluginLogger`], and implementations must tolerate
//! interleaved calls from concurrently running plugin operations.

use std::sync::Mutex;

/// Severity of a plugin log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Label used in persisted log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Sink for diagnostic messages from the loader, the invocation adapter and
/// plugin scripts themselves.
///
/// Implementations must never fail: a logger that cannot persist a line drops
/// it silently.
pub trait PluginLogger: Send + Sync {
    fn log(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, message: &str);

    /// Dispatch on a [`LogLevel`].
    fn emit(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => self.log(message),
            LogLevel::Warn => self.warn(message),
            LogLevel::Error => self.error(message),
        }
    }
}

/// Logger that forwards everything to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl PluginLogger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::info!(target: "scriptdeck::plugin", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "scriptdeck::plugin", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "scriptdeck::plugin", "{}", message);
    }
}

/// Logger that keeps every line in memory.
///
/// Test helper for asserting on plugin diagnostics. Nothing trims the
/// recorded lines, so it does not suit long-running hosts.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded lines, oldest first.
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Whether a line at `level` containing `needle` was recorded.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.entries()
            .iter()
            .any(|(l, message)| *l == level && message.contains(needle))
    }

    /// Number of lines recorded at `level`.
    pub fn count(&self, level: LogLevel) -> usize {
        self.entries().iter().filter(|(l, _)| *l == level).count()
    }

    fn push(&self, level: LogLevel, message: &str) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.push((level, message.to_string()));
    }
}

impl PluginLogger for MemoryLogger {
    fn log(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_logger_records_levels() {
        let logger = MemoryLogger::new();
        logger.log("hello");
        logger.warn("careful");
        logger.emit(LogLevel::Error, "broken");

        assert_eq!(logger.entries().len(), 3);
        assert!(logger.contains(LogLevel::Warn, "careful"));
        assert!(!logger.contains(LogLevel::Info, "careful"));
        assert_eq!(logger.count(LogLevel::Error), 1);
    }

    #[test]
    fn test_level_labels() {
        assert_eq!(LogLevel::Info.as_str(), "INFO");
        assert_eq!(LogLevel::Warn.as_str(), "WARN");
        assert_eq!(LogLevel::Error.as_str(), "ERROR");
    }
}
