//! Invocation adapter: calling a loaded plugin's operations.
//!
//! Plugin operations are plain script calls, but a script may hand back a
//! *deferred value* instead of its result: a zero-argument closure the host
//! resolves later. Both styles go through the same path here. Each call runs
//! on the blocking pool and is awaited, deferred values are resolved, and
//! failures come back as [`ListingError`] / [`ActionError`] values rather
//! than panics or raw script errors.

use crate::item::PluginItem;
use crate::plugin::{panic_message, LoadedPlugin, PluginContract};
use async_trait::async_trait;
use rhai::{Array, Dynamic, FnPtr, Map};
use scriptdeck_runtime::{PluginLogger, RuntimeError, RuntimeResult, ScriptProgram};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{self, JoinError};
use tracing::debug;

/// How many nested deferred values are resolved before giving up.
pub const MAX_DEFERRED_DEPTH: usize = 16;

/// A plugin's list operation failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Listing failed for {plugin}: {message}")]
pub struct ListingError {
    /// Script file name.
    pub plugin: String,
    pub message: String,
}

/// A plugin's action operation failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Action failed for {plugin}: {message}")]
pub struct ActionError {
    /// Script file name.
    pub plugin: String,
    pub message: String,
}

/// Runtime interface the presentation layer uses to drive plugins.
#[async_trait]
pub trait PluginInvoker: Send + Sync {
    /// Produce the plugin's current items.
    async fn list(&self, plugin: &LoadedPlugin) -> Result<Vec<PluginItem>, ListingError>;

    /// Run the plugin's action on one of its items.
    async fn act(&self, plugin: &LoadedPlugin, item: &PluginItem) -> Result<(), ActionError>;
}

/// Call the list operation of `plugin`.
///
/// A result that is not an array is logged as a warning and treated as an
/// empty list. Array elements that are not object maps are skipped.
pub async fn list(
    plugin: &LoadedPlugin,
    logger: &Arc<dyn PluginLogger>,
) -> Result<Vec<PluginItem>, ListingError> {
    let contract = plugin.shared_contract();
    debug!(plugin = %plugin.filename(), export = contract.list_export(), "Listing items");

    let outcome = task::spawn_blocking(move || call_list(&contract)).await;

    match flatten_outcome(outcome) {
        Ok(value) => Ok(collect_items(plugin, value, logger.as_ref())),
        Err(message) => {
            logger.error(&format!("Error fetching items from {}: {}", plugin.filename(), message));
            Err(ListingError {
                plugin: plugin.filename().to_string(),
                message,
            })
        }
    }
}

/// Call the action operation of `plugin` with `item`.
///
/// The item is handed over exactly as the list operation produced it.
pub async fn act(
    plugin: &LoadedPlugin,
    item: &PluginItem,
    logger: &Arc<dyn PluginLogger>,
) -> Result<(), ActionError> {
    let contract = plugin.shared_contract();
    let argument = item.to_dynamic();
    debug!(plugin = %plugin.filename(), item = %item.name(), "Running action");

    let outcome = task::spawn_blocking(move || call_action(&contract, argument)).await;

    match flatten_outcome(outcome) {
        Ok(_) => Ok(()),
        Err(message) => {
            logger.error(&format!("Action failed in {}: {}", plugin.filename(), message));
            Err(ActionError {
                plugin: plugin.filename().to_string(),
                message,
            })
        }
    }
}

fn call_list(contract: &PluginContract) -> RuntimeResult<Dynamic> {
    let value = contract
        .program()
        .call(contract.list_operation(), Vec::<Dynamic>::new())?;
    settle(contract.program(), value)
}

fn call_action(contract: &PluginContract, item: Dynamic) -> RuntimeResult<Dynamic> {
    let value = contract
        .program()
        .call(contract.action_operation(), vec![item])?;
    settle(contract.program(), value)
}

/// Resolve deferred values until a plain value remains.
fn settle(program: &ScriptProgram, value: Dynamic) -> RuntimeResult<Dynamic> {
    let mut value = value.flatten();

    for _ in 0..MAX_DEFERRED_DEPTH {
        if !value.is::<FnPtr>() {
            return Ok(value);
        }
        let deferred = value.cast::<FnPtr>();
        value = program.call(&deferred, Vec::<Dynamic>::new())?.flatten();
    }

    if value.is::<FnPtr>() {
        Err(RuntimeError::Execution(format!(
            "deferred value did not settle after {} resolutions",
            MAX_DEFERRED_DEPTH
        )))
    } else {
        Ok(value)
    }
}

fn flatten_outcome(outcome: Result<RuntimeResult<Dynamic>, JoinError>) -> Result<Dynamic, String> {
    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.to_string()),
        Err(err) if err.is_panic() => Err(panic_message(err.into_panic().as_ref())),
        Err(err) => Err(err.to_string()),
    }
}

fn collect_items(plugin: &LoadedPlugin, value: Dynamic, logger: &dyn PluginLogger) -> Vec<PluginItem> {
    if !value.is::<Array>() {
        logger.warn(&format!(
            "Script {} returned non-array result ({})",
            plugin.filename(),
            value.type_name()
        ));
        return Vec::new();
    }

    value
        .cast::<Array>()
        .into_iter()
        .enumerate()
        .filter_map(|(index, element)| {
            let element = element.flatten();
            if element.is::<Map>() {
                Some(PluginItem::from_map(element.cast::<Map>()))
            } else {
                logger.warn(&format!(
                    "Script {} returned a non-object item at index {} ({}); skipping",
                    plugin.filename(),
                    index,
                    element.type_name()
                ));
                None
            }
        })
        .collect()
}

/// Ticket handed out by [`RefreshTracker::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

/// Orders overlapping refreshes of the same plugin.
///
/// The core does not serialize or cancel concurrent `list` calls. A caller
/// that refreshes while a previous listing is still running takes a ticket
/// per request and only applies a result whose ticket is still current, so
/// the most recently issued request wins regardless of completion order.
#[derive(Debug, Default)]
pub struct RefreshTracker {
    latest: AtomicU64,
}

impl RefreshTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request; older tickets become stale.
    pub fn begin(&self) -> RefreshTicket {
        RefreshTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` belongs to the most recent request.
    pub fn is_current(&self, ticket: RefreshTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{load_plugin, LoadOutcome};
    use scriptdeck_runtime::{LogLevel, MemoryLogger, PluginSource};

    fn plugin(filename: &str, raw_text: &str) -> LoadedPlugin {
        let outcome = load_plugin(
            PluginSource {
                filename: filename.to_string(),
                raw_text: raw_text.to_string(),
            },
            Arc::new(MemoryLogger::new()),
        );
        match outcome {
            LoadOutcome::Loaded(plugin) => plugin,
            LoadOutcome::Rejected(rejection) => panic!("unexpected rejection: {rejection}"),
        }
    }

    fn logger() -> (Arc<MemoryLogger>, Arc<dyn PluginLogger>) {
        let memory = Arc::new(MemoryLogger::new());
        let shared: Arc<dyn PluginLogger> = memory.clone();
        (memory, shared)
    }

    #[tokio::test]
    async fn test_list_returns_items() {
        let (_, logger) = logger();
        let plugin = plugin(
            "a.rhai",
            r#"
exports.fetch = || [#{ name: "X" }, #{ name: "Y", id: 2 }];
exports.doActions = |item| ();
"#,
        );

        let items = list(&plugin, &logger).await.unwrap();

        let names: Vec<_> = items.iter().map(|item| item.name()).collect();
        assert_eq!(names, vec!["X", "Y"]);
    }

    #[tokio::test]
    async fn test_deferred_list_is_resolved() {
        let (_, logger) = logger();
        let plugin = plugin(
            "later.rhai",
            r#"
exports.fetch = || {
    let items = [#{ name: "later" }];
    || items
};
exports.doActions = |item| ();
"#,
        );

        let items = list(&plugin, &logger).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name(), "later");
    }

    #[tokio::test]
    async fn test_endless_deferral_fails() {
        let (_, logger) = logger();
        let plugin = plugin(
            "forever.rhai",
            r#"
fn again() { Fn("again") }
exports.fetch = Fn("again");
exports.doActions = |item| ();
"#,
        );

        let err = list(&plugin, &logger).await.unwrap_err();

        assert!(err.message.contains("did not settle"));
    }

    #[tokio::test]
    async fn test_throwing_list_is_structured() {
        let (memory, logger) = logger();
        let plugin = plugin(
            "throws.rhai",
            r#"
exports.fetch = || { throw "osascript unavailable"; };
exports.doActions = |item| ();
"#,
        );

        let err = list(&plugin, &logger).await.unwrap_err();

        assert_eq!(err.plugin, "throws.rhai");
        assert!(err.message.contains("osascript unavailable"));
        assert!(memory.contains(LogLevel::Error, "throws.rhai"));
    }

    #[tokio::test]
    async fn test_non_array_is_empty_with_warning() {
        let (memory, logger) = logger();
        let plugin = plugin(
            "single.rhai",
            r#"
exports.fetch = || #{ name: "single" };
exports.doActions = |item| ();
"#,
        );

        let items = list(&plugin, &logger).await.unwrap();

        assert!(items.is_empty());
        assert!(memory.contains(LogLevel::Warn, "non-array result"));
        assert_eq!(memory.count(LogLevel::Error), 0);
    }

    #[tokio::test]
    async fn test_non_object_elements_are_skipped() {
        let (memory, logger) = logger();
        let plugin = plugin(
            "mixed.rhai",
            r#"
exports.fetch = || [#{ name: "ok" }, 42, #{ id: 1 }];
exports.doActions = |item| ();
"#,
        );

        let items = list(&plugin, &logger).await.unwrap();

        let names: Vec<_> = items.iter().map(|item| item.name()).collect();
        assert_eq!(names, vec!["ok", "Unknown"]);
        assert!(memory.contains(LogLevel::Warn, "index 1"));
    }

    #[tokio::test]
    async fn test_action_receives_item_verbatim() {
        let (memory, logger) = logger();
        let plugin = plugin(
            "tabs.rhai",
            r#"
exports.fetch = || [#{ name: "zsh", windowId: 7, tabIndex: "2", tags: [1, 2, 3] }];
exports.doActions = |item| {
    console::log("selected " + item.name + " " + item.windowId + " " + item.tabIndex + " " + item.tags.len());
};
"#,
        );

        let items = list(&plugin, &logger).await.unwrap();
        act(&plugin, &items[0], &logger).await.unwrap();

        assert!(memory.contains(LogLevel::Info, "[Script tabs.rhai] selected zsh 7 2 3"));
    }

    #[tokio::test]
    async fn test_throwing_action_is_structured() {
        let (_, logger) = logger();
        let plugin = plugin(
            "fails.rhai",
            r#"
exports.fetch = || [#{ name: "X" }];
exports.doActions = |item| { throw "no window " + item.name; };
"#,
        );

        let items = list(&plugin, &logger).await.unwrap();
        let err = act(&plugin, &items[0], &logger).await.unwrap_err();

        assert_eq!(err.plugin, "fails.rhai");
        assert!(err.message.contains("no window X"));
    }

    #[tokio::test]
    async fn test_deferred_action_runs() {
        let (memory, logger) = logger();
        let plugin = plugin(
            "deferred.rhai",
            r#"
exports.fetch = || [#{ name: "X" }];
exports.doActions = |item| {
    let name = item.name;
    || console::log("finished " + name)
};
"#,
        );

        let items = list(&plugin, &logger).await.unwrap();
        act(&plugin, &items[0], &logger).await.unwrap();

        assert!(memory.contains(LogLevel::Info, "finished X"));
    }

    #[test]
    fn test_refresh_tracker_latest_wins() {
        let tracker = RefreshTracker::new();

        let first = tracker.begin();
        let second = tracker.begin();

        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
    }
}
