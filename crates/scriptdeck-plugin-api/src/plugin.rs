//! Plugin contract validation and loading.
//!
//! A script becomes a plugin when its exports satisfy the contract:
//!
//! - a callable list operation under `fetch`, or under the legacy alias
//!   `retrieve` (when both are callable, `fetch` wins);
//! - a callable action operation under `doActions`;
//! - optionally a `name` string used as the display name.
//!
//! The decision is made once, at load time. Everything downstream holds a
//! [`LoadedPlugin`] and never re-checks the shape.

use rhai::FnPtr;
use scriptdeck_runtime::{
    CapabilitySet, ExecutionContext, PluginLogger, PluginSource, RuntimeError, ScriptExports,
    ScriptProgram,
};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Preferred export name of the list operation.
pub const LIST_EXPORT: &str = "fetch";

/// Legacy export name of the list operation.
pub const LEGACY_LIST_EXPORT: &str = "retrieve";

/// Export name of the action operation.
pub const ACTION_EXPORT: &str = "doActions";

/// Export name of the optional display name.
pub const NAME_EXPORT: &str = "name";

/// Why a script was not admitted into the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Script text failed to parse.
    #[error("compile error: {0}")]
    CompileError(String),

    /// Top-level code raised an error (or panicked the host binding).
    #[error("runtime error: {0}")]
    RuntimeError(String),

    /// Exports lack a required operation.
    #[error("missing required exports ({0})")]
    ContractMissing(String),
}

impl From<RuntimeError> for RejectReason {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Compile(message) => RejectReason::CompileError(message),
            other => RejectReason::RuntimeError(other.to_string()),
        }
    }
}

/// A script that failed to load.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{filename}: {reason}")]
pub struct Rejection {
    pub filename: String,
    pub reason: RejectReason,
}

/// The validated operations of a plugin.
pub struct PluginContract {
    display_name: Option<String>,
    list_export: &'static str,
    list_operation: FnPtr,
    action_operation: FnPtr,
    program: ScriptProgram,
}

impl PluginContract {
    /// Validate a script's exports.
    pub fn from_exports(exports: ScriptExports) -> Result<Self, RejectReason> {
        let list = [LIST_EXPORT, LEGACY_LIST_EXPORT]
            .into_iter()
            .find_map(|key| exports.function(key).map(|function| (key, function)));
        let action = exports.function(ACTION_EXPORT);

        let ((list_export, list_operation), action_operation) = match (list, action) {
            (Some(list), Some(action)) => (list, action),
            (list, action) => {
                let mut missing = Vec::new();
                if list.is_none() {
                    missing.push(format!("{}/{}", LIST_EXPORT, LEGACY_LIST_EXPORT));
                }
                if action.is_none() {
                    missing.push(ACTION_EXPORT.to_string());
                }
                return Err(RejectReason::ContractMissing(missing.join(", ")));
            }
        };

        let display_name = exports
            .string(NAME_EXPORT)
            .filter(|name| !name.trim().is_empty());

        Ok(Self {
            display_name,
            list_export,
            list_operation,
            action_operation,
            program: exports.into_program(),
        })
    }

    /// Display name declared by the script.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Export name the list operation was found under.
    pub fn list_export(&self) -> &'static str {
        self.list_export
    }

    pub(crate) fn list_operation(&self) -> &FnPtr {
        &self.list_operation
    }

    pub(crate) fn action_operation(&self) -> &FnPtr {
        &self.action_operation
    }

    pub(crate) fn program(&self) -> &ScriptProgram {
        &self.program
    }
}

impl fmt::Debug for PluginContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContract")
            .field("display_name", &self.display_name)
            .field("list_export", &self.list_export)
            .field("list_operation", &self.list_operation.fn_name())
            .field("action_operation", &self.action_operation.fn_name())
            .finish()
    }
}

/// A plugin admitted into the registry.
///
/// Cloning is cheap; clones share the same contract.
#[derive(Debug, Clone)]
pub struct LoadedPlugin {
    name: String,
    filename: String,
    contract: Arc<PluginContract>,
}

impl LoadedPlugin {
    pub fn new(filename: impl Into<String>, contract: PluginContract) -> Self {
        let filename = filename.into();
        let name = contract
            .display_name()
            .map(str::to_string)
            .unwrap_or_else(|| filename.clone());

        Self {
            name,
            filename,
            contract: Arc::new(contract),
        }
    }

    /// Display name (declared name, or the filename).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Script file name.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn contract(&self) -> &PluginContract {
        &self.contract
    }

    pub(crate) fn shared_contract(&self) -> Arc<PluginContract> {
        Arc::clone(&self.contract)
    }
}

/// Result of loading one script.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(LoadedPlugin),
    Rejected(Rejection),
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }
}

/// Load and validate one script.
///
/// Never fails and never panics: every problem, including a panic raised
/// while running the script, is reported as [`LoadOutcome::Rejected`].
pub fn load_plugin(source: PluginSource, logger: Arc<dyn PluginLogger>) -> LoadOutcome {
    let PluginSource { filename, raw_text } = source;
    debug!("Loading plugin script {}", filename);

    let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
        let capabilities = CapabilitySet::build(&filename, logger);
        let exports = ExecutionContext::new(capabilities).run(&raw_text)?;
        PluginContract::from_exports(exports)
    }));

    let result = match attempt {
        Ok(result) => result,
        Err(payload) => Err(RejectReason::RuntimeError(panic_message(payload.as_ref()))),
    };

    match result {
        Ok(contract) => LoadOutcome::Loaded(LoadedPlugin::new(filename, contract)),
        Err(reason) => LoadOutcome::Rejected(Rejection { filename, reason }),
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
