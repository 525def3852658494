//! # scriptdeck-runtime
//!
//! Rhai runtime for executing scriptdeck plugin scripts.
//!
//! This crate provides:
//! - Plugin script discovery in a directory
//! - The capability set injected into every script
//! - Isolated, single-use execution contexts
//! - The logger collaborator interface
//!
//! ## Plugin Scripts
//!
//! A plugin is a single `.rhai` file. Its top-level code runs once, in a
//! context of its own, and publishes its operations through the `exports`
//! object map (or as public top-level functions):
//!
//! ```text
//! exports.name = "Open Tabs";
//! exports.fetch = || [#{ name: "Inbox", id: 1 }];
//! exports.doActions = |item| console::log("selected " + item.name);
//! ```
//!
//! ## Trust Model
//!
//! Plugins are locally authored automation scripts and are fully trusted.
//! The capability set keeps scripts from destabilizing the host by
//! accident; it is not a security boundary.

pub mod capability;
pub mod context;
pub mod discovery;
pub mod error;
pub mod host;
pub mod logger;

pub use capability::{Capability, CapabilitySet, HostModuleResolver};
pub use context::{ExecutionContext, ScriptExports, ScriptProgram, EXPORTS};
pub use discovery::{
    is_script_file, read_source, script_files, FsScriptDirectory, PluginSource, ScriptDirectory,
    SCRIPT_EXTENSION,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logger::{LogLevel, MemoryLogger, PluginLogger, TracingLogger};
