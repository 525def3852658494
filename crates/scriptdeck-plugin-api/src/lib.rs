//! # scriptdeck-plugin-api
//!
//! Loading, registry and invocation API for scriptdeck plugins.
//!
//! This crate turns a directory of scripts into usable plugins:
//!
//! - [`PluginHost::scan`] runs every script and keeps those that satisfy the
//!   plugin contract, in a [`PluginRegistry`]
//! - [`PluginInvoker::list`] asks a plugin for its current items
//! - [`PluginInvoker::act`] runs a plugin's action on one of those items
//!
//! Script execution itself lives in `scriptdeck-runtime`.
//!
//! ## Example
//!
//! ```no_run
//! use scriptdeck_plugin_api::{PluginHost, PluginInvoker};
//! use std::path::Path;
//!
//! # async fn demo() {
//! let host = PluginHost::default();
//! let registry = host.scan(Path::new("/home/me/.scriptdeck/plugins"));
//!
//! for plugin in registry.iter() {
//!     match host.list(plugin).await {
//!         Ok(items) => println!("{}: {} items", plugin.name(), items.len()),
//!         Err(err) => eprintln!("{}", err),
//!     }
//! }
//! # }
//! ```

pub mod host;
pub mod invoke;
pub mod item;
pub mod plugin;
pub mod registry;

pub use host::PluginHost;
pub use invoke::{
    act, list, ActionError, ListingError, PluginInvoker, RefreshTicket, RefreshTracker,
    MAX_DEFERRED_DEPTH,
};
pub use item::{PluginItem, UNKNOWN_ITEM_NAME};
pub use plugin::{
    load_plugin, LoadOutcome, LoadedPlugin, PluginContract, RejectReason, Rejection,
    ACTION_EXPORT, LEGACY_LIST_EXPORT, LIST_EXPORT, NAME_EXPORT,
};
pub use registry::{PluginInfo, PluginRegistry};
