//! CLI command implementations.

pub mod items;
pub mod plugins;
pub mod run;
pub mod set_dir;
