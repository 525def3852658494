//! scriptdeck CLI library
//!
//! Configuration, persisted state, the file logger and session handling used
//! by the `scriptdeck` binary, exported for testing.

pub mod config;
pub mod logger;
pub mod session;
pub mod state;
