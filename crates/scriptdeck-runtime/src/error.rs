//! Error types for the scriptdeck runtime.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while discovering or executing plugin scripts.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The scripts directory does not exist.
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// Script text failed to parse.
    #[error("Compile error: {0}")]
    Compile(String),

    /// Script code raised an error while running.
    #[error("Execution error: {0}")]
    Execution(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rhai::ParseError> for RuntimeError {
    fn from(err: rhai::ParseError) -> Self {
        RuntimeError::Compile(err.to_string())
    }
}

impl From<Box<rhai::EvalAltResult>> for RuntimeError {
    fn from(err: Box<rhai::EvalAltResult>) -> Self {
        RuntimeError::Execution(err.to_string())
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;
