//! Set-dir command implementation.

use crate::output;
use anyhow::Result;
use scriptdeck::state::LocalState;
use std::path::Path;

/// Stores `dir` as the scripts directory for later runs.
pub fn execute(state: &mut LocalState, state_path: &Path, dir: &str) -> Result<()> {
    let dir = state.set_scripts_directory(dir)?;
    state.save(state_path)?;

    output::success(&format!("Scripts directory set to {}", dir.display()));
    Ok(())
}
