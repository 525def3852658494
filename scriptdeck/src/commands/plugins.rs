//! Plugins command implementation.

use crate::output;
use anyhow::Result;
use console::style;
use scriptdeck::session::Session;
use serde_json::json;

/// Lists loaded plugins, then the scripts that were rejected.
pub fn execute(session: &Session, as_json: bool) -> Result<()> {
    let registry = session.registry();

    if as_json {
        let rejected: Vec<_> = registry
            .rejections()
            .iter()
            .map(|r| json!({ "filename": r.filename, "reason": r.reason.to_string() }))
            .collect();
        return output::json(&json!({
            "directory": session.dir().display().to_string(),
            "plugins": registry.list_plugins(),
            "rejected": rejected,
        }));
    }

    if registry.is_empty() && registry.rejections().is_empty() {
        output::warning(&format!(
            "No .rhai files found in {}",
            session.dir().display()
        ));
        return Ok(());
    }

    output::header(&format!("Plugins in {}:", session.dir().display()));
    println!();

    for plugin in registry.iter() {
        print!("  {}", style(plugin.name()).cyan().bold());
        if plugin.name() != plugin.filename() {
            print!(" {}", style(format!("({})", plugin.filename())).dim());
        }
        println!();
    }

    if !registry.rejections().is_empty() {
        println!();
        output::header("Not loaded:");
        for rejection in registry.rejections() {
            println!(
                "  {} - {}",
                style(&rejection.filename).red(),
                style(&rejection.reason).dim()
            );
        }
    }

    Ok(())
}
