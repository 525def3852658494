//! Items command implementation.

use crate::output;
use anyhow::Result;
use console::style;
use scriptdeck::session::Session;
use scriptdeck_plugin_api::PluginInvoker;
use serde_json::Value;

/// Lists the items of one plugin.
pub async fn execute(session: &Session, query: &str, as_json: bool) -> Result<()> {
    let plugin = session.plugin(query)?;
    let items = session.host().list(plugin).await?;

    if as_json {
        return output::json(&Value::Array(items.iter().map(|i| i.to_json()).collect()));
    }

    if items.is_empty() {
        output::warning(&format!("{} returned no items", plugin.name()));
        return Ok(());
    }

    output::header(&format!("{}:", plugin.name()));
    println!();

    for (index, item) in items.iter().enumerate() {
        print!("  {:>3}. {}", index + 1, style(item.name()).cyan());
        let subtitle = item.subtitle();
        if !subtitle.is_empty() {
            print!(" - {}", style(subtitle).dim());
        }
        println!();
    }

    Ok(())
}
