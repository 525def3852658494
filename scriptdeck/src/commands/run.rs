//! Run command implementation.

use crate::output;
use anyhow::Result;
use scriptdeck::session::{select_item, Session};
use scriptdeck_plugin_api::PluginInvoker;

/// Lists a plugin's items and runs its action on the selected one.
pub async fn execute(session: &Session, query: &str, item_query: &str) -> Result<()> {
    let plugin = session.plugin(query)?;
    let items = session.host().list(plugin).await?;

    let Some(item) = select_item(&items, item_query) else {
        anyhow::bail!(
            "{} has no item '{}' ({} items listed)",
            plugin.name(),
            item_query,
            items.len()
        );
    };

    session.host().act(plugin, item).await?;
    output::success(&format!("{}: {}", plugin.name(), item.name()));
    Ok(())
}
