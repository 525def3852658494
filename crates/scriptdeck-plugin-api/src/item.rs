//! Items produced by a plugin's list operation.

use rhai::{Dynamic, Map};
use serde_json::Value;

/// Display name used for items that carry no string `name` field.
pub const UNKNOWN_ITEM_NAME: &str = "Unknown";

/// One entry of a plugin's item list.
///
/// The item wraps the object map the plugin returned, untouched. Only the
/// `name` field is interpreted, for display; every other field is passed back
/// verbatim when the item is handed to the plugin's action operation.
#[derive(Debug, Clone)]
pub struct PluginItem {
    name: Option<String>,
    fields: Map,
}

impl PluginItem {
    /// Wrap an object map returned by a plugin.
    pub fn from_map(fields: Map) -> Self {
        let name = fields
            .get("name")
            .map(Dynamic::flatten_clone)
            .and_then(|value| value.into_string().ok());

        Self { name, fields }
    }

    /// Display name, or `"Unknown"` when the item has no string `name`.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_ITEM_NAME)
    }

    /// Whether the item carries a string `name` field.
    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    /// A field by key.
    pub fn get(&self, key: &str) -> Option<&Dynamic> {
        self.fields.get(key)
    }

    /// All fields, including `name`.
    pub fn fields(&self) -> &Map {
        &self.fields
    }

    /// Secondary display text: the other string fields joined with ` | `.
    pub fn subtitle(&self) -> String {
        self.fields
            .iter()
            .filter(|(key, _)| key.as_str() != "name")
            .filter_map(|(_, value)| value.flatten_clone().into_string().ok())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// JSON view of the item for presentation layers.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(Dynamic::from_map(self.fields.clone())).unwrap_or(Value::Null)
    }

    /// The value handed back to the plugin's action operation.
    pub(crate) fn to_dynamic(&self) -> Dynamic {
        Dynamic::from_map(self.fields.clone())
    }
}
