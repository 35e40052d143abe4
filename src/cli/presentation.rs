//! CLI presentation: text formatters for configuration summaries.

use crate::config::Config;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Marker shown next to the current context.
const CURRENT_MARKER: &str = "*";

/// Table of every context and its references; `current` is highlighted.
pub fn format_contexts_table(config: &Config, current: &str) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Current", "Name", "Server", "Authorization", "Cluster"]);
    for context in &config.contexts {
        let is_current = context.name == current;
        let marker = if is_current { CURRENT_MARKER } else { "" };
        let name = if is_current {
            context.name.green().bold().to_string()
        } else {
            context.name.clone()
        };
        table.add_row(vec![
            marker.to_string(),
            name,
            context.body.server.clone(),
            context.body.authorization.clone(),
            context.body.cluster.clone(),
        ]);
    }
    format!("{}", table)
}

/// Confirmation printed after the current context changes.
pub fn format_context_switched(name: &str) -> String {
    format!("Switched to context \"{}\".", name)
}

/// Confirmation printed after a property is written.
pub fn format_property_set(name: &str, value: &str) -> String {
    format!("Property \"{}\" set to \"{}\".", name, value)
}
