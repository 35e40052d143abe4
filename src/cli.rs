//! CLI domain: parse, route, output, and presentation only.
//! No configuration logic; single route table dispatches to the configuration session.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{format_context_switched, format_contexts_table, format_property_set};
pub use route::RunContext;
