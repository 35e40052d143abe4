//! Integration tests for the Optimize configuration engine

mod cli_commands;
mod persistence;
mod scenarios;
mod session_changes;

pub use test_utils::{with_xdg_env, write_file};
