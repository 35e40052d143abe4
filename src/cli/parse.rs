//! CLI parse: clap types for optimize-config. No behavior; definitions only.

use crate::config::Format;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Manage the Optimize client configuration
#[derive(Parser, Debug)]
#[command(name = "optimize-config")]
#[command(about = "Inspect and modify the Optimize client configuration")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (bypasses the XDG search; used for reads and writes)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Execution environment override for this invocation (production, staging, development)
    #[arg(long, global = true)]
    pub env: Option<String>,

    /// Context to use instead of the current context
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Enable verbose logging (default: off)
    #[arg(long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Show the resolved configuration
    View {
        /// Only show the current context and the entries it references
        #[arg(long)]
        minify: bool,
        /// Show the file contents without defaults
        #[arg(long, conflicts_with = "minify")]
        raw: bool,
        /// Output format (yaml or json)
        #[arg(long, short = 'o', default_value = "yaml")]
        output: Format,
        /// Replace JWT access tokens with their decoded claims
        #[arg(long)]
        decode_jwt: bool,
    },
    /// Set a single configuration property, e.g. `cluster.kind.bin` or `env`
    Set {
        /// Dotted property name
        name: String,
        /// New value
        value: String,
    },
    /// Make a context the current context
    UseContext {
        /// Context name
        name: String,
    },
    /// Print the name of the current context
    CurrentContext,
    /// List the configured contexts
    GetContexts,
}
