//! optimize-config CLI Binary
//!
//! Command-line interface for inspecting and changing the Optimize client configuration.

use anyhow::Context as _;
use clap::Parser;
use optimize_config::cli::{Cli, RunContext};
use optimize_config::config::Overrides;
use optimize_config::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let logging_config = match build_logging_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            process::exit(1);
        }
    };

    // Initialize logging early
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("optimize-config starting");

    let overrides = Overrides {
        environment: cli.env.clone(),
        context: cli.context.clone(),
    };
    let mut context = match RunContext::new(cli.config.clone(), overrides) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            eprintln!("{}", optimize_config::cli::map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            info!("Command completed successfully");
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", optimize_config::cli::map_error(&e));
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI args and environment.
/// Precedence: CLI flags override `OPTIMIZE_LOG_*` variables override defaults.
fn build_logging_config(cli: &Cli) -> anyhow::Result<LoggingConfig> {
    let mut config =
        LoggingConfig::from_env().context("failed to read OPTIMIZE_LOG_* environment")?;

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
        if cli.log_output.is_none() {
            config.output = "file".to_string();
        }
    }

    Ok(config)
}
