//! Logging System
//!
//! Structured logging implementation using the `tracing` crate. Logs go to stderr by
//! default so rendered documents on stdout stay machine readable.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Prefix of the logging environment variables. `OPTIMIZE_LOG` alone is a full filter.
pub const LOG_ENV_PREFIX: &str = "OPTIMIZE_LOG";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path (if output is "file")
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Enable colored output (text format only, stdout/stderr only)
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
        }
    }
}

impl LoggingConfig {
    /// Defaults overridden by `OPTIMIZE_LOG_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(None)
    }

    /// Like [`LoggingConfig::from_env`], reading variables from `vars` when given.
    pub fn from_vars(vars: Option<config::Map<String, String>>) -> Result<Self, ConfigError> {
        let invalid = |e: config::ConfigError| ConfigError::Logging(e.to_string());
        config::Config::builder()
            .set_default("level", default_log_level())
            .map_err(invalid)?
            .set_default("format", default_format())
            .map_err(invalid)?
            .set_default("output", default_output())
            .map_err(invalid)?
            .set_default("color", default_true())
            .map_err(invalid)?
            .add_source(
                config::Environment::with_prefix(LOG_ENV_PREFIX)
                    .separator("__")
                    .prefix_separator("_")
                    .source(vars),
            )
            .build()
            .map_err(invalid)?
            .try_deserialize()
            .map_err(invalid)
    }
}

/// Initialize the logging system
///
/// `OPTIMIZE_LOG`, when set, is used verbatim as the filter and wins over `level`.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ConfigError> {
    let default_config = LoggingConfig::default();
    let config = config.unwrap_or(&default_config);

    let filter = build_env_filter(config)?;
    let format = parse_format(&config.format)?;
    let output = parse_output(config)?;

    let use_color = config.color && !matches!(output, Output::File(_));
    let writer = match output {
        Output::Stdout => BoxMakeWriter::new(std::io::stdout),
        Output::Stderr => BoxMakeWriter::new(std::io::stderr),
        Output::File(path) => BoxMakeWriter::new(Mutex::new(open_log_file(&path)?)),
    };

    let base_subscriber = Registry::default().with(filter);
    let result = match format {
        Format::Json => base_subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init(),
        Format::Text => base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(use_color)
                    .with_writer(writer),
            )
            .try_init(),
    };
    result.map_err(|e| ConfigError::Logging(e.to_string()))
}

/// Build environment filter from `OPTIMIZE_LOG` or the configured level
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV_PREFIX) {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| ConfigError::Logging(format!("invalid log level '{}': {}", config.level, e)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Text,
}

fn parse_format(format: &str) -> Result<Format, ConfigError> {
    match format {
        "json" => Ok(Format::Json),
        "text" => Ok(Format::Text),
        other => Err(ConfigError::Logging(format!(
            "invalid log format: {} (must be 'json' or 'text')",
            other
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Output {
    Stdout,
    Stderr,
    File(PathBuf),
}

fn parse_output(config: &LoggingConfig) -> Result<Output, ConfigError> {
    match config.output.as_str() {
        "stdout" => Ok(Output::Stdout),
        "stderr" => Ok(Output::Stderr),
        "file" => config
            .file
            .clone()
            .map(Output::File)
            .ok_or_else(|| ConfigError::Logging("log output 'file' requires a log file path".to_string())),
        other => Err(ConfigError::Logging(format!(
            "invalid log output: {} (must be 'stdout', 'stderr' or 'file')",
            other
        ))),
    }
}

fn open_log_file(path: &Path) -> Result<std::fs::File, ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ConfigError::io(path, e))
}
