//! Rendering a configuration for display.

use crate::config::credential::Credential;
use crate::config::types::Config;
use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Yaml,
    Json,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Format::Yaml),
            "json" => Ok(Format::Json),
            other => Err(format!("unsupported output format: {}", other)),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Yaml => f.write_str("yaml"),
            Format::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Replace JWT access tokens with their (unverified) claim sets
    pub decode_jwt: bool,
}

/// Renders `config` as text.
pub fn render(config: &Config, format: Format, options: RenderOptions) -> Result<String, ConfigError> {
    if !options.decode_jwt {
        return to_text(config, format);
    }

    let mut value = serde_json::to_value(config).map_err(|e| ConfigError::Serialize(e.to_string()))?;
    for (i, az) in config.authorizations.iter().enumerate() {
        let Credential::Token(token) = &az.body.credential else {
            continue;
        };
        let Some(claims) = token.claims() else {
            continue;
        };
        let pointer = format!("/authorizations/{}/authorization/credential/access_token", i);
        if let Some(slot) = value.pointer_mut(&pointer) {
            *slot = claims;
        }
    }
    to_text(&value, format)
}

fn to_text<T: serde::Serialize>(value: &T, format: Format) -> Result<String, ConfigError> {
    match format {
        Format::Yaml => serde_yaml::to_string(value).map_err(|e| ConfigError::Serialize(e.to_string())),
        Format::Json => serde_json::to_string_pretty(value)
            .map(|mut out| {
                out.push('\n');
                out
            })
            .map_err(|e| ConfigError::Serialize(e.to_string())),
    }
}
