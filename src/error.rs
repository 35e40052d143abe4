//! Error types for the configuration engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, resolving, changing or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown environment: '{0}'")]
    UnresolvableEnvironment(String),

    #[error("could not imply default {kind} name for {owner}")]
    AmbiguousOrMissingReference { kind: ReferenceKind, owner: String },

    #[error("unknown environment: {0} (expected production, staging or development)")]
    InvalidEnvironmentAlias(String),

    #[error("unknown {kind} reference: {name}")]
    UnknownReference { kind: ReferenceKind, name: String },

    #[error("unknown config property: {0}")]
    UnknownProperty(String),

    #[error("malformed configuration file {path}: {source}")]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unknown credential shape (fields: {0})")]
    UnknownCredentialShape(String),

    #[error("invalid server URL '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },

    #[error("configuration I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize configuration: {0}")]
    Serialize(String),

    #[error("logging setup failed: {0}")]
    Logging(String),
}

/// The collection a name refers to; used to label reference errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Server,
    Authorization,
    Cluster,
    Controller,
    Context,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReferenceKind::Server => "server",
            ReferenceKind::Authorization => "authorization",
            ReferenceKind::Cluster => "cluster",
            ReferenceKind::Controller => "controller",
            ReferenceKind::Context => "context",
        };
        f.write_str(s)
    }
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}
