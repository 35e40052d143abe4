//! Reading and writing the persisted configuration document.

use crate::config::types::Config;
use crate::error::ConfigError;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Reads YAML or JSON from `path`. A missing or empty file is an empty document.
pub fn read(path: &Path) -> Result<Config, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "configuration file not found, using empty document");
            return Ok(Config::default());
        }
        Err(e) => return Err(ConfigError::io(path, e)),
    };
    let config = parse(&content, path)?;
    debug!(path = %path.display(), "configuration file loaded");
    Ok(config)
}

/// Decodes document text. `path` only labels errors.
pub fn parse(content: &str, path: &Path) -> Result<Config, ConfigError> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Ok(Config::default());
    }

    let malformed = |source: Box<dyn std::error::Error + Send + Sync>| {
        ConfigError::MalformedDocument {
            path: path.to_path_buf(),
            source,
        }
    };
    if trimmed.starts_with('{') {
        serde_json::from_str(content).map_err(|e| malformed(Box::new(e)))
    } else {
        serde_yaml::from_str(content).map_err(|e| malformed(Box::new(e)))
    }
}

/// Writes `config` as YAML.
///
/// The document may hold credentials: directories are created with 0700 and the file
/// with 0600.
pub fn write(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let output = serde_yaml::to_string(config).map_err(|e| ConfigError::Serialize(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_private_dir(parent).map_err(|e| ConfigError::io(parent, e))?;
    }

    let mut file = open_private_file(path).map_err(|e| ConfigError::io(path, e))?;
    file.write_all(output.as_bytes())
        .map_err(|e| ConfigError::io(path, e))?;
    info!(path = %path.display(), "configuration written");
    Ok(())
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}

#[cfg(unix)]
fn open_private_file(path: &Path) -> std::io::Result<std::fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private_file(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
