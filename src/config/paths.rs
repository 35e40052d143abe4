//! XDG base directory resolution for the configuration file.
//!
//! https://specifications.freedesktop.org/basedir-spec/basedir-spec-latest.html

use std::path::{Path, PathBuf};

/// Location of the configuration file relative to a base directory.
pub const CONFIG_FILENAME: &str = "stormforge/config";

const HOME_ENV: &str = "HOME";
const XDG_CONFIG_HOME_ENV: &str = "XDG_CONFIG_HOME";
const XDG_CONFIG_HOME_DEFAULT: &str = ".config";
const XDG_CONFIG_DIRS_ENV: &str = "XDG_CONFIG_DIRS";
const XDG_CONFIG_DIRS_DEFAULT: &str = "/etc/xdg";

/// Where the configuration is read from and where changes are written.
///
/// The two differ when the only existing file lives in a system directory: it is read,
/// but changes always go to the per-user location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub read: PathBuf,
    pub write: PathBuf,
}

impl ConfigPaths {
    /// Resolves paths from the process environment.
    pub fn resolve() -> Self {
        Self::resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolves paths using `lookup` for environment variables.
    pub fn resolve_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let config_home = config_home_with(&lookup);
        let config_dirs = lookup(XDG_CONFIG_DIRS_ENV)
            .unwrap_or_else(|| XDG_CONFIG_DIRS_DEFAULT.to_string());

        let user_file = config_home.join(CONFIG_FILENAME);
        let read = std::iter::once(config_home)
            .chain(std::env::split_paths(&config_dirs))
            .map(|dir| dir.join(CONFIG_FILENAME))
            .find(|candidate| candidate.is_file())
            .unwrap_or_else(|| user_file.clone());

        Self {
            read,
            write: user_file,
        }
    }

    /// Uses one explicit file for both reading and writing.
    pub fn explicit(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            read: path.clone(),
            write: path,
        }
    }
}

/// `$XDG_CONFIG_HOME`, falling back to `$HOME/.config`.
pub fn config_home() -> PathBuf {
    config_home_with(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
}

fn config_home_with(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = lookup(XDG_CONFIG_HOME_ENV) {
        return PathBuf::from(dir);
    }
    let home = lookup(HOME_ENV)
        .map(PathBuf::from)
        .or_else(|| directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("~"));
    home.join(XDG_CONFIG_HOME_DEFAULT)
}
