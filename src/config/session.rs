//! A loaded configuration together with the changes waiting to be persisted.

use crate::config::change::{apply_all, Change};
use crate::config::defaults::Defaults;
use crate::config::discovery::{bootstrap_cluster_name, ClusterNameProbe};
use crate::config::file;
use crate::config::paths::ConfigPaths;
use crate::config::reader::Reader;
use crate::config::types::{Config, Environment};
use crate::error::ConfigError;
use tracing::{debug, info, instrument};

/// Per-invocation settings that are never written back to the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Environment name or alias, e.g. "dev"
    pub environment: Option<String>,
    /// Context to use instead of the stored current context
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub paths: ConfigPaths,
    pub overrides: Overrides,
}

impl LoadOptions {
    /// Standard XDG locations, no overrides.
    pub fn from_env() -> Self {
        Self {
            paths: ConfigPaths::resolve(),
            overrides: Overrides::default(),
        }
    }
}

#[derive(Debug)]
pub struct ConfigSession {
    paths: ConfigPaths,
    data: Config,
    environment: Environment,
    context_override: Option<String>,
    pending: Vec<Change>,
}

impl ConfigSession {
    /// Reads the configuration file and fills every default.
    #[instrument(level = "debug", skip_all, fields(path = %options.paths.read.display()))]
    pub fn load(options: LoadOptions, probe: &dyn ClusterNameProbe) -> Result<Self, ConfigError> {
        let LoadOptions { paths, overrides } = options;

        let stored = file::read(&paths.read)?;
        let mut data = Config::default();
        data.merge(&stored);

        let environment = match overrides.environment.as_deref() {
            Some(raw) => Environment::parse_alias(raw)?,
            None => None,
        };
        let environment = match environment {
            Some(environment) => environment,
            None => Environment::from_stored(&data.environment)?,
        };

        let cluster_name = bootstrap_cluster_name(probe);
        Defaults::new(environment.stored_value(), cluster_name)?.apply(&mut data)?;

        info!(
            environment = %environment,
            current_context = %data.current_context,
            "configuration loaded"
        );
        Ok(Self {
            paths,
            data,
            environment,
            context_override: overrides.context.filter(|c| !c.is_empty()),
            pending: Vec::new(),
        })
    }

    /// Applies `change` in memory and queues it for [`ConfigSession::write`].
    pub fn update(&mut self, change: Change) -> Result<(), ConfigError> {
        self.update_all(vec![change])
    }

    /// Applies a batch; on error nothing in the batch takes effect.
    pub fn update_all(&mut self, changes: Vec<Change>) -> Result<(), ConfigError> {
        let updated = apply_all(self.data.clone(), &changes)?;
        for change in &changes {
            debug!(change = %change.describe(), "change applied");
        }
        self.data = updated;
        self.pending.extend(changes);
        Ok(())
    }

    /// Persists pending changes.
    ///
    /// Changes are replayed on the raw document at the write path, so values filled in by
    /// defaults or overrides never reach the file.
    #[instrument(level = "debug", skip_all, fields(path = %self.paths.write.display()))]
    pub fn write(&mut self) -> Result<(), ConfigError> {
        if self.pending.is_empty() {
            debug!("no pending changes");
            return Ok(());
        }
        let raw = file::read(&self.paths.write)?;
        let updated = apply_all(raw, &self.pending)?;
        file::write(&self.paths.write, &updated)?;
        info!(changes = self.pending.len(), "pending changes written");
        self.pending.clear();
        Ok(())
    }

    /// The resolved configuration.
    pub fn config(&self) -> &Config {
        &self.data
    }

    pub fn reader(&self) -> Reader<'_> {
        Reader::new(&self.data).with_context_override(self.context_override.as_deref())
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// The override, else the stored environment.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn pending(&self) -> &[Change] {
        &self.pending
    }
}
