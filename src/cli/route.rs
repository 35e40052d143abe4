//! CLI route: single route table and run context. Dispatches to the configuration session
//! and presentation.

use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_context_switched, format_contexts_table, format_property_set,
};
use crate::config::{
    self, render, Change, ClusterNameProbe, ConfigPaths, ConfigSession, Format, KubectlProbe,
    LoadOptions, Overrides, RenderOptions,
};
use crate::error::ConfigError;
use std::path::PathBuf;
use tracing::debug;

/// Runtime context for CLI execution: the loaded configuration session.
pub struct RunContext {
    session: ConfigSession,
}

impl RunContext {
    /// Loads the configuration, discovering the cluster name with kubectl.
    pub fn new(config_path: Option<PathBuf>, overrides: Overrides) -> Result<Self, ConfigError> {
        Self::with_probe(config_path, overrides, &KubectlProbe::default())
    }

    pub fn with_probe(
        config_path: Option<PathBuf>,
        overrides: Overrides,
        probe: &dyn ClusterNameProbe,
    ) -> Result<Self, ConfigError> {
        let paths = match config_path {
            Some(path) => ConfigPaths::explicit(path),
            None => ConfigPaths::resolve(),
        };
        debug!(read = %paths.read.display(), write = %paths.write.display(), "configuration paths");
        let session = ConfigSession::load(LoadOptions { paths, overrides }, probe)?;
        Ok(Self { session })
    }

    pub fn session(&self) -> &ConfigSession {
        &self.session
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&mut self, command: &Commands) -> Result<String, ConfigError> {
        match command {
            Commands::View {
                minify,
                raw,
                output,
                decode_jwt,
            } => self.handle_view(*minify, *raw, *output, *decode_jwt),
            Commands::Set { name, value } => {
                self.session.update(Change::set_property(name, value))?;
                self.session.write()?;
                Ok(format_property_set(name, value))
            }
            Commands::UseContext { name } => {
                self.session.reader().context(name)?;
                self.session
                    .update(Change::set_property("current-context", name))?;
                self.session.write()?;
                Ok(format_context_switched(name))
            }
            Commands::CurrentContext => {
                Ok(self.session.reader().current_context_name().to_string())
            }
            Commands::GetContexts => {
                let reader = self.session.reader();
                Ok(format_contexts_table(
                    reader.config(),
                    reader.current_context_name(),
                ))
            }
        }
    }

    fn handle_view(
        &self,
        minify: bool,
        raw: bool,
        format: Format,
        decode_jwt: bool,
    ) -> Result<String, ConfigError> {
        let options = RenderOptions { decode_jwt };
        let rendered = if raw {
            let stored = config::read(&self.session.paths().read)?;
            render(&stored, format, options)?
        } else if minify {
            let reader = self.session.reader();
            let minified = reader.config().minify(reader.current_context_name())?;
            render(&minified, format, options)?
        } else {
            render(self.session.config(), format, options)?
        };
        Ok(rendered.trim_end().to_string())
    }
}
