//! Read-only lookups over a resolved configuration.

use crate::config::types::{
    Authorization, Cluster, Config, Context, Controller, Named, NamedList, Server,
};
use crate::error::{ConfigError, ReferenceKind};

/// Lookups that honor a per-invocation context override.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    config: &'a Config,
    context_override: Option<&'a str>,
}

/// Everything a remote API client needs to act on behalf of one context.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContext<'a> {
    pub name: &'a str,
    pub server: &'a Server,
    pub authorization: &'a Authorization,
    pub cluster: &'a Cluster,
    /// The cluster's controller, when one is configured
    pub controller: Option<&'a Controller>,
}

fn lookup<'a, T>(
    list: &'a [Named<T>],
    kind: ReferenceKind,
    name: &str,
) -> Result<&'a T, ConfigError> {
    list.iter()
        .find(|n| n.name == name)
        .map(|n| &n.body)
        .ok_or_else(|| ConfigError::UnknownReference {
            kind,
            name: name.to_string(),
        })
}

impl<'a> Reader<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            context_override: None,
        }
    }

    /// An empty override is ignored.
    pub fn with_context_override(mut self, context: Option<&'a str>) -> Self {
        self.context_override = context.filter(|c| !c.is_empty());
        self
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    pub fn current_context_name(&self) -> &'a str {
        self.context_override
            .unwrap_or(self.config.current_context.as_str())
    }

    pub fn context(&self, name: &str) -> Result<&'a Context, ConfigError> {
        lookup(&self.config.contexts, ReferenceKind::Context, name)
    }

    pub fn server(&self, name: &str) -> Result<&'a Server, ConfigError> {
        lookup(&self.config.servers, ReferenceKind::Server, name)
    }

    pub fn authorization(&self, name: &str) -> Result<&'a Authorization, ConfigError> {
        lookup(&self.config.authorizations, ReferenceKind::Authorization, name)
    }

    pub fn cluster(&self, name: &str) -> Result<&'a Cluster, ConfigError> {
        lookup(&self.config.clusters, ReferenceKind::Cluster, name)
    }

    pub fn controller(&self, name: &str) -> Result<&'a Controller, ConfigError> {
        lookup(&self.config.controllers, ReferenceKind::Controller, name)
    }

    /// Follows every reference of the named context.
    pub fn resolve_context(&self, name: &str) -> Result<ResolvedContext<'a>, ConfigError> {
        let (name, ctx) = self
            .config
            .contexts
            .iter()
            .find(|n| n.name == name)
            .map(|n| (n.name.as_str(), &n.body))
            .ok_or_else(|| ConfigError::UnknownReference {
                kind: ReferenceKind::Context,
                name: name.to_string(),
            })?;

        let cluster = self.cluster(&ctx.cluster)?;
        Ok(ResolvedContext {
            name,
            server: self.server(&ctx.server)?,
            authorization: self.authorization(&ctx.authorization)?,
            cluster,
            controller: self.config.controllers.find(&cluster.controller),
        })
    }

    /// [`Reader::resolve_context`] for the current context.
    pub fn resolve_current(&self) -> Result<ResolvedContext<'a>, ConfigError> {
        self.resolve_context(self.current_context_name())
    }
}

impl Config {
    /// Reduces the document to one context and the entries it references.
    ///
    /// An empty `context` selects the current context.
    pub fn minify(&self, context: &str) -> Result<Config, ConfigError> {
        let name = if context.is_empty() {
            self.current_context.as_str()
        } else {
            context
        };
        let resolved = Reader::new(self).resolve_context(name)?;
        let ctx = self.contexts.find(name).cloned().unwrap_or_default();

        let controllers = resolved
            .controller
            .map(|controller| vec![Named::new(resolved.cluster.controller.as_str(), controller.clone())])
            .unwrap_or_default();

        Ok(Config {
            servers: vec![Named::new(ctx.server.as_str(), resolved.server.clone())],
            authorizations: vec![Named::new(
                ctx.authorization.as_str(),
                resolved.authorization.clone(),
            )],
            clusters: vec![Named::new(ctx.cluster.as_str(), resolved.cluster.clone())],
            controllers,
            contexts: vec![Named::new(name, ctx)],
            current_context: name.to_string(),
            environment: self.environment.clone(),
        })
    }
}
