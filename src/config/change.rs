//! Configuration changes.
//!
//! A [`Change`] is a value describing one mutation. Applying it consumes a configuration
//! and returns the changed one, so a batch is an ordinary fold that stops at the first
//! error and leaves the caller's copy untouched. Changes are kept around after they are
//! applied in memory so they can be replayed against the persisted document.

use crate::config::credential::TokenCredential;
use crate::config::defaults::apply_server_roots;
use crate::config::merge::{merge_named, merge_string};
use crate::config::types::{
    Authorization, Config, Controller, ControllerEnvVar, Environment, Named, NamedList, Server,
};
use crate::error::{ConfigError, ReferenceKind};
use std::fmt;

#[derive(Clone, PartialEq)]
pub enum Change {
    /// Merges a server, ensures a same-named authorization and applies root defaults.
    SaveServer {
        name: String,
        server: Server,
        environment: Environment,
    },
    /// Replaces the credential of a named authorization with a token.
    SaveToken { name: String, token: TokenCredential },
    /// Records the client registration of a named controller.
    SaveClientRegistration {
        name: String,
        registration_client_uri: String,
        registration_access_token: String,
    },
    /// Merges the references of a context and makes it current.
    ApplyCurrentContext {
        context: String,
        server: String,
        authorization: String,
        cluster: String,
    },
    /// Sets the execution environment from user input.
    SetExecutionEnvironment(String),
    /// Sets a single property by dotted name.
    SetProperty { path: String, value: String },
}

impl Change {
    pub fn save_server(name: impl Into<String>, server: Server, environment: Environment) -> Self {
        Change::SaveServer {
            name: name.into(),
            server,
            environment,
        }
    }

    pub fn save_token(name: impl Into<String>, token: TokenCredential) -> Self {
        Change::SaveToken {
            name: name.into(),
            token,
        }
    }

    pub fn save_client_registration(
        name: impl Into<String>,
        registration_client_uri: impl Into<String>,
        registration_access_token: impl Into<String>,
    ) -> Self {
        Change::SaveClientRegistration {
            name: name.into(),
            registration_client_uri: registration_client_uri.into(),
            registration_access_token: registration_access_token.into(),
        }
    }

    pub fn apply_current_context(
        context: impl Into<String>,
        server: impl Into<String>,
        authorization: impl Into<String>,
        cluster: impl Into<String>,
    ) -> Self {
        Change::ApplyCurrentContext {
            context: context.into(),
            server: server.into(),
            authorization: authorization.into(),
            cluster: cluster.into(),
        }
    }

    pub fn set_execution_environment(raw: impl Into<String>) -> Self {
        Change::SetExecutionEnvironment(raw.into())
    }

    /// `env` is routed to [`Change::SetExecutionEnvironment`] so it gets validated.
    pub fn set_property(path: impl Into<String>, value: impl Into<String>) -> Self {
        let path = path.into();
        if path == "env" {
            return Change::SetExecutionEnvironment(value.into());
        }
        Change::SetProperty {
            path,
            value: value.into(),
        }
    }

    /// Applies this change, returning the changed configuration.
    pub fn apply(&self, mut cfg: Config) -> Result<Config, ConfigError> {
        self.apply_in_place(&mut cfg)?;
        Ok(cfg)
    }

    fn apply_in_place(&self, cfg: &mut Config) -> Result<(), ConfigError> {
        match self {
            Change::SaveServer {
                name,
                server,
                environment,
            } => {
                merge_named(&mut cfg.servers, &[Named::new(name.as_str(), server.clone())]);
                merge_named(
                    &mut cfg.authorizations,
                    &[Named::new(name.as_str(), Authorization::default())],
                );
                // Capture the roots the server had when it was saved
                if let Some(saved) = cfg.servers.find_mut(name) {
                    apply_server_roots(*environment, saved);
                }
                Ok(())
            }
            Change::SaveToken { name, token } => {
                let az = cfg.authorizations.upsert(name);
                az.credential.set_token(
                    token.access_token.as_str(),
                    token.token_type.as_str(),
                    token.refresh_token.as_str(),
                    token.expiry,
                );
                Ok(())
            }
            Change::SaveClientRegistration {
                name,
                registration_client_uri,
                registration_access_token,
            } => {
                let ctrl = cfg.controllers.upsert(name);
                merge_string(&mut ctrl.registration_client_uri, registration_client_uri);
                merge_string(&mut ctrl.registration_access_token, registration_access_token);
                Ok(())
            }
            Change::ApplyCurrentContext {
                context,
                server,
                authorization,
                cluster,
            } => {
                let ctx = cfg.contexts.upsert(context);
                merge_string(&mut ctx.server, server);
                merge_string(&mut ctx.authorization, authorization);
                merge_string(&mut ctx.cluster, cluster);
                merge_string(&mut cfg.current_context, context);
                Ok(())
            }
            Change::SetExecutionEnvironment(raw) => {
                let environment = Environment::parse_alias(raw)?;
                cfg.environment = environment
                    .map(|env| env.stored_value().to_string())
                    .unwrap_or_default();
                Ok(())
            }
            Change::SetProperty { path, value } => set_property(cfg, path, value),
        }
    }

    /// Short description safe for logs; never includes secrets.
    pub fn describe(&self) -> String {
        match self {
            Change::SaveServer { name, .. } => format!("save server '{}'", name),
            Change::SaveToken { name, .. } => format!("save token for '{}'", name),
            Change::SaveClientRegistration { name, .. } => {
                format!("save client registration for '{}'", name)
            }
            Change::ApplyCurrentContext { context, .. } => {
                format!("apply current context '{}'", context)
            }
            Change::SetExecutionEnvironment(raw) => format!("set env '{}'", raw),
            Change::SetProperty { path, .. } => format!("set property '{}'", path),
        }
    }
}

impl fmt::Debug for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Change({})", self.describe())
    }
}

/// Applies `changes` in order, stopping at the first failure.
pub fn apply_all<'a>(
    cfg: Config,
    changes: impl IntoIterator<Item = &'a Change>,
) -> Result<Config, ConfigError> {
    changes
        .into_iter()
        .try_fold(cfg, |cfg, change| change.apply(cfg))
}

fn set_property(cfg: &mut Config, path: &str, value: &str) -> Result<(), ConfigError> {
    let segments: Vec<&str> = path.split('.').collect();
    match segments.as_slice() {
        ["current-context"] => {
            cfg.current_context = value.to_string();
            Ok(())
        }
        ["cluster", name, field] => set_cluster_property(cfg, name, field, path, value),
        ["controller", name, "env", var] => {
            let overlay = Named::new(
                *name,
                Controller {
                    env: vec![ControllerEnvVar::new(*var, value)],
                    ..Default::default()
                },
            );
            merge_named(&mut cfg.controllers, &[overlay]);
            Ok(())
        }
        ["context", name, field] => set_context_property(cfg, name, field, path, value),
        _ => Err(ConfigError::UnknownProperty(path.to_string())),
    }
}

fn set_cluster_property(
    cfg: &mut Config,
    cluster_name: &str,
    field: &str,
    path: &str,
    value: &str,
) -> Result<(), ConfigError> {
    let cluster = cfg
        .clusters
        .find_mut(cluster_name)
        .ok_or_else(|| ConfigError::UnknownReference {
            kind: ReferenceKind::Cluster,
            name: cluster_name.to_string(),
        })?;

    let target = match field {
        "context" => &mut cluster.context,
        "bin" => &mut cluster.bin,
        "controller" => &mut cluster.controller,
        _ => return Err(ConfigError::UnknownProperty(path.to_string())),
    };
    *target = value.to_string();
    Ok(())
}

fn set_context_property(
    cfg: &mut Config,
    context_name: &str,
    field: &str,
    path: &str,
    value: &str,
) -> Result<(), ConfigError> {
    if !cfg.contexts.contains_name(context_name) {
        return Err(ConfigError::UnknownReference {
            kind: ReferenceKind::Context,
            name: context_name.to_string(),
        });
    }

    let (kind, exists) = match field {
        "server" => (ReferenceKind::Server, cfg.servers.contains_name(value)),
        "authorization" => (
            ReferenceKind::Authorization,
            cfg.authorizations.contains_name(value),
        ),
        "cluster" => (ReferenceKind::Cluster, cfg.clusters.contains_name(value)),
        _ => return Err(ConfigError::UnknownProperty(path.to_string())),
    };
    if !exists {
        return Err(ConfigError::UnknownReference {
            kind,
            name: value.to_string(),
        });
    }

    if let Some(ctx) = cfg.contexts.find_mut(context_name) {
        let target = match kind {
            ReferenceKind::Server => &mut ctx.server,
            ReferenceKind::Authorization => &mut ctx.authorization,
            _ => &mut ctx.cluster,
        };
        *target = value.to_string();
    }
    Ok(())
}
