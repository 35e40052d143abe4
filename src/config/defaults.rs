//! Default resolution: fills every field left empty after loading.
//!
//! Nothing here overwrites a non-empty value, so resolving twice is a no-op. Errors are
//! limited to configurations that cannot be used at all and abort the whole pass.

use crate::config::types::{Config, Environment, NamedList, Server};
use crate::error::{ConfigError, ReferenceKind};
use tracing::{debug, instrument};
use url::Url;

/// Name given to seeded servers, authorizations and contexts.
pub const DEFAULT_NAME: &str = "default";

const DEFAULT_KUBECTL: &str = "kubectl";
const DEFAULT_CONTROLLER_DEPLOYMENT: &str = "optimize-controller-manager";
const DEFAULT_CONTROLLER_NAMESPACE: &str = "stormforge-system";
const PERFORMANCE_TOKEN_ENDPOINT: &str = "https://app.stormforger.com/optimize/oauth/tokens";
const AUTH_SUCCESS_ENDPOINT: &str = "https://docs.stormforge.io/api/auth_success/";

/// Root URLs of a deployment environment.
struct ServerRoots {
    identifier: &'static str,
    issuer: &'static str,
    base_url: &'static str,
}

fn server_roots(environment: Environment) -> ServerRoots {
    match environment {
        Environment::Production => ServerRoots {
            identifier: "https://api.stormforge.io/",
            issuer: "https://auth.stormforge.io/",
            base_url: "https://app.stormforge.io/",
        },
        Environment::Staging => ServerRoots {
            identifier: "https://api.stormforge.dev/",
            issuer: "https://auth.stormforge.dev/",
            base_url: "https://app.stormforge.dev/",
        },
        Environment::Development => ServerRoots {
            identifier: "https://api.dev-1.dev.gramlabs.dev/",
            issuer: "https://auth.dev-1.dev.gramlabs.dev/",
            base_url: "https://app.dev-1.dev.gramlabs.dev/",
        },
    }
}

/// Overwrites an empty `field` with `value`.
fn default_string(field: &mut String, value: &str) {
    if field.is_empty() {
        *field = value.to_string();
    }
}

/// Fills the identifier, issuer and application base URL for `environment`.
pub fn apply_server_roots(environment: Environment, server: &mut Server) {
    let roots = server_roots(environment);
    default_string(&mut server.identifier, roots.identifier);
    default_string(&mut server.authorization.issuer, roots.issuer);
    default_string(&mut server.application.base_url, roots.base_url);
}

/// Derives every other endpoint from the resolved identifier and issuer.
pub fn apply_server_endpoints(server: &mut Server) -> Result<(), ConfigError> {
    let api = issuer_url(&server.identifier)?;
    let issuer = issuer_url(&server.authorization.issuer)?;

    default_string(
        &mut server.api.applications_endpoint,
        &format!("{}/v2/applications/", api),
    );
    default_string(
        &mut server.api.experiments_endpoint,
        &format!("{}/v1/experiments/", api),
    );
    default_string(
        &mut server.api.accounts_endpoint,
        &format!("{}/v1/accounts/", api),
    );
    default_string(
        &mut server.api.performance_token_endpoint,
        PERFORMANCE_TOKEN_ENDPOINT,
    );

    let az = &mut server.authorization;
    default_string(&mut az.authorization_endpoint, &format!("{}/authorize", issuer));
    default_string(&mut az.token_endpoint, &format!("{}/oauth/token", issuer));
    default_string(&mut az.revocation_endpoint, &format!("{}/oauth/revoke", issuer));
    default_string(
        &mut az.device_authorization_endpoint,
        &format!("{}/oauth/device/code", issuer),
    );
    default_string(
        &mut az.json_web_key_set_uri,
        &format!("{}/.well-known/jwks.json", issuer),
    );

    default_string(
        &mut server.application.auth_success_endpoint,
        AUTH_SUCCESS_ENDPOINT,
    );

    // Client and robot registration live under the accounts API
    let (clients, robots) = match Url::parse(&server.api.accounts_endpoint) {
        Ok(accounts) => (
            join_segment(&accounts, "clients"),
            join_segment(&accounts, "robots"),
        ),
        Err(_) => (
            format!("{}/v1/accounts/clients", api),
            format!("{}/v1/accounts/robots", api),
        ),
    };
    default_string(&mut server.authorization.registration_endpoint, &clients);
    default_string(&mut server.api.registry_registration_endpoint, &robots);

    Ok(())
}

/// Validates an identifier or issuer and returns it without the trailing slash.
fn issuer_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidServerUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("must not have a query or fragment".to_string()));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn join_segment(base: &Url, segment: &str) -> String {
    let mut url = base.clone();
    let path = format!("{}/{}", base.path().trim_end_matches('/'), segment);
    url.set_path(&path);
    url.to_string()
}

/// Candidate names for an implied reference, tried in order.
struct ImpliedName<'a> {
    kind: ReferenceKind,
    /// Description of the entity owning the field, used in errors
    owner: String,
    /// (a) an entry named after the owner
    owner_name: Option<&'a str>,
    /// (b) an auxiliary key, e.g. the resolved server of a context
    auxiliary: Option<&'a str>,
    /// (d) the collection's well known fallback name
    fallback: &'a str,
}

impl ImpliedName<'_> {
    fn resolve(&self, field: &mut String, names: &[String]) -> Result<(), ConfigError> {
        if !field.is_empty() {
            return Ok(());
        }
        let contains = |candidate: &str| names.iter().any(|n| n == candidate);

        let implied = self
            .owner_name
            .filter(|name| contains(*name))
            .or_else(|| self.auxiliary.filter(|aux| !aux.is_empty() && contains(*aux)))
            .or_else(|| match names {
                [only] => Some(only.as_str()),
                _ => None,
            })
            .or_else(|| Some(self.fallback).filter(|name| contains(*name)));

        match implied {
            Some(name) => {
                *field = name.to_string();
                Ok(())
            }
            None => Err(ConfigError::AmbiguousOrMissingReference {
                kind: self.kind,
                owner: self.owner.clone(),
            }),
        }
    }
}

/// Fills the gaps of a freshly loaded configuration.
#[derive(Debug, Clone)]
pub struct Defaults {
    environment: Environment,
    cluster_name: String,
}

impl Defaults {
    /// `environment` is the stored (canonical) value; anything unknown is fatal.
    pub fn new(environment: &str, cluster_name: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            environment: Environment::from_stored(environment)?,
            cluster_name: cluster_name.into(),
        })
    }

    #[instrument(level = "debug", skip_all, fields(environment = %self.environment, cluster = %self.cluster_name))]
    pub fn apply(&self, cfg: &mut Config) -> Result<(), ConfigError> {
        self.add_default_objects(cfg);
        self.apply_server_defaults(cfg)?;
        self.apply_cluster_defaults(cfg)?;
        self.apply_controller_defaults(cfg);
        self.apply_context_defaults(cfg)?;
        debug!(
            current_context = %cfg.current_context,
            contexts = cfg.contexts.len(),
            "defaults applied"
        );
        Ok(())
    }

    fn add_default_objects(&self, cfg: &mut Config) {
        if cfg.servers.is_empty() {
            cfg.servers.upsert(DEFAULT_NAME);
        }
        if cfg.authorizations.is_empty() {
            cfg.authorizations.upsert(DEFAULT_NAME);
        }
        if cfg.clusters.is_empty() {
            cfg.clusters.upsert(&self.cluster_name);
        }
        if cfg.controllers.is_empty() {
            cfg.controllers.upsert(&self.cluster_name);
        }
        if cfg.contexts.is_empty() {
            cfg.contexts.upsert(DEFAULT_NAME);
        }
    }

    fn apply_server_defaults(&self, cfg: &mut Config) -> Result<(), ConfigError> {
        for server in cfg.servers.iter_mut() {
            apply_server_roots(self.environment, &mut server.body);
            apply_server_endpoints(&mut server.body)?;
        }
        Ok(())
    }

    fn apply_cluster_defaults(&self, cfg: &mut Config) -> Result<(), ConfigError> {
        let controllers = cfg.controllers.names();
        for cluster in cfg.clusters.iter_mut() {
            default_string(&mut cluster.body.bin, DEFAULT_KUBECTL);

            ImpliedName {
                kind: ReferenceKind::Controller,
                owner: format!("cluster: {}", cluster.name),
                owner_name: Some(&cluster.name),
                auxiliary: None,
                fallback: &self.cluster_name,
            }
            .resolve(&mut cluster.body.controller, &controllers)?;
        }
        Ok(())
    }

    fn apply_controller_defaults(&self, cfg: &mut Config) {
        for controller in cfg.controllers.iter_mut() {
            default_string(
                &mut controller.body.deployment_name,
                DEFAULT_CONTROLLER_DEPLOYMENT,
            );
            default_string(&mut controller.body.namespace, DEFAULT_CONTROLLER_NAMESPACE);
        }
    }

    fn apply_context_defaults(&self, cfg: &mut Config) -> Result<(), ConfigError> {
        let servers = cfg.servers.names();
        let authorizations = cfg.authorizations.names();
        let clusters = cfg.clusters.names();

        for context in cfg.contexts.iter_mut() {
            let owner = format!("context: {}", context.name);
            let ctx = &mut context.body;

            ImpliedName {
                kind: ReferenceKind::Server,
                owner: owner.clone(),
                owner_name: Some(&context.name),
                auxiliary: None,
                fallback: DEFAULT_NAME,
            }
            .resolve(&mut ctx.server, &servers)?;

            ImpliedName {
                kind: ReferenceKind::Authorization,
                owner: owner.clone(),
                owner_name: Some(&context.name),
                auxiliary: Some(&ctx.server),
                fallback: DEFAULT_NAME,
            }
            .resolve(&mut ctx.authorization, &authorizations)?;

            ImpliedName {
                kind: ReferenceKind::Cluster,
                owner,
                owner_name: Some(&context.name),
                auxiliary: None,
                fallback: &self.cluster_name,
            }
            .resolve(&mut ctx.cluster, &clusters)?;
        }

        let contexts = cfg.contexts.names();
        ImpliedName {
            kind: ReferenceKind::Context,
            owner: "current context".to_string(),
            owner_name: None,
            auxiliary: None,
            fallback: DEFAULT_NAME,
        }
        .resolve(&mut cfg.current_context, &contexts)
    }
}

/// Applies defaults for the stored environment and the given cluster name hint.
pub fn resolve(cfg: &mut Config, cluster_name: &str) -> Result<(), ConfigError> {
    Defaults::new(&cfg.environment, cluster_name)?.apply(cfg)
}
