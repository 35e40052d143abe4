//! Configuration aggregate and the entities stored in its named collections.
//!
//! Field names under `Server` and `Authorization` use snake_case to stay compatible with
//! the OAuth 2.0 / RFC 8414 metadata they mirror.

use crate::config::credential::Credential;
use crate::error::{ConfigError, ReferenceKind};
use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Named<Server>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorizations: Vec<Named<Authorization>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clusters: Vec<Named<Cluster>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controllers: Vec<Named<Controller>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contexts: Vec<Named<Context>>,

    /// Name of the context used when none is requested explicitly
    #[serde(
        rename = "current-context",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub current_context: String,

    /// Execution environment; empty means production
    #[serde(rename = "env", default, skip_serializing_if = "String::is_empty")]
    pub environment: String,
}

/// How to communicate with an Optimize API server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    /// URI identifying the API root. Must not carry a query or fragment.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub identifier: String,

    #[serde(skip_serializing_if = "ApiServer::is_empty")]
    pub api: ApiServer,

    #[serde(skip_serializing_if = "AuthorizationServer::is_empty")]
    pub authorization: AuthorizationServer,

    #[serde(skip_serializing_if = "ApplicationServer::is_empty")]
    pub application: ApplicationServer,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiServer {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub applications_endpoint: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub experiments_endpoint: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub accounts_endpoint: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub performance_token_endpoint: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub registry_registration_endpoint: String,
}

/// Authorization server metadata (RFC 8414). Do not add non-standard fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizationServer {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub issuer: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub authorization_endpoint: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token_endpoint: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub revocation_endpoint: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub registration_endpoint: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub device_authorization_endpoint: String,
    #[serde(rename = "jwks_uri", skip_serializing_if = "String::is_empty")]
    pub json_web_key_set_uri: String,
}

/// The user facing application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationServer {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub base_url: String,
    /// Where the user lands after a successful login
    #[serde(skip_serializing_if = "String::is_empty")]
    pub auth_success_endpoint: String,
}

macro_rules! impl_is_empty {
    ($($ty:ty),*) => {
        $(impl $ty {
            pub fn is_empty(&self) -> bool {
                *self == Self::default()
            }
        })*
    };
}

impl_is_empty!(ApiServer, AuthorizationServer, ApplicationServer);

/// Information presented to prove authorization to a server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Authorization {
    pub credential: Credential,
}

/// How to reach a Kubernetes cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cluster {
    /// Path to a kubeconfig file; empty means the kubectl default
    #[serde(rename = "kubeconfig", skip_serializing_if = "String::is_empty")]
    pub kube_config: String,

    /// kubeconfig context name; empty means the current kubeconfig context
    #[serde(skip_serializing_if = "String::is_empty")]
    pub context: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    /// Path to the kubectl binary
    #[serde(skip_serializing_if = "String::is_empty")]
    pub bin: String,

    /// Name of the controller entry used with this cluster
    #[serde(skip_serializing_if = "String::is_empty")]
    pub controller: String,
}

/// Controller settings for a specific cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Controller {
    #[serde(rename = "deploymentName", skip_serializing_if = "String::is_empty")]
    pub deployment_name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    /// Client configuration endpoint of the controller's registered client
    #[serde(skip_serializing_if = "String::is_empty")]
    pub registration_client_uri: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub registration_access_token: String,

    /// Extra environment handed to the controller during authorization
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<ControllerEnvVar>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerEnvVar {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl ControllerEnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A server, authorization and cluster selected together by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub authorization: String,

    /// A cluster name in this document, not a kubeconfig name
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cluster: String,
}

/// Types that can live in a named collection.
pub trait Entity: Default {
    /// Key holding the body next to `name` in the persisted form
    const KEY: &'static str;
    const KIND: ReferenceKind;
}

impl Entity for Server {
    const KEY: &'static str = "server";
    const KIND: ReferenceKind = ReferenceKind::Server;
}

impl Entity for Authorization {
    const KEY: &'static str = "authorization";
    const KIND: ReferenceKind = ReferenceKind::Authorization;
}

impl Entity for Cluster {
    const KEY: &'static str = "cluster";
    const KIND: ReferenceKind = ReferenceKind::Cluster;
}

impl Entity for Controller {
    const KEY: &'static str = "controller";
    const KIND: ReferenceKind = ReferenceKind::Controller;
}

impl Entity for Context {
    const KEY: &'static str = "context";
    const KIND: ReferenceKind = ReferenceKind::Context;
}

/// A body associated with a referencable name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Named<T> {
    pub name: String,
    pub body: T,
}

impl<T> Named<T> {
    pub fn new(name: impl Into<String>, body: T) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

impl<T: Entity + Serialize> Serialize for Named<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry(T::KEY, &self.body)?;
        map.end()
    }
}

impl<'de, T: Entity + Deserialize<'de>> Deserialize<'de> for Named<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NamedVisitor<T>(PhantomData<T>);

        impl<'de, T: Entity + Deserialize<'de>> Visitor<'de> for NamedVisitor<T> {
            type Value = Named<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a named {} entry", T::KIND)
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Named<T>, A::Error> {
                let mut name: Option<String> = None;
                let mut body: Option<T> = None;
                while let Some(key) = map.next_key::<String>()? {
                    if key == "name" {
                        if name.is_some() {
                            return Err(de::Error::duplicate_field("name"));
                        }
                        name = map.next_value::<Option<String>>()?;
                    } else if key == T::KEY {
                        if body.is_some() {
                            return Err(de::Error::duplicate_field(T::KEY));
                        }
                        body = map.next_value::<Option<T>>()?;
                    } else {
                        map.next_value::<IgnoredAny>()?;
                    }
                }
                Ok(Named {
                    name: name.unwrap_or_default(),
                    body: body.unwrap_or_default(),
                })
            }
        }

        deserializer.deserialize_map(NamedVisitor(PhantomData))
    }
}

/// First-match-by-name lookups over a named collection.
pub trait NamedList<T> {
    fn find(&self, name: &str) -> Option<&T>;
    fn find_mut(&mut self, name: &str) -> Option<&mut T>;
    fn contains_name(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
    /// Returns the named body, appending an empty one when it does not exist.
    fn upsert(&mut self, name: &str) -> &mut T;
    fn names(&self) -> Vec<String>;
}

impl<T: Default> NamedList<T> for Vec<Named<T>> {
    fn find(&self, name: &str) -> Option<&T> {
        self.iter().find(|n| n.name == name).map(|n| &n.body)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut T> {
        self.iter_mut().find(|n| n.name == name).map(|n| &mut n.body)
    }

    fn upsert(&mut self, name: &str) -> &mut T {
        let index = match self.iter().position(|n| n.name == name) {
            Some(index) => index,
            None => {
                self.push(Named::new(name, T::default()));
                self.len() - 1
            }
        };
        &mut self[index].body
    }

    fn names(&self) -> Vec<String> {
        self.iter().map(|n| n.name.clone()).collect()
    }
}

/// Deployment environment of the backend the tool talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Production,
    Staging,
    Development,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Staging => "staging",
            Environment::Development => "development",
        }
    }

    /// Interprets a stored `env` value. Only canonical names are accepted; empty is production.
    pub fn from_stored(value: &str) -> Result<Self, ConfigError> {
        match value {
            "" | "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" => Ok(Environment::Development),
            other => Err(ConfigError::UnresolvableEnvironment(other.to_string())),
        }
    }

    /// Normalizes user input. Returns `None` for an empty value.
    pub fn parse_alias(value: &str) -> Result<Option<Self>, ConfigError> {
        if value.is_empty() {
            return Ok(None);
        }
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Some(Environment::Production)),
            "staging" | "stage" => Ok(Some(Environment::Staging)),
            "development" | "dev" => Ok(Some(Environment::Development)),
            _ => Err(ConfigError::InvalidEnvironmentAlias(value.to_string())),
        }
    }

    /// Value written to the document; production is implicit and never persisted.
    pub fn stored_value(&self) -> &'static str {
        match self {
            Environment::Production => "",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
