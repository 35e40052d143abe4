//! Configuration System
//!
//! Layered resolution of the Optimize tool configuration. A persisted document is read
//! from the XDG locations, merged over an empty configuration, completed with defaults
//! for the selected execution environment and exposed through a [`Reader`]. Changes are
//! described as [`Change`] values, applied in memory and replayed against the persisted
//! document on write.

mod change;
mod credential;
mod defaults;
mod discovery;
mod file;
mod merge;
mod paths;
mod reader;
mod render;
mod session;
mod types;

pub use change::{apply_all, Change};
pub use credential::{ClientCredential, Credential, TokenCredential};
pub use defaults::{apply_server_endpoints, apply_server_roots, resolve, Defaults, DEFAULT_NAME};
pub use discovery::{
    bootstrap_cluster_name, ClusterNameProbe, FixedClusterName, KubectlProbe,
    FALLBACK_CLUSTER_NAME,
};
pub use file::{parse, read, write};
pub use merge::{merge_named, Merge};
pub use paths::{config_home, ConfigPaths, CONFIG_FILENAME};
pub use reader::{Reader, ResolvedContext};
pub use render::{render, Format, RenderOptions};
pub use session::{ConfigSession, LoadOptions, Overrides};
pub use types::{
    ApiServer, ApplicationServer, Authorization, AuthorizationServer, Cluster, Config, Context,
    Controller, ControllerEnvVar, Entity, Environment, Named, NamedList, Server,
};
