//! Best-effort discovery of the current Kubernetes cluster name.
//!
//! The result only seeds default cluster and controller names, so every failure is
//! treated as "no hint".

use std::process::Command;
use tracing::debug;

/// Name used when no cluster name can be discovered.
pub const FALLBACK_CLUSTER_NAME: &str = "default";

/// Source of a cluster name hint.
pub trait ClusterNameProbe {
    fn cluster_name(&self) -> Option<String>;
}

/// Asks `kubectl` for the first cluster of the minified current kubeconfig.
///
/// This is a bootstrap invocation: the configured kubectl binary cannot be used because
/// the configuration is still being built.
#[derive(Debug, Clone)]
pub struct KubectlProbe {
    bin: String,
}

impl KubectlProbe {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

impl Default for KubectlProbe {
    fn default() -> Self {
        Self::new("kubectl")
    }
}

impl ClusterNameProbe for KubectlProbe {
    fn cluster_name(&self) -> Option<String> {
        let output = Command::new(&self.bin)
            .args([
                "config",
                "view",
                "--minify",
                "--output",
                "jsonpath={.clusters[0].name}",
            ])
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            }
            Ok(output) => {
                debug!(bin = %self.bin, status = %output.status, "cluster name probe failed");
                None
            }
            Err(e) => {
                debug!(bin = %self.bin, error = %e, "cluster name probe unavailable");
                None
            }
        }
    }
}

/// A probe with a predetermined answer.
#[derive(Debug, Clone, Default)]
pub struct FixedClusterName(pub Option<String>);

impl FixedClusterName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(Some(name.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl ClusterNameProbe for FixedClusterName {
    fn cluster_name(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Resolves the cluster name hint. Never returns an empty string.
pub fn bootstrap_cluster_name(probe: &dyn ClusterNameProbe) -> String {
    probe
        .cluster_name()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_CLUSTER_NAME.to_string())
}
