//! Desired-state specification for a cluster lifecycle operation.
//!
//! The spec is provider-agnostic: anything infrastructure-specific is
//! resolved by the provider collaborator. Workflows compare the desired
//! spec against the currently-observed spec to decide whether work is
//! needed.

use serde::{Deserialize, Serialize};

use crate::types::Cluster;

/// Provider-agnostic description of the cluster a workflow should produce
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Shape of the cluster itself
    pub cluster: ClusterConfig,
    /// GitOps reconciliation target, when configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitops: Option<GitOpsConfig>,
    /// Handle to the management cluster responsible for this cluster.
    /// Absent for self-managed (management) clusters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_cluster: Option<Cluster>,
    /// Version of the component bundle this spec was resolved against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundles_version: Option<String>,
}

/// Shape of the cluster: name, version, and node counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    /// Cluster name
    pub name: String,
    /// Kubernetes version to run
    pub kubernetes_version: String,
    /// Number of control plane nodes
    pub control_plane_count: u32,
    /// Number of worker nodes
    pub worker_node_count: u32,
    /// Infrastructure provider kind (docker, vsphere, baremetal, ...)
    pub provider: String,
}

/// GitOps reconciliation configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitOpsConfig {
    /// Git repository URL holding the cluster definitions
    pub repository: String,
    /// Branch the toolkit reconciles from
    pub branch: String,
    /// Path within the repository where this cluster's config lives
    pub cluster_config_path: String,
}

impl ClusterSpec {
    /// True when this cluster manages itself (no separate management cluster)
    pub fn is_self_managed(&self) -> bool {
        self.management_cluster.is_none()
    }

    /// True when a separate management cluster owns this cluster's
    /// orchestration objects
    pub fn is_managed(&self) -> bool {
        self.management_cluster.is_some()
    }

    /// Name of the cluster this spec describes
    pub fn cluster_name(&self) -> &str {
        &self.cluster.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> ClusterSpec {
        ClusterSpec {
            cluster: ClusterConfig {
                name: name.to_string(),
                kubernetes_version: "1.31".to_string(),
                control_plane_count: 3,
                worker_node_count: 2,
                provider: "docker".to_string(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_self_managed_when_no_management_cluster() {
        let s = spec("mgmt");
        assert!(s.is_self_managed());
        assert!(!s.is_managed());
    }

    #[test]
    fn test_managed_when_management_cluster_set() {
        let mut s = spec("workload-1");
        s.management_cluster = Some(Cluster::new("mgmt", "/tmp/mgmt/kubeconfig"));
        assert!(s.is_managed());
        assert!(!s.is_self_managed());
    }

    #[test]
    fn test_spec_yaml_roundtrip() {
        let mut s = spec("prod");
        s.gitops = Some(GitOpsConfig {
            repository: "git@github.com:org/fleet.git".to_string(),
            branch: "main".to_string(),
            cluster_config_path: "clusters/prod".to_string(),
        });
        let yaml = serde_yaml::to_string(&s).unwrap();
        let back: ClusterSpec = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(s, back);
    }
}
