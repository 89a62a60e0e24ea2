//! Core value types shared across workflows: cluster handles, lifecycle
//! operations, and component change-diffs.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Handle to a cluster involved in a lifecycle operation.
///
/// A handle is how workflows address a cluster: its name plus the
/// kubeconfig used to reach it. The same type serves the bootstrap,
/// management, and workload roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Cluster name, unique per invocation
    pub name: String,
    /// Path to the kubeconfig file for this cluster
    pub kubeconfig_path: PathBuf,
    /// True when this cluster already served as a management cluster
    /// before the current operation started. Steps that create bootstrap
    /// infrastructure or move cluster management short-circuit on it.
    #[serde(default)]
    pub existing_management: bool,
}

impl Cluster {
    /// Create a handle for a cluster reachable through the given kubeconfig
    pub fn new(name: impl Into<String>, kubeconfig_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kubeconfig_path: kubeconfig_path.into(),
            existing_management: false,
        }
    }

    /// Mark this handle as an already-existing management cluster
    pub fn existing_management(mut self) -> Self {
        self.existing_management = true;
        self
    }
}

/// Lifecycle operation a workflow performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Cluster creation
    Create,
    /// Cluster upgrade
    Upgrade,
    /// Cluster deletion
    Delete,
}

impl Operation {
    /// Stable string form, used in logs and error context
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Upgrade => "upgrade",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single component version transition discovered during an upgrade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentChangeDiff {
    /// Component name (e.g. "cluster-orchestrator", "gitops-toolkit")
    pub component_name: String,
    /// Version currently installed
    pub old_version: String,
    /// Version the upgrade moves to
    pub new_version: String,
}

/// Ordered list of component version transitions accumulated across
/// core-component-upgrade steps.
///
/// The diff is append-only: steps add transitions, nothing removes them.
/// At the end of an upgrade the diff decides whether dependent steps
/// (re-applying bundles) are necessary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDiff {
    /// Transitions in the order they were discovered
    pub component_reports: Vec<ComponentChangeDiff>,
}

impl ChangeDiff {
    /// Create an empty diff
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single component transition
    pub fn add(
        &mut self,
        component: impl Into<String>,
        old_version: impl Into<String>,
        new_version: impl Into<String>,
    ) {
        self.component_reports.push(ComponentChangeDiff {
            component_name: component.into(),
            old_version: old_version.into(),
            new_version: new_version.into(),
        });
    }

    /// Append every transition from another diff, preserving order
    pub fn append(&mut self, other: ChangeDiff) {
        self.component_reports.extend(other.component_reports);
    }

    /// True when at least one component changed version
    pub fn changed(&self) -> bool {
        !self.component_reports.is_empty()
    }
}

/// Options a provider hands to the bootstrapper when creating the
/// ephemeral local cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapClusterOptions {
    /// Environment variables the bootstrap process needs (credentials,
    /// proxy settings)
    #[serde(default)]
    pub env: std::collections::BTreeMap<String, String>,
    /// Host ports the bootstrap cluster must expose
    #[serde(default)]
    pub extra_port_mappings: Vec<u16>,
    /// Registry mirror to pull bootstrap images through, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_mirror: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_handle_roundtrip() {
        let cluster = Cluster::new("prod", "/tmp/prod/kubeconfig").existing_management();
        let yaml = serde_yaml::to_string(&cluster).unwrap();
        let back: Cluster = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(cluster, back);
        assert!(back.existing_management);
    }

    #[test]
    fn test_existing_management_defaults_to_false() {
        let back: Cluster =
            serde_yaml::from_str("name: dev\nkubeconfigPath: /tmp/kubeconfig\n").unwrap();
        assert!(!back.existing_management);
    }

    #[test]
    fn test_change_diff_accumulates_in_order() {
        let mut diff = ChangeDiff::new();
        assert!(!diff.changed());

        diff.add("cluster-orchestrator", "1.5.0", "1.6.1");
        let mut other = ChangeDiff::new();
        other.add("gitops-toolkit", "2.0.0", "2.1.0");
        diff.append(other);

        assert!(diff.changed());
        let names: Vec<_> = diff
            .component_reports
            .iter()
            .map(|r| r.component_name.as_str())
            .collect();
        assert_eq!(names, vec!["cluster-orchestrator", "gitops-toolkit"]);
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Create.to_string(), "create");
        assert_eq!(Operation::Upgrade.as_str(), "upgrade");
        assert_eq!(Operation::Delete.to_string(), "delete");
    }
}
