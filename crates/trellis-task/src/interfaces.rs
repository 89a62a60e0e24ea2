//! Collaborator contracts the shared context carries.
//!
//! Every interaction with infrastructure, Kubernetes, or git happens
//! through one of these narrow traits. Concrete implementations live
//! outside the engine; tests drive workflows entirely through mocks
//! (enable the `mocks` feature to use them from another crate).

use std::path::Path;

use async_trait::async_trait;
#[cfg(any(test, feature = "mocks"))]
use mockall::automock;

use trellis_common::spec::ClusterSpec;
use trellis_common::types::{BootstrapClusterOptions, ChangeDiff, Cluster, Operation};
use trellis_common::validations::ValidationResult;
use trellis_common::Result;

/// Infrastructure provider: validates and mutates provider-specific
/// configuration and prepares clusters for orchestration components.
#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider kind (docker, vsphere, baremetal, ...)
    fn name(&self) -> &str;

    /// Validate provider configuration for a create operation
    async fn setup_and_validate_create(&self, spec: &ClusterSpec) -> Result<()>;

    /// Validate provider configuration for an upgrade operation
    async fn setup_and_validate_upgrade(
        &self,
        management: &Cluster,
        spec: &ClusterSpec,
        current_spec: &ClusterSpec,
    ) -> Result<()>;

    /// Validate provider configuration for a delete operation
    async fn setup_and_validate_delete(&self, workload: &Cluster, spec: &ClusterSpec)
        -> Result<()>;

    /// Options the bootstrapper needs to create the ephemeral cluster
    fn bootstrap_options(&self, spec: &ClusterSpec) -> Result<BootstrapClusterOptions>;

    /// Provider-specific setup on the bootstrap cluster before
    /// orchestration components are installed
    async fn pre_bootstrap_setup(&self, cluster: &Cluster, spec: &ClusterSpec) -> Result<()>;

    /// Provider-specific setup on the bootstrap cluster after
    /// orchestration components are installed
    async fn post_bootstrap_setup(&self, cluster: &Cluster, spec: &ClusterSpec) -> Result<()>;

    /// Create or refresh provider credential secrets on the target cluster
    async fn update_secrets(&self, cluster: &Cluster, spec: &ClusterSpec) -> Result<()>;

    /// Whether the provider itself requires a cluster upgrade even if the
    /// cluster spec is unchanged
    async fn upgrade_needed(
        &self,
        spec: &ClusterSpec,
        current_spec: &ClusterSpec,
        cluster: &Cluster,
    ) -> Result<bool>;

    /// Provider-specific fixup after cluster management moved to `cluster`
    async fn post_move_management(&self, cluster: &Cluster) -> Result<()>;

    /// Provider-specific cleanup after the bootstrap cluster is deleted.
    /// Failures are tolerated by callers; the operation already succeeded.
    async fn post_bootstrap_delete(&self, cluster: &Cluster) -> Result<()>;
}

/// Cluster manager: installs orchestration components, applies cluster
/// definitions, and moves cluster-management responsibility between
/// clusters.
#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait ClusterManager: Send + Sync {
    /// Install the cluster-orchestration controllers on a cluster
    async fn install_orchestrator(&self, spec: &ClusterSpec, cluster: &Cluster) -> Result<()>;

    /// Install the custom resource definitions and lifecycle controllers
    async fn install_custom_components(&self, spec: &ClusterSpec, cluster: &Cluster)
        -> Result<()>;

    /// Apply the cluster definition objects described by `spec` to a cluster
    async fn apply_cluster_definitions(&self, cluster: &Cluster, spec: &ClusterSpec)
        -> Result<()>;

    /// Create the workload cluster through the managing cluster
    async fn create_workload_cluster(
        &self,
        management: &Cluster,
        spec: &ClusterSpec,
    ) -> Result<Cluster>;

    /// Move cluster-management responsibility for `cluster_name` from one
    /// cluster to another
    async fn move_cluster_management(
        &self,
        from: &Cluster,
        to: &Cluster,
        cluster_name: &str,
    ) -> Result<()>;

    /// Upgrade the workload cluster to the desired spec
    async fn upgrade_cluster(
        &self,
        management: &Cluster,
        workload: &Cluster,
        spec: &ClusterSpec,
    ) -> Result<()>;

    /// Delete the workload cluster through the managing cluster
    async fn delete_cluster(
        &self,
        management: &Cluster,
        workload: &Cluster,
        spec: &ClusterSpec,
    ) -> Result<()>;

    /// Upgrade the core orchestration components on a cluster, reporting
    /// every component version transition
    async fn upgrade_core_components(
        &self,
        cluster: &Cluster,
        current_spec: &ClusterSpec,
        new_spec: &ClusterSpec,
    ) -> Result<ChangeDiff>;

    /// Re-apply component bundles after core components changed
    async fn apply_bundles(&self, spec: &ClusterSpec, cluster: &Cluster) -> Result<()>;

    /// Read the currently-observed spec of a named cluster
    async fn get_current_spec(&self, cluster: &Cluster, name: &str) -> Result<ClusterSpec>;

    /// Whether the stored cluster definition differs from the desired spec
    async fn cluster_spec_changed(&self, cluster: &Cluster, spec: &ClusterSpec) -> Result<bool>;

    /// Back up cluster-management objects into `dir`; `filter` narrows the
    /// backup to one cluster's objects, empty backs up everything
    async fn backup_management(&self, cluster: &Cluster, dir: &str, filter: &str) -> Result<()>;

    /// Pause reconciliation of the cluster's own definition objects
    async fn pause_cluster_reconcile(&self, cluster: &Cluster, spec: &ClusterSpec) -> Result<()>;

    /// Resume reconciliation of the cluster's own definition objects
    async fn resume_cluster_reconcile(&self, cluster: &Cluster, spec: &ClusterSpec)
        -> Result<()>;

    /// Pause reconciliation of every workload cluster under a management
    /// cluster, ahead of a management move
    async fn pause_workload_reconcile(&self, management: &Cluster) -> Result<()>;

    /// Resume reconciliation of every workload cluster under a management
    /// cluster
    async fn resume_workload_reconcile(&self, management: &Cluster) -> Result<()>;

    /// Collect logs and state from a management cluster (best-effort)
    async fn save_logs_management(&self, spec: &ClusterSpec, cluster: &Cluster) -> Result<()>;

    /// Collect logs and state from a workload cluster (best-effort)
    async fn save_logs_workload(&self, spec: &ClusterSpec, cluster: &Cluster) -> Result<()>;
}

/// Creates and destroys the ephemeral local bootstrap cluster
#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait Bootstrapper: Send + Sync {
    /// Create the bootstrap cluster and return a handle to it
    async fn create_bootstrap_cluster(
        &self,
        spec: &ClusterSpec,
        opts: &BootstrapClusterOptions,
    ) -> Result<Cluster>;

    /// Tear the bootstrap cluster down. `operation` names the lifecycle
    /// operation being served; `force` removes leftovers from a previous
    /// interrupted run.
    async fn delete_bootstrap_cluster(
        &self,
        cluster: &Cluster,
        operation: Operation,
        force: bool,
    ) -> Result<()>;
}

/// Installs and drives the git-ops reconciliation toolkit
#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait GitOpsManager: Send + Sync {
    /// Pre-flight checks for the configured git-ops target
    async fn preflight(&self, spec: &ClusterSpec) -> Vec<ValidationResult>;

    /// Install the git-ops toolkit on a cluster
    async fn install_gitops(&self, cluster: &Cluster, spec: &ClusterSpec) -> Result<()>;

    /// Upgrade the git-ops toolkit, reporting version transitions
    async fn upgrade(
        &self,
        cluster: &Cluster,
        current_spec: &ClusterSpec,
        new_spec: &ClusterSpec,
    ) -> Result<ChangeDiff>;

    /// Pause git-ops reconciliation of cluster resources
    async fn pause_reconcile(&self, cluster: &Cluster, spec: &ClusterSpec) -> Result<()>;

    /// Resume git-ops reconciliation of cluster resources
    async fn resume_reconcile(&self, cluster: &Cluster, spec: &ClusterSpec) -> Result<()>;

    /// Push the desired cluster spec to the git repository
    async fn update_git_spec(&self, spec: &ClusterSpec) -> Result<()>;

    /// Force the toolkit to reconcile the repository's latest commit
    async fn force_reconcile(&self, cluster: &Cluster, spec: &ClusterSpec) -> Result<()>;

    /// Remove this cluster's state from the git repository
    async fn cleanup_git_repo(&self, spec: &ClusterSpec) -> Result<()>;
}

/// Runs named pre-flight checks for an operation
#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait Validator: Send + Sync {
    /// Evaluate every configured check and report each by name
    async fn preflight(&self, spec: &ClusterSpec) -> Vec<ValidationResult>;
}

/// Builds Kubernetes clients for clusters addressed by kubeconfig path
#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Build a client from a kubeconfig file and verify the API server
    /// answers
    async fn build_client_from_kubeconfig(&self, kubeconfig_path: &Path) -> Result<kube::Client>;
}

/// Installs optional add-on packages after a cluster operation succeeds
#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    /// Install configured packages on the cluster. Callers treat failures
    /// as best-effort.
    async fn install_packages(&self, cluster: &Cluster, spec: &ClusterSpec) -> Result<()>;
}
