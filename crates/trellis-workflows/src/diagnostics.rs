//! Diagnostics collection tasks.
//!
//! Terminal, best-effort side-steps reachable from every failure branch.
//! Log collection failing must never mask the original failure: these
//! tasks swallow their own errors and never touch the error slot.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use trellis_task::{CommandContext, CompletedTask, Task, Transition};
use trellis_common::Result;

/// Collect logs and state from the management (or bootstrap) cluster
pub struct CollectMgmtClusterDiagnostics;

/// Collect logs and state from the workload cluster
pub struct CollectWorkloadClusterDiagnostics;

/// Collect diagnostics from both clusters, management first
pub struct CollectDiagnostics;

/// Best-effort log collection from whichever cluster currently holds
/// management responsibility
pub(crate) async fn collect_management_diagnostics(ctx: &CommandContext) {
    let Some(cluster) = ctx.managing_cluster() else {
        debug!("no management cluster handle, skipping diagnostics collection");
        return;
    };
    info!(cluster = %cluster.name, "Collecting diagnostics from management cluster");
    if let Err(e) = ctx
        .cluster_manager
        .save_logs_management(&ctx.cluster_spec, cluster)
        .await
    {
        warn!(cluster = %cluster.name, error = %e, "management cluster log collection failed");
    }
}

/// Best-effort log collection from the workload cluster
pub(crate) async fn collect_workload_diagnostics(ctx: &CommandContext) {
    let Some(cluster) = ctx.workload_cluster.as_ref() else {
        debug!("no workload cluster handle, skipping diagnostics collection");
        return;
    };
    info!(cluster = %cluster.name, "Collecting diagnostics from workload cluster");
    if let Err(e) = ctx
        .cluster_manager
        .save_logs_workload(&ctx.cluster_spec, cluster)
        .await
    {
        warn!(cluster = %cluster.name, error = %e, "workload cluster log collection failed");
    }
}

/// Collect from both clusters, management first
pub(crate) async fn collect_all_diagnostics(ctx: &CommandContext) {
    collect_management_diagnostics(ctx).await;
    collect_workload_diagnostics(ctx).await;
}

/// Terminal transition for a diagnostics task: the chain stops here, and
/// whether it stopped cleanly depends only on the error slot
fn terminal(ctx: &CommandContext) -> Transition {
    if ctx.first_error().is_some() {
        Transition::Failed
    } else {
        Transition::Done
    }
}

#[async_trait]
impl Task for CollectMgmtClusterDiagnostics {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        collect_management_diagnostics(ctx).await;
        terminal(ctx)
    }

    fn name(&self) -> &'static str {
        "collect-mgmt-cluster-diagnostics"
    }

    async fn restore(
        &mut self,
        ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        Ok(terminal(ctx))
    }
}

#[async_trait]
impl Task for CollectWorkloadClusterDiagnostics {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        collect_workload_diagnostics(ctx).await;
        terminal(ctx)
    }

    fn name(&self) -> &'static str {
        "collect-workload-cluster-diagnostics"
    }

    async fn restore(
        &mut self,
        ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        Ok(terminal(ctx))
    }
}

#[async_trait]
impl Task for CollectDiagnostics {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        collect_all_diagnostics(ctx).await;
        terminal(ctx)
    }

    fn name(&self) -> &'static str {
        "collect-cluster-diagnostics"
    }

    async fn restore(
        &mut self,
        ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        Ok(terminal(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use trellis_common::filewriter::DirectoryWriter;
    use trellis_common::spec::{ClusterConfig, ClusterSpec};
    use trellis_common::types::Cluster;
    use trellis_common::Error;
    use trellis_task::interfaces::{
        MockBootstrapper, MockClientFactory, MockClusterManager, MockGitOpsManager,
        MockPackageInstaller, MockProvider, MockValidator,
    };
    use trellis_task::Dependencies;

    fn test_spec() -> ClusterSpec {
        ClusterSpec {
            cluster: ClusterConfig {
                name: "diag-test".to_string(),
                kubernetes_version: "1.31".to_string(),
                control_plane_count: 1,
                worker_node_count: 1,
                provider: "docker".to_string(),
            },
            ..Default::default()
        }
    }

    fn context_with(cluster_manager: MockClusterManager) -> (CommandContext, tempfile::TempDir) {
        let root = tempfile::tempdir().unwrap();
        let writer = Arc::new(DirectoryWriter::new(root.path().join("out")).unwrap());
        let deps = Dependencies {
            provider: Arc::new(MockProvider::new()),
            cluster_manager: Arc::new(cluster_manager),
            bootstrapper: Arc::new(MockBootstrapper::new()),
            gitops_manager: Arc::new(MockGitOpsManager::new()),
            client_factory: Arc::new(MockClientFactory::new()),
            package_installer: Arc::new(MockPackageInstaller::new()),
            writer,
        };
        (
            CommandContext::new(deps, Arc::new(MockValidator::new()), test_spec()),
            root,
        )
    }

    #[tokio::test]
    async fn test_collection_failure_never_masks_original_error() {
        let mut manager = MockClusterManager::new();
        manager
            .expect_save_logs_management()
            .returning(|_, _| Err(Error::internal("log collection broke")));
        manager
            .expect_save_logs_workload()
            .returning(|_, _| Err(Error::internal("log collection broke")));

        let (mut ctx, _root) = context_with(manager);
        ctx.management_cluster = Some(Cluster::new("mgmt", "/tmp/mgmt"));
        ctx.workload_cluster = Some(Cluster::new("workload", "/tmp/workload"));
        ctx.set_error(Error::validation("the original failure"));

        let transition = CollectDiagnostics.run(&mut ctx).await;
        assert!(matches!(transition, Transition::Failed));
        assert!(ctx
            .first_error()
            .unwrap()
            .to_string()
            .contains("the original failure"));
    }

    #[tokio::test]
    async fn test_combined_collects_management_then_workload() {
        let mut manager = MockClusterManager::new();
        let mut seq = mockall::Sequence::new();
        manager
            .expect_save_logs_management()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        manager
            .expect_save_logs_workload()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let (mut ctx, _root) = context_with(manager);
        ctx.bootstrap_cluster = Some(Cluster::new("bootstrap", "/tmp/bootstrap"));
        ctx.workload_cluster = Some(Cluster::new("workload", "/tmp/workload"));
        ctx.set_error(Error::validation("failure"));

        let transition = CollectDiagnostics.run(&mut ctx).await;
        assert!(matches!(transition, Transition::Failed));
    }

    #[tokio::test]
    async fn test_workload_flavor_collects_workload_logs_only() {
        let mut manager = MockClusterManager::new();
        manager
            .expect_save_logs_workload()
            .times(1)
            .returning(|_, _| Ok(()));
        // No save_logs_management expectation: the workload flavor must
        // not touch the management cluster

        let (mut ctx, _root) = context_with(manager);
        ctx.management_cluster = Some(Cluster::new("mgmt", "/tmp/mgmt"));
        ctx.workload_cluster = Some(Cluster::new("workload", "/tmp/workload"));
        ctx.set_error(Error::validation("failure"));

        let transition = CollectWorkloadClusterDiagnostics.run(&mut ctx).await;
        assert!(matches!(transition, Transition::Failed));
    }

    #[tokio::test]
    async fn test_management_flavor_falls_back_to_bootstrap_handle() {
        let mut manager = MockClusterManager::new();
        manager
            .expect_save_logs_management()
            .times(1)
            .withf(|_, cluster| cluster.name == "bootstrap")
            .returning(|_, _| Ok(()));

        let (mut ctx, _root) = context_with(manager);
        ctx.bootstrap_cluster = Some(Cluster::new("bootstrap", "/tmp/bootstrap"));
        ctx.set_error(Error::validation("failure"));

        let transition = CollectMgmtClusterDiagnostics.run(&mut ctx).await;
        assert!(matches!(transition, Transition::Failed));
    }

    #[tokio::test]
    async fn test_missing_handles_skip_collection() {
        // No expectations: any call would panic the mock
        let manager = MockClusterManager::new();
        let (mut ctx, _root) = context_with(manager);

        let transition = CollectDiagnostics.run(&mut ctx).await;
        assert!(matches!(transition, Transition::Done));
    }
}
