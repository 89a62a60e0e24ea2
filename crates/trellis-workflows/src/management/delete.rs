//! Management cluster deletion workflow.
//!
//! validate → create bootstrap cluster → install orchestration components
//! → move cluster management onto the bootstrap cluster → delete the
//! target cluster → clean up git repository state → delete the bootstrap
//! cluster.
//!
//! The move reverses the one done at creation: management objects leave
//! the dying cluster so its own deletion can be orchestrated from the
//! bootstrap cluster.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use trellis_common::spec::ClusterSpec;
use trellis_common::types::{Cluster, Operation};
use trellis_common::validations::{self, ValidationResult};
use trellis_common::Result;
use trellis_task::checkpoint::{self, TaskCheckpoint};
use trellis_task::interfaces::Validator;
use trellis_task::{CommandContext, CompletedTask, Dependencies, Task, TaskRunner, Transition};

use crate::diagnostics::{collect_management_diagnostics, CollectDiagnostics};
use crate::{require_cluster, WorkflowConfig};

/// Assembler for the management cluster delete operation
pub struct Delete {
    deps: Dependencies,
    config: WorkflowConfig,
}

impl Delete {
    /// Build the workflow from its collaborators and per-invocation config
    pub fn new(deps: Dependencies, config: WorkflowConfig) -> Self {
        Self { deps, config }
    }

    /// Run the delete workflow against the cluster addressed by
    /// `workload`, returning the first error the chain recorded
    pub async fn run(
        &self,
        spec: ClusterSpec,
        workload: Cluster,
        validator: Arc<dyn Validator>,
    ) -> Result<()> {
        if self.config.force_cleanup {
            self.deps
                .bootstrapper
                .delete_bootstrap_cluster(
                    &Cluster::new(spec.cluster_name(), ""),
                    Operation::Delete,
                    true,
                )
                .await?;
        }

        let mut ctx = CommandContext::new(self.deps.clone(), validator, spec);
        ctx.force_cleanup = self.config.force_cleanup;
        ctx.workload_cluster = Some(workload);

        let runner = TaskRunner::new(Box::new(SetupAndValidate), ctx.writer.clone());
        let runner = if self.config.checkpoint_enabled {
            runner.with_checkpoint()
        } else {
            runner
        };
        runner.run(&mut ctx).await
    }
}

struct SetupAndValidate;

#[async_trait]
impl Task for SetupAndValidate {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        info!("Performing setup and validations");
        let workload = match require_cluster(&ctx.workload_cluster, "workload") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };

        let mut results = vec![ValidationResult::from_result(
            format!("{} provider setup is valid", ctx.provider.name()),
            ctx.provider
                .setup_and_validate_delete(&workload, &ctx.cluster_spec)
                .await,
        )];
        results.extend(ctx.validator.preflight(&ctx.cluster_spec).await);

        match validations::aggregate(results) {
            Ok(()) => Transition::next(CreateBootstrapCluster::default()),
            Err(e) => {
                ctx.set_error(e);
                Transition::Failed
            }
        }
    }

    fn name(&self) -> &'static str {
        "setup-and-validate"
    }

    async fn restore(
        &mut self,
        _ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        Ok(Transition::next(CreateBootstrapCluster::default()))
    }
}

#[derive(Default)]
struct CreateBootstrapCluster {
    bootstrap: Option<Cluster>,
}

#[async_trait]
impl Task for CreateBootstrapCluster {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        info!("Creating bootstrap cluster to host the deletion");
        let opts = match ctx.provider.bootstrap_options(&ctx.cluster_spec) {
            Ok(opts) => opts,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };
        let bootstrap = match ctx
            .bootstrapper
            .create_bootstrap_cluster(&ctx.cluster_spec, &opts)
            .await
        {
            Ok(cluster) => cluster,
            Err(e) => {
                ctx.set_error(e);
                return Transition::next(DeleteBootstrapCluster);
            }
        };
        ctx.bootstrap_cluster = Some(bootstrap.clone());
        self.bootstrap = Some(bootstrap.clone());

        info!("Provider specific pre-bootstrap setup");
        if let Err(e) = ctx
            .provider
            .pre_bootstrap_setup(&bootstrap, &ctx.cluster_spec)
            .await
        {
            ctx.set_error(e);
            return Transition::next(DeleteBootstrapCluster);
        }

        Transition::next(InstallOrchestrator)
    }

    fn name(&self) -> &'static str {
        "bootstrap-cluster-init"
    }

    fn checkpoint(&self) -> Option<TaskCheckpoint> {
        self.bootstrap.as_ref().and_then(checkpoint::to_payload)
    }

    async fn restore(
        &mut self,
        ctx: &mut CommandContext,
        completed: &CompletedTask,
    ) -> Result<Transition> {
        let bootstrap: Cluster = completed.decode()?;
        ctx.bootstrap_cluster = Some(bootstrap);
        Ok(Transition::next(InstallOrchestrator))
    }
}

struct InstallOrchestrator;

#[async_trait]
impl Task for InstallOrchestrator {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        let bootstrap = match require_cluster(&ctx.bootstrap_cluster, "bootstrap") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };

        info!("Installing cluster orchestration components on bootstrap cluster");
        if let Err(e) = ctx
            .cluster_manager
            .install_orchestrator(&ctx.cluster_spec, &bootstrap)
            .await
        {
            ctx.set_error(e);
            return Transition::next(DeleteBootstrapCluster);
        }
        Transition::next(MoveManagementToBootstrap)
    }

    fn name(&self) -> &'static str {
        "orchestrator-install"
    }

    async fn restore(
        &mut self,
        _ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        Ok(Transition::next(MoveManagementToBootstrap))
    }
}

struct MoveManagementToBootstrap;

#[async_trait]
impl Task for MoveManagementToBootstrap {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        let workload = match require_cluster(&ctx.workload_cluster, "workload") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };
        let bootstrap = match require_cluster(&ctx.bootstrap_cluster, "bootstrap") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };

        info!("Moving cluster management from workload to bootstrap cluster");
        if let Err(e) = ctx
            .cluster_manager
            .move_cluster_management(&workload, &bootstrap, &workload.name)
            .await
        {
            ctx.set_error(e);
            return Transition::next(CollectDiagnostics);
        }
        ctx.management_cluster = Some(bootstrap);

        Transition::next(DeleteWorkloadCluster)
    }

    fn name(&self) -> &'static str {
        "management-move-to-bootstrap"
    }

    async fn restore(
        &mut self,
        ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        ctx.management_cluster = ctx.bootstrap_cluster.clone();
        Ok(Transition::next(DeleteWorkloadCluster))
    }
}

struct DeleteWorkloadCluster;

#[async_trait]
impl Task for DeleteWorkloadCluster {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        let management = match require_cluster(&ctx.management_cluster, "management") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };
        let workload = match require_cluster(&ctx.workload_cluster, "workload") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };

        info!("Deleting workload cluster");
        if let Err(e) = ctx
            .cluster_manager
            .delete_cluster(&management, &workload, &ctx.cluster_spec)
            .await
        {
            ctx.set_error(e);
            return Transition::next(CollectDiagnostics);
        }
        Transition::next(CleanupGitRepo)
    }

    fn name(&self) -> &'static str {
        "delete-workload-cluster"
    }

    async fn restore(
        &mut self,
        _ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        Ok(Transition::next(CleanupGitRepo))
    }
}

struct CleanupGitRepo;

#[async_trait]
impl Task for CleanupGitRepo {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        if ctx.cluster_spec.gitops.is_some() {
            info!("Cleaning up Git repository state");
            if let Err(e) = ctx.gitops_manager.cleanup_git_repo(&ctx.cluster_spec).await {
                ctx.set_error(e);
                return Transition::next(CollectDiagnostics);
            }
        }
        Transition::next(DeleteBootstrapCluster)
    }

    fn name(&self) -> &'static str {
        "clean-up-git-repo"
    }

    async fn restore(
        &mut self,
        _ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        Ok(Transition::next(DeleteBootstrapCluster))
    }
}

struct DeleteBootstrapCluster;

#[async_trait]
impl Task for DeleteBootstrapCluster {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        if ctx.first_error().is_some() {
            collect_management_diagnostics(ctx).await;
        }

        if let Some(bootstrap) = ctx.bootstrap_cluster.clone() {
            info!("Deleting bootstrap cluster");
            if let Err(e) = ctx
                .bootstrapper
                .delete_bootstrap_cluster(&bootstrap, Operation::Delete, false)
                .await
            {
                ctx.set_error(e);
            }
        } else {
            info!("Bootstrap cluster information missing, skipping bootstrap cluster deletion");
        }

        if ctx.first_error().is_none() {
            info!(cluster = %ctx.cluster_spec.cluster_name(), "Cluster deleted!");
            Transition::Done
        } else {
            Transition::Failed
        }
    }

    fn name(&self) -> &'static str {
        "delete-bootstrap-cluster"
    }

    async fn restore(
        &mut self,
        _ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        Ok(Transition::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{test_spec, Fixture};
    use trellis_common::types::BootstrapClusterOptions;
    use trellis_common::Error;

    fn target_cluster() -> Cluster {
        Cluster::new("mgmt-1", "/tmp/mgmt-1/mgmt-1.kubeconfig")
    }

    fn bootstrap_cluster() -> Cluster {
        Cluster::new("mgmt-1", "/tmp/mgmt-1/bootstrap.kubeconfig")
    }

    fn expect_until_move(f: &mut Fixture) {
        f.provider.expect_name().return_const("docker".to_string());
        f.provider
            .expect_setup_and_validate_delete()
            .returning(|_, _| Ok(()));
        f.validator.expect_preflight().returning(|_| Vec::new());
        f.provider
            .expect_bootstrap_options()
            .returning(|_| Ok(BootstrapClusterOptions::default()));
        f.bootstrapper
            .expect_create_bootstrap_cluster()
            .returning(|_, _| Ok(bootstrap_cluster()));
        f.provider
            .expect_pre_bootstrap_setup()
            .returning(|_, _| Ok(()));
        f.cluster_manager
            .expect_install_orchestrator()
            .returning(|_, _| Ok(()));
    }

    #[tokio::test]
    async fn test_delete_happy_path_reverses_the_move() {
        let mut f = Fixture::new();
        expect_until_move(&mut f);
        f.cluster_manager
            .expect_move_cluster_management()
            .times(1)
            .withf(|from, to, _| {
                from.kubeconfig_path.ends_with("mgmt-1.kubeconfig")
                    && to.kubeconfig_path.ends_with("bootstrap.kubeconfig")
            })
            .returning(|_, _, _| Ok(()));
        f.cluster_manager
            .expect_delete_cluster()
            .times(1)
            .returning(|_, _, _| Ok(()));
        f.bootstrapper
            .expect_delete_bootstrap_cluster()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let (deps, validator, _root) = f.into_deps();
        let workflow = Delete::new(deps, WorkflowConfig::default());
        workflow
            .run(test_spec("mgmt-1"), target_cluster(), validator)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_failure_collects_diagnostics_and_keeps_bootstrap() {
        let mut f = Fixture::new();
        expect_until_move(&mut f);
        f.cluster_manager
            .expect_move_cluster_management()
            .returning(|_, _, _| Ok(()));
        f.cluster_manager
            .expect_delete_cluster()
            .returning(|_, _, _| Err(Error::cluster_op("mgmt-1", "delete", "machines stuck")));
        // The failure branch collects diagnostics; the bootstrap cluster
        // stays up for debugging (no delete_bootstrap_cluster expectation)
        f.cluster_manager
            .expect_save_logs_management()
            .returning(|_, _| Ok(()));
        f.cluster_manager
            .expect_save_logs_workload()
            .returning(|_, _| Ok(()));

        let (deps, validator, _root) = f.into_deps();
        let workflow = Delete::new(deps, WorkflowConfig::default());
        let err = workflow
            .run(test_spec("mgmt-1"), target_cluster(), validator)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("machines stuck"));
    }

    #[tokio::test]
    async fn test_delete_with_gitops_cleans_repository() {
        let mut f = Fixture::new();
        expect_until_move(&mut f);
        f.cluster_manager
            .expect_move_cluster_management()
            .returning(|_, _, _| Ok(()));
        f.cluster_manager
            .expect_delete_cluster()
            .returning(|_, _, _| Ok(()));
        f.gitops_manager
            .expect_cleanup_git_repo()
            .times(1)
            .returning(|_| Ok(()));
        f.bootstrapper
            .expect_delete_bootstrap_cluster()
            .returning(|_, _, _| Ok(()));

        let mut spec = test_spec("mgmt-1");
        spec.gitops = Some(trellis_common::spec::GitOpsConfig {
            repository: "git@github.com:org/fleet.git".to_string(),
            branch: "main".to_string(),
            cluster_config_path: "clusters/mgmt-1".to_string(),
        });

        let (deps, validator, _root) = f.into_deps();
        let workflow = Delete::new(deps, WorkflowConfig::default());
        workflow
            .run(spec, target_cluster(), validator)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_bootstrap_creation_failure_is_terminal() {
        let mut f = Fixture::new();
        f.provider.expect_name().return_const("docker".to_string());
        f.provider
            .expect_setup_and_validate_delete()
            .returning(|_, _| Ok(()));
        f.validator.expect_preflight().returning(|_| Vec::new());
        f.provider
            .expect_bootstrap_options()
            .returning(|_| Ok(BootstrapClusterOptions::default()));
        f.bootstrapper
            .expect_create_bootstrap_cluster()
            .returning(|_, _| Err(Error::bootstrap_for("mgmt-1", "docker daemon not running")));
        // Terminal cleanup still collects management diagnostics but has
        // no bootstrap cluster to delete and no handles to collect from

        let (deps, validator, _root) = f.into_deps();
        let workflow = Delete::new(deps, WorkflowConfig::default());
        let err = workflow
            .run(test_spec("mgmt-1"), target_cluster(), validator)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("docker daemon not running"));
    }
}
