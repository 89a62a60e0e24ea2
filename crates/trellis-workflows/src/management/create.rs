//! Management cluster creation workflow.
//!
//! validate → create/reuse bootstrap cluster → install orchestration
//! components → install custom components → create workload cluster →
//! install secrets → move cluster management → install git-ops toolkit →
//! write cluster config → delete bootstrap cluster → install packages.
//!
//! When the spec names an existing management cluster, the bootstrap
//! cluster is never created and cluster management is never moved: the
//! existing cluster does both jobs.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use trellis_common::spec::ClusterSpec;
use trellis_common::types::{Cluster, Operation};
use trellis_common::validations::{self, ValidationResult};
use trellis_common::Result;
use trellis_task::checkpoint::{self, TaskCheckpoint};
use trellis_task::interfaces::Validator;
use trellis_task::{CommandContext, CompletedTask, Dependencies, Task, TaskRunner, Transition};

use crate::diagnostics::{
    collect_all_diagnostics, CollectDiagnostics, CollectMgmtClusterDiagnostics,
};
use crate::{cluster_config, require_cluster, WorkflowConfig};

/// Assembler for the management cluster create operation
pub struct Create {
    deps: Dependencies,
    config: WorkflowConfig,
}

impl Create {
    /// Build the workflow from its collaborators and per-invocation config
    pub fn new(deps: Dependencies, config: WorkflowConfig) -> Self {
        Self { deps, config }
    }

    /// Run the create workflow to completion, returning the first error
    /// the chain recorded
    pub async fn run(&self, spec: ClusterSpec, validator: Arc<dyn Validator>) -> Result<()> {
        if self.config.force_cleanup {
            self.deps
                .bootstrapper
                .delete_bootstrap_cluster(
                    &Cluster::new(spec.cluster_name(), ""),
                    Operation::Create,
                    true,
                )
                .await?;
        }

        let mut ctx = CommandContext::new(self.deps.clone(), validator, spec);
        ctx.force_cleanup = self.config.force_cleanup;
        if let Some(management) = ctx.cluster_spec.management_cluster.clone() {
            // An existing management cluster plays the bootstrap role
            ctx.bootstrap_cluster = Some(management.existing_management());
        }

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
        let mut results = vec![ValidationResult::from_result(
            format!("{} provider setup is valid", ctx.provider.name()),
            ctx.provider.setup_and_validate_create(&ctx.cluster_spec).await,
        )];
        if ctx.cluster_spec.gitops.is_some() {
            results.extend(ctx.gitops_manager.preflight(&ctx.cluster_spec).await);
        }
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
        "setup-validate"
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
        if let Some(bootstrap) = &ctx.bootstrap_cluster {
            if bootstrap.existing_management {
                info!(cluster = %bootstrap.name, "Using existing management cluster, skipping bootstrap cluster creation");
                return Transition::next(CreateWorkloadCluster::default());
            }
        }

        info!("Creating new bootstrap cluster");
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
                return Transition::Failed;
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
            return Transition::next(CollectMgmtClusterDiagnostics);
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
        if let Some(bootstrap) = &ctx.bootstrap_cluster {
            if bootstrap.existing_management {
                return Ok(Transition::next(CreateWorkloadCluster::default()));
            }
        }
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
            return Transition::next(CollectMgmtClusterDiagnostics);
        }

        info!("Provider specific post-bootstrap setup");
        if let Err(e) = ctx
            .provider
            .post_bootstrap_setup(&bootstrap, &ctx.cluster_spec)
            .await
        {
            ctx.set_error(e);
            return Transition::next(CollectMgmtClusterDiagnostics);
        }

        Transition::next(InstallCoreComponents)
    }

    fn name(&self) -> &'static str {
        "orchestrator-install"
    }

    async fn restore(
        &mut self,
        _ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        Ok(Transition::next(InstallCoreComponents))
    }
}

struct InstallCoreComponents;

#[async_trait]
impl Task for InstallCoreComponents {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        let bootstrap = match require_cluster(&ctx.bootstrap_cluster, "bootstrap") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };

        info!("Installing custom resource definitions and controllers on bootstrap cluster");
        if let Err(e) = ctx
            .cluster_manager
            .install_custom_components(&ctx.cluster_spec, &bootstrap)
            .await
        {
            ctx.set_error(e);
            return Transition::next(CollectMgmtClusterDiagnostics);
        }

        info!("Applying cluster definition to bootstrap cluster");
        if let Err(e) = ctx
            .cluster_manager
            .apply_cluster_definitions(&bootstrap, &ctx.cluster_spec)
            .await
        {
            ctx.set_error(e);
            return Transition::next(CollectMgmtClusterDiagnostics);
        }

        Transition::next(CreateWorkloadCluster::default())
    }

    fn name(&self) -> &'static str {
        "core-components-install"
    }

    async fn restore(
        &mut self,
        _ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        Ok(Transition::next(CreateWorkloadCluster::default()))
    }
}

#[derive(Default)]
struct CreateWorkloadCluster {
    workload: Option<Cluster>,
}

#[async_trait]
impl Task for CreateWorkloadCluster {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        let managing = match require_cluster(&ctx.bootstrap_cluster, "bootstrap") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };

        info!("Creating new workload cluster");
        let workload = match ctx
            .cluster_manager
            .create_workload_cluster(&managing, &ctx.cluster_spec)
            .await
        {
            Ok(cluster) => cluster,
            Err(e) => {
                ctx.set_error(e);
                return Transition::next(CollectDiagnostics);
            }
        };
        ctx.workload_cluster = Some(workload.clone());
        self.workload = Some(workload.clone());

        // The control plane must answer before anything is installed on it
        if let Err(e) = ctx
            .client_factory
            .build_client_from_kubeconfig(&workload.kubeconfig_path)
            .await
        {
            ctx.set_error(e);
            return Transition::next(CollectDiagnostics);
        }

        Transition::next(InstallSecrets)
    }

    fn name(&self) -> &'static str {
        "workload-cluster-init"
    }

    fn checkpoint(&self) -> Option<TaskCheckpoint> {
        self.workload.as_ref().and_then(checkpoint::to_payload)
    }

    async fn restore(
        &mut self,
        ctx: &mut CommandContext,
        completed: &CompletedTask,
    ) -> Result<Transition> {
        let workload: Cluster = completed.decode()?;
        ctx.workload_cluster = Some(workload);
        Ok(Transition::next(InstallSecrets))
    }
}

struct InstallSecrets;

#[async_trait]
impl Task for InstallSecrets {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        let workload = match require_cluster(&ctx.workload_cluster, "workload") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };

        info!("Installing provider secrets on workload cluster");
        if let Err(e) = ctx.provider.update_secrets(&workload, &ctx.cluster_spec).await {
            ctx.set_error(e);
            return Transition::next(CollectDiagnostics);
        }

        Transition::next(MoveClusterManagement)
    }

    fn name(&self) -> &'static str {
        "install-secrets"
    }

    async fn restore(
        &mut self,
        _ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        Ok(Transition::next(MoveClusterManagement))
    }
}

struct MoveClusterManagement;

#[async_trait]
impl Task for MoveClusterManagement {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        let bootstrap = match require_cluster(&ctx.bootstrap_cluster, "bootstrap") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };
        if bootstrap.existing_management {
            // Management responsibility stays with the existing cluster
            ctx.management_cluster = Some(bootstrap);
            return Transition::next(InstallGitOps);
        }

        let workload = match require_cluster(&ctx.workload_cluster, "workload") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };

        info!("Moving cluster management from bootstrap to workload cluster");
        if let Err(e) = ctx
            .cluster_manager
            .move_cluster_management(&bootstrap, &workload, &workload.name)
            .await
        {
            ctx.set_error(e);
            return Transition::next(CollectDiagnostics);
        }
        ctx.management_cluster = Some(workload.clone());

        if let Err(e) = ctx.provider.post_move_management(&workload).await {
            ctx.set_error(e);
            return Transition::next(CollectDiagnostics);
        }

        Transition::next(InstallGitOps)
    }

    fn name(&self) -> &'static str {
        "cluster-management-move"
    }

    async fn restore(
        &mut self,
        ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        let bootstrap = require_cluster(&ctx.bootstrap_cluster, "bootstrap")?;
        if bootstrap.existing_management {
            ctx.management_cluster = Some(bootstrap);
        } else {
            ctx.management_cluster = Some(require_cluster(&ctx.workload_cluster, "workload")?);
        }
        Ok(Transition::next(InstallGitOps))
    }
}

struct InstallGitOps;

#[async_trait]
impl Task for InstallGitOps {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        if ctx.cluster_spec.gitops.is_none() {
            return Transition::next(WriteClusterConfig);
        }
        let workload = match require_cluster(&ctx.workload_cluster, "workload") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };

        info!("Installing GitOps toolkit on workload cluster");
        if let Err(e) = ctx
            .gitops_manager
            .install_gitops(&workload, &ctx.cluster_spec)
            .await
        {
            // Creation proceeds without reconciliation rather than failing
            warn!(
                error = %e,
                "GitOps toolkit installation failed; continuing with cluster creation, GitOps will not be enabled"
            );
        }

        Transition::next(WriteClusterConfig)
    }

    fn name(&self) -> &'static str {
        "gitops-manager-install"
    }

    async fn restore(
        &mut self,
        _ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        Ok(Transition::next(WriteClusterConfig))
    }
}

struct WriteClusterConfig;

#[async_trait]
impl Task for WriteClusterConfig {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        info!("Writing cluster config file");
        if let Err(e) = cluster_config::write_cluster_config(&ctx.cluster_spec, ctx.writer.as_ref())
        {
            ctx.set_error(e);
            return Transition::next(CollectDiagnostics);
        }
        Transition::next(DeleteBootstrapCluster)
    }

    fn name(&self) -> &'static str {
        "write-cluster-config"
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
            collect_all_diagnostics(ctx).await;
        }

        if let Some(bootstrap) = ctx.bootstrap_cluster.clone() {
            if !bootstrap.existing_management {
                info!("Deleting bootstrap cluster");
                if let Err(e) = ctx
                    .bootstrapper
                    .delete_bootstrap_cluster(&bootstrap, Operation::Create, false)
                    .await
                {
                    ctx.set_error(e);
                }
            }
        }

        if ctx.first_error().is_none() {
            info!(cluster = %ctx.cluster_spec.cluster_name(), "Cluster created!");
            Transition::next(InstallPackages)
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
        Ok(Transition::next(InstallPackages))
    }
}

struct InstallPackages;

#[async_trait]
impl Task for InstallPackages {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        let Some(workload) = ctx.workload_cluster.clone() else {
            return Transition::Done;
        };
        if let Err(e) = ctx
            .package_installer
            .install_packages(&workload, &ctx.cluster_spec)
            .await
        {
            warn!(error = %e, "package installation failed; install packages manually once the cluster is reachable");
        }
        Transition::Done
    }

    fn name(&self) -> &'static str {
        "install-packages"
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
    use crate::testutil::{test_client, test_spec, Fixture};
    use trellis_common::types::BootstrapClusterOptions;
    use trellis_common::Error;

    fn bootstrap_cluster() -> Cluster {
        Cluster::new("mgmt-1", "/tmp/mgmt-1/bootstrap.kubeconfig")
    }

    fn workload_cluster() -> Cluster {
        Cluster::new("mgmt-1", "/tmp/mgmt-1/mgmt-1.kubeconfig")
    }

    fn expect_happy_path_until_workload(f: &mut Fixture) {
        f.provider.expect_name().return_const("docker".to_string());
        f.provider
            .expect_setup_and_validate_create()
            .returning(|_| Ok(()));
        f.validator.expect_preflight().returning(|_| Vec::new());
        f.provider
            .expect_bootstrap_options()
            .returning(|_| Ok(BootstrapClusterOptions::default()));
        f.bootstrapper
            .expect_create_bootstrap_cluster()
            .times(1)
            .returning(|_, _| Ok(bootstrap_cluster()));
        f.provider
            .expect_pre_bootstrap_setup()
            .returning(|_, _| Ok(()));
        f.cluster_manager
            .expect_install_orchestrator()
            .returning(|_, _| Ok(()));
        f.provider
            .expect_post_bootstrap_setup()
            .returning(|_, _| Ok(()));
        f.cluster_manager
            .expect_install_custom_components()
            .returning(|_, _| Ok(()));
        f.cluster_manager
            .expect_apply_cluster_definitions()
            .returning(|_, _| Ok(()));
    }

    #[tokio::test]
    async fn test_create_happy_path_runs_full_chain() {
        let mut f = Fixture::new();
        expect_happy_path_until_workload(&mut f);
        f.cluster_manager
            .expect_create_workload_cluster()
            .times(1)
            .returning(|_, _| Ok(workload_cluster()));
        f.client_factory
            .expect_build_client_from_kubeconfig()
            .returning(|_| Ok(test_client()));
        f.provider.expect_update_secrets().returning(|_, _| Ok(()));
        f.cluster_manager
            .expect_move_cluster_management()
            .times(1)
            .withf(|from, to, name| {
                from.name == "mgmt-1" && to.name == "mgmt-1" && name == "mgmt-1"
            })
            .returning(|_, _, _| Ok(()));
        f.provider
            .expect_post_move_management()
            .returning(|_| Ok(()));
        f.bootstrapper
            .expect_delete_bootstrap_cluster()
            .times(1)
            .returning(|_, _, _| Ok(()));
        f.package_installer
            .expect_install_packages()
            .times(1)
            .returning(|_, _| Ok(()));

        let (deps, validator, root) = f.into_deps();
        let workflow = Create::new(deps, WorkflowConfig::default());
        workflow.run(test_spec("mgmt-1"), validator).await.unwrap();

        // The final config landed on disk
        assert!(root
            .path()
            .join("out/mgmt-1-cluster-config.yaml")
            .exists());
    }

    #[tokio::test]
    async fn test_create_failure_collects_diagnostics_and_keeps_first_error() {
        let mut f = Fixture::new();
        expect_happy_path_until_workload(&mut f);
        f.cluster_manager
            .expect_create_workload_cluster()
            .returning(|_, _| Err(Error::provider_for("mgmt-1", "docker", "out of capacity")));
        f.cluster_manager
            .expect_save_logs_management()
            .times(1)
            .returning(|_, _| Ok(()));
        // No workload handle yet, so no workload log collection and no
        // bootstrap deletion: the bootstrap cluster stays for debugging

        let (deps, validator, _root) = f.into_deps();
        let workflow = Create::new(deps, WorkflowConfig::default());
        let err = workflow
            .run(test_spec("mgmt-1"), validator)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("out of capacity"));
    }

    #[tokio::test]
    async fn test_create_with_existing_management_skips_bootstrap_and_move() {
        let mut f = Fixture::new();
        f.provider.expect_name().return_const("docker".to_string());
        f.provider
            .expect_setup_and_validate_create()
            .returning(|_| Ok(()));
        f.validator.expect_preflight().returning(|_| Vec::new());
        // No bootstrapper, move, or orchestrator expectations: any such
        // call would fail the test
        f.cluster_manager
            .expect_create_workload_cluster()
            .times(1)
            .withf(|management, _| management.name == "existing-mgmt")
            .returning(|_, _| Ok(Cluster::new("ws-1", "/tmp/ws-1/kubeconfig")));
        f.client_factory
            .expect_build_client_from_kubeconfig()
            .returning(|_| Ok(test_client()));
        f.provider.expect_update_secrets().returning(|_, _| Ok(()));
        f.package_installer
            .expect_install_packages()
            .returning(|_, _| Ok(()));

        let mut spec = test_spec("ws-1");
        spec.management_cluster = Some(Cluster::new("existing-mgmt", "/tmp/mgmt/kubeconfig"));

        let (deps, validator, _root) = f.into_deps();
        let workflow = Create::new(deps, WorkflowConfig::default());
        workflow.run(spec, validator).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_preflight_failure_stops_before_any_mutation() {
        let mut f = Fixture::new();
        f.provider.expect_name().return_const("docker".to_string());
        f.provider
            .expect_setup_and_validate_create()
            .returning(|_| Err(Error::validation("datastore missing")));
        f.validator.expect_preflight().returning(|_| Vec::new());

        let (deps, validator, _root) = f.into_deps();
        let workflow = Create::new(deps, WorkflowConfig::default());
        let err = workflow
            .run(test_spec("mgmt-1"), validator)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("datastore missing"));
    }

    #[tokio::test]
    async fn test_create_force_cleanup_deletes_leftover_bootstrap_first() {
        let mut f = Fixture::new();
        let mut seq = mockall::Sequence::new();
        f.bootstrapper
            .expect_delete_bootstrap_cluster()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|cluster, operation, force| {
                cluster.name == "mgmt-1" && *operation == Operation::Create && *force
            })
            .returning(|_, _, _| Ok(()));
        // The leftover cluster is gone; the chain then fails validation so
        // the test stays short
        f.provider.expect_name().return_const("docker".to_string());
        f.provider
            .expect_setup_and_validate_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(Error::validation("stop here")));
        f.validator.expect_preflight().returning(|_| Vec::new());

        let (deps, validator, _root) = f.into_deps();
        let workflow = Create::new(
            deps,
            WorkflowConfig {
                checkpoint_enabled: false,
                force_cleanup: true,
            },
        );
        let err = workflow
            .run(test_spec("mgmt-1"), validator)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("stop here"));
    }

    #[tokio::test]
    async fn test_create_tolerates_gitops_install_failure() {
        let mut f = Fixture::new();
        expect_happy_path_until_workload(&mut f);
        f.gitops_manager.expect_preflight().returning(|_| Vec::new());
        f.cluster_manager
            .expect_create_workload_cluster()
            .returning(|_, _| Ok(workload_cluster()));
        f.client_factory
            .expect_build_client_from_kubeconfig()
            .returning(|_| Ok(test_client()));
        f.provider.expect_update_secrets().returning(|_, _| Ok(()));
        f.cluster_manager
            .expect_move_cluster_management()
            .returning(|_, _, _| Ok(()));
        f.provider
            .expect_post_move_management()
            .returning(|_| Ok(()));
        f.gitops_manager
            .expect_install_gitops()
            .times(1)
            .returning(|_, _| Err(Error::gitops_for("mgmt-1", "repository unreachable")));
        f.bootstrapper
            .expect_delete_bootstrap_cluster()
            .returning(|_, _, _| Ok(()));
        f.package_installer
            .expect_install_packages()
            .returning(|_, _| Ok(()));

        let mut spec = test_spec("mgmt-1");
        spec.gitops = Some(trellis_common::spec::GitOpsConfig {
            repository: "git@github.com:org/fleet.git".to_string(),
            branch: "main".to_string(),
            cluster_config_path: "clusters/mgmt-1".to_string(),
        });

        let (deps, validator, _root) = f.into_deps();
        let workflow = Create::new(deps, WorkflowConfig::default());
        // The run still succeeds
        workflow.run(spec, validator).await.unwrap();
    }
}
