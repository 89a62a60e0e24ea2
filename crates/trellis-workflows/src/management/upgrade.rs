//! Management cluster upgrade workflow.
//!
//! validate → update secrets → pause reconciliation → upgrade core
//! components → decide whether a cluster upgrade is needed → create
//! bootstrap cluster → install orchestration components → move cluster
//! management to bootstrap (with a pre-move backup) → upgrade the cluster
//! → move cluster management back → reconcile cluster definitions → write
//! cluster config → delete bootstrap cluster.
//!
//! This is the workflow checkpointing exists for: the chain is long, every
//! step can block on infrastructure, and a resumed run must not repeat
//! completed moves or upgrades.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use trellis_common::spec::ClusterSpec;
use trellis_common::types::{ChangeDiff, Cluster, Operation};
use trellis_common::validations::{self, ValidationResult};
use trellis_common::Result;
use trellis_task::checkpoint::{self, TaskCheckpoint};
use trellis_task::interfaces::Validator;
use trellis_task::{CommandContext, CompletedTask, Dependencies, Task, TaskRunner, Transition};

use crate::diagnostics::{
    collect_all_diagnostics, CollectDiagnostics, CollectMgmtClusterDiagnostics,
};
use crate::{cluster_config, require_cluster, WorkflowConfig};

/// Assembler for the management cluster upgrade operation
pub struct Upgrade {
    deps: Dependencies,
    config: WorkflowConfig,
}

impl Upgrade {
    /// Build the workflow from its collaborators and per-invocation config
    pub fn new(deps: Dependencies, config: WorkflowConfig) -> Self {
        Self { deps, config }
    }

    /// Run the upgrade workflow against the management cluster addressed
    /// by `management`, returning the first error the chain recorded
    pub async fn run(
        &self,
        spec: ClusterSpec,
        management: Cluster,
        validator: Arc<dyn Validator>,
    ) -> Result<()> {
        let mut ctx = CommandContext::new(self.deps.clone(), validator, spec);
        ctx.force_cleanup = self.config.force_cleanup;
        // A management cluster upgrades itself: the cluster under upgrade
        // and the cluster holding management responsibility start out as
        // the same handle
        ctx.management_cluster = Some(management.clone());
        ctx.workload_cluster = Some(management);

        let runner = TaskRunner::new(Box::new(SetupAndValidate::default()), ctx.writer.clone());
        let runner = if self.config.checkpoint_enabled {
            runner.with_checkpoint()
        } else {
            runner
        };
        runner.run(&mut ctx).await
    }
}

#[derive(Default)]
struct SetupAndValidate {
    current_spec: Option<ClusterSpec>,
}

#[async_trait]
impl Task for SetupAndValidate {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        info!("Performing setup and validations");
        let management = match require_cluster(&ctx.management_cluster, "management") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };

        let current = match ctx
            .cluster_manager
            .get_current_spec(&management, ctx.cluster_spec.cluster_name())
            .await
        {
            Ok(spec) => spec,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };
        ctx.current_cluster_spec = Some(current.clone());
        self.current_spec = Some(current.clone());

        let mut results = vec![ValidationResult::from_result(
            format!("{} provider setup is valid", ctx.provider.name()),
            ctx.provider
                .setup_and_validate_upgrade(&management, &ctx.cluster_spec, &current)
                .await,
        )];
        results.extend(ctx.validator.preflight(&ctx.cluster_spec).await);

        match validations::aggregate(results) {
            Ok(()) => Transition::next(UpdateSecrets),
            Err(e) => {
                ctx.set_error(e);
                Transition::Failed
            }
        }
    }

    fn name(&self) -> &'static str {
        "setup-and-validate"
    }

    fn checkpoint(&self) -> Option<TaskCheckpoint> {
        self.current_spec.as_ref().and_then(checkpoint::to_payload)
    }

    async fn restore(
        &mut self,
        ctx: &mut CommandContext,
        completed: &CompletedTask,
    ) -> Result<Transition> {
        let current: ClusterSpec = completed.decode()?;
        ctx.current_cluster_spec = Some(current);
        Ok(Transition::next(UpdateSecrets))
    }
}

struct UpdateSecrets;

#[async_trait]
impl Task for UpdateSecrets {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        let management = match require_cluster(&ctx.management_cluster, "management") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };

        info!("Updating provider secrets on management cluster");
        if let Err(e) = ctx
            .provider
            .update_secrets(&management, &ctx.cluster_spec)
            .await
        {
            ctx.set_error(e);
            return Transition::next(CollectDiagnostics);
        }
        Transition::next(PauseReconcile)
    }

    fn name(&self) -> &'static str {
        "update-secrets"
    }

    async fn restore(
        &mut self,
        _ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        Ok(Transition::next(PauseReconcile))
    }
}

struct PauseReconcile;

#[async_trait]
impl Task for PauseReconcile {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        let management = match require_cluster(&ctx.management_cluster, "management") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };
        let Some(current) = ctx.current_cluster_spec.clone() else {
            ctx.set_error(trellis_common::Error::internal_with_context(
                "workflow",
                "current cluster spec missing before pause",
            ));
            return Transition::Failed;
        };

        info!("Pausing cluster controller reconcile");
        if let Err(e) = ctx
            .cluster_manager
            .pause_cluster_reconcile(&management, &current)
            .await
        {
            ctx.set_error(e);
            return Transition::next(CollectDiagnostics);
        }

        if ctx.cluster_spec.gitops.is_some() {
            info!("Pausing GitOps cluster resources reconcile");
            if let Err(e) = ctx
                .gitops_manager
                .pause_reconcile(&management, &ctx.cluster_spec)
                .await
            {
                ctx.set_error(e);
                return Transition::next(CollectDiagnostics);
            }
        }

        Transition::next(UpgradeCoreComponents::default())
    }

    fn name(&self) -> &'static str {
        "pause-controllers-reconcile"
    }

    async fn restore(
        &mut self,
        _ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        Ok(Transition::next(UpgradeCoreComponents::default()))
    }
}

#[derive(Default)]
struct UpgradeCoreComponents {
    change_diff: ChangeDiff,
}

#[async_trait]
impl Task for UpgradeCoreComponents {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        let management = match require_cluster(&ctx.management_cluster, "management") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };
        let Some(current) = ctx.current_cluster_spec.clone() else {
            ctx.set_error(trellis_common::Error::internal_with_context(
                "workflow",
                "current cluster spec missing before core component upgrade",
            ));
            return Transition::Failed;
        };

        info!("Upgrading core components");
        match ctx
            .cluster_manager
            .upgrade_core_components(&management, &current, &ctx.cluster_spec)
            .await
        {
            Ok(diff) => ctx.change_diff.append(diff),
            Err(e) => {
                ctx.set_error(e);
                return Transition::next(CollectDiagnostics);
            }
        }

        if ctx.cluster_spec.gitops.is_some() {
            match ctx
                .gitops_manager
                .upgrade(&management, &current, &ctx.cluster_spec)
                .await
            {
                Ok(diff) => ctx.change_diff.append(diff),
                Err(e) => {
                    ctx.set_error(e);
                    return Transition::next(CollectDiagnostics);
                }
            }
        }

        self.change_diff = ctx.change_diff.clone();
        Transition::next(UpgradeNeeded::default())
    }

    fn name(&self) -> &'static str {
        "upgrade-core-components"
    }

    fn checkpoint(&self) -> Option<TaskCheckpoint> {
        checkpoint::to_payload(&self.change_diff)
    }

    async fn restore(
        &mut self,
        ctx: &mut CommandContext,
        completed: &CompletedTask,
    ) -> Result<Transition> {
        let diff: ChangeDiff = completed.decode()?;
        ctx.change_diff = diff.clone();
        self.change_diff = diff;
        Ok(Transition::next(UpgradeNeeded::default()))
    }
}

#[derive(Default)]
struct UpgradeNeeded {
    needed: Option<bool>,
}

#[async_trait]
impl Task for UpgradeNeeded {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        let management = match require_cluster(&ctx.management_cluster, "management") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };
        let Some(current) = ctx.current_cluster_spec.clone() else {
            ctx.set_error(trellis_common::Error::internal_with_context(
                "workflow",
                "current cluster spec missing before upgrade decision",
            ));
            return Transition::Failed;
        };

        match ctx
            .provider
            .upgrade_needed(&ctx.cluster_spec, &current, &management)
            .await
        {
            Ok(true) => {
                debug!("Provider needs a cluster upgrade");
                self.needed = Some(true);
                return Transition::next(CreateBootstrapCluster::default());
            }
            Ok(false) => {}
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        }

        match ctx
            .cluster_manager
            .cluster_spec_changed(&management, &ctx.cluster_spec)
            .await
        {
            Ok(true) => {
                self.needed = Some(true);
                Transition::next(CreateBootstrapCluster::default())
            }
            Ok(false) => {
                info!("No upgrades needed from cluster spec");
                self.needed = Some(false);
                Transition::next(ReconcileClusterDefinitions { spec_changed: false })
            }
            Err(e) => {
                ctx.set_error(e);
                Transition::next(CollectDiagnostics)
            }
        }
    }

    fn name(&self) -> &'static str {
        "upgrade-needed"
    }

    fn checkpoint(&self) -> Option<TaskCheckpoint> {
        // The decision itself is the resume state: without it a resumed
        // run could not tell "upgrade in flight" from "nothing to do"
        self.needed.as_ref().and_then(checkpoint::to_payload)
    }

    async fn restore(
        &mut self,
        _ctx: &mut CommandContext,
        completed: &CompletedTask,
    ) -> Result<Transition> {
        let needed: bool = completed.decode()?;
        if needed {
            Ok(Transition::next(CreateBootstrapCluster::default()))
        } else {
            Ok(Transition::next(ReconcileClusterDefinitions { spec_changed: false }))
        }
    }
}

#[derive(Default)]
struct CreateBootstrapCluster {
    bootstrap: Option<Cluster>,
}

#[async_trait]
impl Task for CreateBootstrapCluster {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        if ctx.force_cleanup {
            if let Err(e) = ctx
                .bootstrapper
                .delete_bootstrap_cluster(
                    &Cluster::new(ctx.cluster_spec.cluster_name(), ""),
                    Operation::Upgrade,
                    true,
                )
                .await
            {
                ctx.set_error(e);
                return Transition::Failed;
            }
        }

        info!("Creating bootstrap cluster");
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
            return Transition::next(CollectMgmtClusterDiagnostics);
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
        let management = match require_cluster(&ctx.management_cluster, "management") {
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
        let cluster_name = ctx.cluster_spec.cluster_name().to_string();
        let backup_dir = ctx.backup_cluster_state_dir.clone();

        // Full backup first; fall back to a backup filtered to this
        // cluster's objects before giving up
        info!("Backing up cluster management resources before moving to bootstrap cluster");
        if ctx
            .cluster_manager
            .backup_management(&management, &backup_dir, "")
            .await
            .is_err()
        {
            if let Err(e) = ctx
                .cluster_manager
                .backup_management(&management, &backup_dir, &cluster_name)
                .await
            {
                ctx.set_error(trellis_common::Error::move_in_phase(
                    &cluster_name,
                    "backup",
                    e.to_string(),
                ));
                return Transition::next(CollectDiagnostics);
            }
        }

        debug!("Pausing workload cluster reconciliation before the move");
        if let Err(e) = ctx.cluster_manager.pause_workload_reconcile(&management).await {
            ctx.set_error(e);
            return Transition::next(CollectDiagnostics);
        }

        info!("Moving cluster management from workload to bootstrap cluster");
        if let Err(e) = ctx
            .cluster_manager
            .move_cluster_management(&management, &bootstrap, &cluster_name)
            .await
        {
            ctx.set_error(e);
            return Transition::next(CollectDiagnostics);
        }

        if let Err(e) = ctx.provider.post_move_management(&bootstrap).await {
            ctx.set_error(e);
            return Transition::next(CollectDiagnostics);
        }

        ctx.management_cluster = Some(bootstrap);
        Transition::next(UpgradeCluster)
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
        Ok(Transition::next(UpgradeCluster))
    }
}

struct UpgradeCluster;

#[async_trait]
impl Task for UpgradeCluster {
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

        info!("Upgrading workload cluster");
        if let Err(e) = ctx
            .cluster_manager
            .upgrade_cluster(&management, &workload, &ctx.cluster_spec)
            .await
        {
            ctx.set_error(e);
            // The pre-move backup may predate partial upgrade work; take a
            // best-effort backup of the bootstrap side as well
            if let Some(bootstrap) = ctx.bootstrap_cluster.clone() {
                info!("Backing up management resources from bootstrap cluster");
                let dir = format!("bootstrap-{}", ctx.backup_cluster_state_dir);
                if let Err(backup_err) = ctx
                    .cluster_manager
                    .backup_management(&bootstrap, &dir, &workload.name)
                    .await
                {
                    warn!(
                        error = %backup_err,
                        "bootstrap management state backup failed, use the pre-move backup"
                    );
                }
            }
            return Transition::next(CollectDiagnostics);
        }

        if ctx.change_diff.changed() {
            info!("Applying component bundles after core component changes");
            if let Err(e) = ctx
                .cluster_manager
                .apply_bundles(&ctx.cluster_spec, &workload)
                .await
            {
                ctx.set_error(e);
                return Transition::next(CollectDiagnostics);
            }
        }

        Transition::next(MoveManagementToWorkload)
    }

    fn name(&self) -> &'static str {
        "upgrade-workload-cluster"
    }

    async fn restore(
        &mut self,
        _ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        Ok(Transition::next(MoveManagementToWorkload))
    }
}

struct MoveManagementToWorkload;

#[async_trait]
impl Task for MoveManagementToWorkload {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        let bootstrap = match require_cluster(&ctx.bootstrap_cluster, "bootstrap") {
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

        debug!("Resuming workload cluster reconciliation after the move");
        if let Err(e) = ctx.cluster_manager.resume_workload_reconcile(&workload).await {
            ctx.set_error(e);
            return Transition::next(CollectDiagnostics);
        }

        Transition::next(ReconcileClusterDefinitions { spec_changed: true })
    }

    fn name(&self) -> &'static str {
        "management-move-to-workload"
    }

    async fn restore(
        &mut self,
        ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        ctx.management_cluster = ctx.workload_cluster.clone();
        Ok(Transition::next(ReconcileClusterDefinitions { spec_changed: true }))
    }
}

struct ReconcileClusterDefinitions {
    spec_changed: bool,
}

#[async_trait]
impl Task for ReconcileClusterDefinitions {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        let management = match require_cluster(&ctx.management_cluster, "management") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };

        info!("Updating cluster definition resources");
        if let Err(e) = ctx
            .cluster_manager
            .apply_cluster_definitions(&management, &ctx.cluster_spec)
            .await
        {
            ctx.set_error(e);
            return Transition::next(CollectDiagnostics);
        }

        info!("Resuming cluster controller reconcile");
        if let Err(e) = ctx
            .cluster_manager
            .resume_cluster_reconcile(&management, &ctx.cluster_spec)
            .await
        {
            ctx.set_error(e);
            return Transition::next(CollectDiagnostics);
        }

        if ctx.cluster_spec.gitops.is_some() {
            info!("Updating Git repository with the new cluster spec");
            if let Err(e) = ctx.gitops_manager.update_git_spec(&ctx.cluster_spec).await {
                ctx.set_error(e);
                return Transition::next(CollectDiagnostics);
            }

            info!("Forcing reconcile of the Git repository's latest commit");
            if let Err(e) = ctx
                .gitops_manager
                .force_reconcile(&management, &ctx.cluster_spec)
                .await
            {
                ctx.set_error(e);
                return Transition::next(CollectDiagnostics);
            }

            info!("Resuming GitOps cluster resources reconcile");
            if let Err(e) = ctx
                .gitops_manager
                .resume_reconcile(&management, &ctx.cluster_spec)
                .await
            {
                // Reconciliation can be resumed by hand; keep going so the
                // cluster config still lands on disk
                ctx.set_error(e);
                return Transition::next(WriteClusterConfig);
            }
        }

        if !self.spec_changed {
            // Nothing changed and nothing was rewritten: the operation is
            // complete, not failed
            return Transition::Done;
        }
        Transition::next(WriteClusterConfig)
    }

    fn name(&self) -> &'static str {
        "reconcile-cluster-definitions"
    }

    async fn restore(
        &mut self,
        _ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        if self.spec_changed {
            Ok(Transition::next(WriteClusterConfig))
        } else {
            Ok(Transition::Done)
        }
    }
}

struct WriteClusterConfig;

#[async_trait]
impl Task for WriteClusterConfig {
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition {
        info!("Writing cluster config file");
        if let Err(e) = cluster_config::write_cluster_config(&ctx.cluster_spec, ctx.writer.as_ref())
        {
            // The bootstrap cluster must still be cleaned up
            ctx.set_error(e);
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

        let Some(bootstrap) = ctx.bootstrap_cluster.clone() else {
            info!("Bootstrap cluster information missing, skipping bootstrap cluster deletion");
            return self.finish(ctx);
        };

        info!("Deleting bootstrap cluster");
        if let Err(e) = ctx
            .bootstrapper
            .delete_bootstrap_cluster(&bootstrap, Operation::Upgrade, false)
            .await
        {
            ctx.set_error(e);
        }

        if ctx.first_error().is_none() {
            if let Some(management) = ctx.management_cluster.clone() {
                if let Err(e) = ctx.provider.post_bootstrap_delete(&management).await {
                    // The upgrade already succeeded; this cleanup is advisory
                    warn!(error = %e, "provider post-bootstrap-delete cleanup failed");
                }
            }
            let backup = ctx.writer.dir().join(&ctx.backup_cluster_state_dir);
            if let Err(e) = std::fs::remove_dir_all(&backup) {
                debug!(path = %backup.display(), error = %e, "no management state backup to remove");
            }
        }

        self.finish(ctx)
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

impl DeleteBootstrapCluster {
    fn finish(&self, ctx: &CommandContext) -> Transition {
        if ctx.first_error().is_none() {
            info!(cluster = %ctx.cluster_spec.cluster_name(), "Cluster upgraded!");
            Transition::Done
        } else {
            Transition::Failed
        }
    }
}
