//! Workload cluster upgrade workflow.
//!
//! validate → decide whether an upgrade is needed → upgrade the workload
//! cluster through its management cluster → write cluster config. When
//! neither the provider nor the spec demands work, the chain finishes
//! early with no error.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use trellis_common::spec::ClusterSpec;
use trellis_common::types::Cluster;
use trellis_common::validations::{self, ValidationResult};
use trellis_common::{Error, Result};
use trellis_task::checkpoint::{self, TaskCheckpoint};
use trellis_task::interfaces::Validator;
use trellis_task::{CommandContext, CompletedTask, Dependencies, Task, TaskRunner, Transition};

use crate::diagnostics::CollectDiagnostics;
use crate::{cluster_config, require_cluster, WorkflowConfig};

/// Assembler for the workload cluster upgrade operation
pub struct Upgrade {
    deps: Dependencies,
    config: WorkflowConfig,
}

impl Upgrade {
    /// Build the workflow from its collaborators and per-invocation config
    pub fn new(deps: Dependencies, config: WorkflowConfig) -> Self {
        Self { deps, config }
    }

    /// Run the upgrade workflow against the workload cluster addressed by
    /// `workload`; the spec must name its management cluster
    pub async fn run(
        &self,
        spec: ClusterSpec,
        workload: Cluster,
        validator: Arc<dyn Validator>,
    ) -> Result<()> {
        let Some(management) = spec.management_cluster.clone() else {
            return Err(Error::validation_for(
                spec.cluster_name(),
                "workload cluster upgrade requires a management cluster",
            ));
        };

        let mut ctx = CommandContext::new(self.deps.clone(), validator, spec);
        ctx.management_cluster = Some(management);
        ctx.workload_cluster = Some(workload);

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
            Ok(()) => Transition::next(UpgradeNeeded::default()),
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
            ctx.set_error(Error::internal_with_context(
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
                return Transition::next(UpgradeCluster);
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
                Transition::next(UpgradeCluster)
            }
            Ok(false) => {
                info!("No upgrades needed from cluster spec");
                self.needed = Some(false);
                Transition::Done
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
            Ok(Transition::next(UpgradeCluster))
        } else {
            Ok(Transition::Done)
        }
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
            return Transition::next(CollectDiagnostics);
        }

        // The upgraded control plane must still answer
        if let Err(e) = ctx
            .client_factory
            .build_client_from_kubeconfig(&workload.kubeconfig_path)
            .await
        {
            ctx.set_error(e);
            return Transition::next(CollectDiagnostics);
        }

        Transition::next(WriteClusterConfig)
    }

    fn name(&self) -> &'static str {
        "upgrade-workload-cluster"
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
        info!(cluster = %ctx.cluster_spec.cluster_name(), "Cluster upgraded!");
        Transition::Done
    }

    fn name(&self) -> &'static str {
        "write-cluster-config"
    }

    async fn restore(
        &mut self,
        _ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        Ok(Transition::Done)
    }
}
