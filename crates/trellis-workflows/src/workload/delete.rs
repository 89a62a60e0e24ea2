//! Workload cluster deletion workflow.
//!
//! validate → delete the workload cluster through its management cluster
//! → clean up git repository state.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use trellis_common::spec::ClusterSpec;
use trellis_common::types::Cluster;
use trellis_common::validations::{self, ValidationResult};
use trellis_common::{Error, Result};
use trellis_task::interfaces::Validator;
use trellis_task::{CommandContext, CompletedTask, Dependencies, Task, TaskRunner, Transition};

use crate::diagnostics::CollectDiagnostics;
use crate::{require_cluster, WorkflowConfig};

/// Assembler for the workload cluster delete operation
pub struct Delete {
    deps: Dependencies,
    config: WorkflowConfig,
}

impl Delete {
    /// Build the workflow from its collaborators and per-invocation config
    pub fn new(deps: Dependencies, config: WorkflowConfig) -> Self {
        Self { deps, config }
    }

    /// Run the delete workflow against the workload cluster addressed by
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
                "workload cluster deletion requires a management cluster",
            ));
        };

        let mut ctx = CommandContext::new(self.deps.clone(), validator, spec);
        ctx.management_cluster = Some(management);
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
            Ok(()) => Transition::next(DeleteWorkloadCluster),
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
        info!(cluster = %ctx.cluster_spec.cluster_name(), "Cluster deleted!");
        Transition::Done
    }

    fn name(&self) -> &'static str {
        "clean-up-git-repo"
    }

    async fn restore(
        &mut self,
        _ctx: &mut CommandContext,
        _completed: &CompletedTask,
    ) -> Result<Transition> {
        Ok(Transition::Done)
    }
}
