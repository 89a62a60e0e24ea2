//! Workload cluster creation workflow.
//!
//! validate → create the workload cluster through the management cluster
//! → write cluster config. Every failure branch collects diagnostics.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use trellis_common::spec::ClusterSpec;
use trellis_common::types::Cluster;
use trellis_common::validations::{self, ValidationResult};
use trellis_common::{Error, Result};
use trellis_task::checkpoint::{self, TaskCheckpoint};
use trellis_task::interfaces::Validator;
use trellis_task::{CommandContext, CompletedTask, Dependencies, Task, TaskRunner, Transition};

use crate::diagnostics::CollectDiagnostics;
use crate::{cluster_config, require_cluster, WorkflowConfig};

/// Assembler for the workload cluster create operation
pub struct Create {
    deps: Dependencies,
    config: WorkflowConfig,
}

impl Create {
    /// Build the workflow from its collaborators and per-invocation config
    pub fn new(deps: Dependencies, config: WorkflowConfig) -> Self {
        Self { deps, config }
    }

    /// Run the create workflow; the spec must name the management cluster
    /// that will own the new workload cluster
    pub async fn run(&self, spec: ClusterSpec, validator: Arc<dyn Validator>) -> Result<()> {
        let Some(management) = spec.management_cluster.clone() else {
            return Err(Error::validation_for(
                spec.cluster_name(),
                "workload cluster creation requires a management cluster",
            ));
        };

        let mut ctx = CommandContext::new(self.deps.clone(), validator, spec);
        ctx.management_cluster = Some(management);

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
            Ok(()) => Transition::next(CreateWorkloadCluster::default()),
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
        let management = match require_cluster(&ctx.management_cluster, "management") {
            Ok(c) => c,
            Err(e) => {
                ctx.set_error(e);
                return Transition::Failed;
            }
        };

        info!("Creating new workload cluster");
        let workload = match ctx
            .cluster_manager
            .create_workload_cluster(&management, &ctx.cluster_spec)
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

        // The new control plane must answer before creation is declared done
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
        info!(cluster = %ctx.cluster_spec.cluster_name(), "Cluster created!");
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{test_client, test_spec, Fixture};

    fn managed_spec(name: &str) -> ClusterSpec {
        let mut spec = test_spec(name);
        spec.management_cluster = Some(Cluster::new("mgmt-1", "/tmp/mgmt-1/kubeconfig"));
        spec
    }

    #[tokio::test]
    async fn test_workload_create_happy_path() {
        let mut f = Fixture::new();
        f.provider.expect_name().return_const("docker".to_string());
        f.provider
            .expect_setup_and_validate_create()
            .returning(|_| Ok(()));
        f.validator.expect_preflight().returning(|_| Vec::new());
        f.cluster_manager
            .expect_create_workload_cluster()
            .times(1)
            .withf(|management, spec| {
                management.name == "mgmt-1" && spec.cluster_name() == "ws-1"
            })
            .returning(|_, _| Ok(Cluster::new("ws-1", "/tmp/ws-1/kubeconfig")));
        f.client_factory
            .expect_build_client_from_kubeconfig()
            .returning(|_| Ok(test_client()));

        let (deps, validator, root) = f.into_deps();
        let workflow = Create::new(deps, WorkflowConfig::default());
        workflow.run(managed_spec("ws-1"), validator).await.unwrap();

        assert!(root.path().join("out/ws-1-cluster-config.yaml").exists());
    }

    #[tokio::test]
    async fn test_workload_create_without_management_cluster_is_rejected() {
        let f = Fixture::new();
        let (deps, validator, _root) = f.into_deps();
        let workflow = Create::new(deps, WorkflowConfig::default());

        let err = workflow.run(test_spec("ws-1"), validator).await.unwrap_err();
        assert!(err.to_string().contains("requires a management cluster"));
    }

    #[tokio::test]
    async fn test_workload_create_unreachable_control_plane_fails() {
        let mut f = Fixture::new();
        f.provider.expect_name().return_const("docker".to_string());
        f.provider
            .expect_setup_and_validate_create()
            .returning(|_| Ok(()));
        f.validator.expect_preflight().returning(|_| Vec::new());
        f.cluster_manager
            .expect_create_workload_cluster()
            .returning(|_, _| Ok(Cluster::new("ws-1", "/tmp/ws-1/kubeconfig")));
        f.client_factory
            .expect_build_client_from_kubeconfig()
            .returning(|_| {
                Err(trellis_common::Error::internal_with_context(
                    "client-factory",
                    "connection refused",
                ))
            });
        f.cluster_manager
            .expect_save_logs_management()
            .returning(|_, _| Ok(()));
        f.cluster_manager
            .expect_save_logs_workload()
            .returning(|_, _| Ok(()));

        let (deps, validator, _root) = f.into_deps();
        let workflow = Create::new(deps, WorkflowConfig::default());
        let err = workflow.run(managed_spec("ws-1"), validator).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
