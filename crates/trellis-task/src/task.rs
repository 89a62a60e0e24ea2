//! Task contract, shared command context, and the task runner.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use trellis_common::filewriter::FileWriter;
use trellis_common::spec::ClusterSpec;
use trellis_common::types::{ChangeDiff, Cluster};
use trellis_common::{Error, Result, CHECKPOINT_FILE_SUFFIX};

use crate::checkpoint::{self, CheckpointInfo, CompletedTask, TaskCheckpoint};
use crate::interfaces::{
    Bootstrapper, ClientFactory, ClusterManager, GitOpsManager, PackageInstaller, Provider,
    Validator,
};
use crate::profiler::Profiler;

/// What a task hands back to the runner.
///
/// Termination is explicit: a chain that finished its work returns
/// [`Transition::Done`], a chain that stopped because the error slot was
/// set returns [`Transition::Failed`]. Decision tasks that detect "no
/// work needed" use `Done`, never an error.
pub enum Transition {
    /// Continue with this task
    Next(Box<dyn Task>),
    /// The chain completed its work
    Done,
    /// The chain terminated after an error was recorded on the context
    Failed,
}

impl Transition {
    /// Continue with the given task
    pub fn next<T: Task + 'static>(task: T) -> Self {
        Transition::Next(Box::new(task))
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Next(t) => f.debug_tuple("Next").field(&t.name()).finish(),
            Transition::Done => f.write_str("Done"),
            Transition::Failed => f.write_str("Failed"),
        }
    }
}

/// A logical unit of work within a lifecycle operation.
///
/// A task mutates the shared [`CommandContext`], performs external side
/// effects, and returns the next task in the chain. On failure it records
/// the error with [`CommandContext::set_error`] and returns a diagnostics
/// or cleanup successor instead of propagating the error upward.
#[async_trait]
pub trait Task: Send {
    /// Perform this task's action and choose the successor
    async fn run(&mut self, ctx: &mut CommandContext) -> Transition;

    /// Stable name, unique within a chain; used for logging, profiling,
    /// and checkpoint lookups
    fn name(&self) -> &'static str;

    /// Snapshot of whatever this task must reproduce on resume; `None`
    /// for tasks whose effects are fully recoverable from the context
    fn checkpoint(&self) -> Option<TaskCheckpoint> {
        None
    }

    /// Invoked instead of [`Task::run`] when resuming a chain in which
    /// this task already completed. Must rebuild the context mutations
    /// from the recorded payload and return the successor `run` would
    /// have returned, without repeating side effects.
    async fn restore(
        &mut self,
        ctx: &mut CommandContext,
        completed: &CompletedTask,
    ) -> Result<Transition>;
}

/// The collaborators a workflow needs, bundled for context construction
#[derive(Clone)]
pub struct Dependencies {
    /// Infrastructure provider
    pub provider: Arc<dyn Provider>,
    /// Cluster manager
    pub cluster_manager: Arc<dyn ClusterManager>,
    /// Bootstrap cluster lifecycle
    pub bootstrapper: Arc<dyn Bootstrapper>,
    /// GitOps toolkit manager
    pub gitops_manager: Arc<dyn GitOpsManager>,
    /// Kubernetes client construction
    pub client_factory: Arc<dyn ClientFactory>,
    /// Optional add-on installation
    pub package_installer: Arc<dyn PackageInstaller>,
    /// Artifact destination
    pub writer: Arc<dyn FileWriter>,
}

/// Mutable state shared by every task of one runner invocation.
///
/// The context is exclusively owned by the runner for the lifetime of the
/// operation; the currently-executing task borrows it mutably. The error
/// slot is set-once: the first recorded error is the one the runner
/// surfaces, later attempts are no-ops.
pub struct CommandContext {
    /// Infrastructure provider
    pub provider: Arc<dyn Provider>,
    /// Cluster manager
    pub cluster_manager: Arc<dyn ClusterManager>,
    /// Bootstrap cluster lifecycle
    pub bootstrapper: Arc<dyn Bootstrapper>,
    /// GitOps toolkit manager
    pub gitops_manager: Arc<dyn GitOpsManager>,
    /// Kubernetes client construction
    pub client_factory: Arc<dyn ClientFactory>,
    /// Optional add-on installation
    pub package_installer: Arc<dyn PackageInstaller>,
    /// Pre-flight checks for this operation
    pub validator: Arc<dyn Validator>,
    /// Artifact destination
    pub writer: Arc<dyn FileWriter>,

    /// Desired cluster specification
    pub cluster_spec: ClusterSpec,
    /// Currently-observed specification, fetched during upgrades
    pub current_cluster_spec: Option<ClusterSpec>,
    /// Component version transitions accumulated across upgrade steps
    pub change_diff: ChangeDiff,
    /// Handle to the ephemeral bootstrap cluster, once one exists
    pub bootstrap_cluster: Option<Cluster>,
    /// Handle to the cluster currently holding management responsibility
    pub management_cluster: Option<Cluster>,
    /// Handle to the workload cluster being operated on
    pub workload_cluster: Option<Cluster>,
    /// Per-task timing for this invocation
    pub profiler: Profiler,
    /// Directory name for pre-move management-state backups
    pub backup_cluster_state_dir: String,
    /// Delete leftover bootstrap infrastructure before starting
    pub force_cleanup: bool,

    first_error: Option<Error>,
}

impl CommandContext {
    /// Build a context from the collaborator bundle and desired spec
    pub fn new(deps: Dependencies, validator: Arc<dyn Validator>, spec: ClusterSpec) -> Self {
        Self {
            provider: deps.provider,
            cluster_manager: deps.cluster_manager,
            bootstrapper: deps.bootstrapper,
            gitops_manager: deps.gitops_manager,
            client_factory: deps.client_factory,
            package_installer: deps.package_installer,
            validator,
            writer: deps.writer,
            cluster_spec: spec,
            current_cluster_spec: None,
            change_diff: ChangeDiff::new(),
            bootstrap_cluster: None,
            management_cluster: None,
            workload_cluster: None,
            profiler: Profiler::new(),
            backup_cluster_state_dir: String::new(),
            force_cleanup: false,
            first_error: None,
        }
    }

    /// Record an error. Only the first recorded error is retained; it is
    /// the root cause the runner reports regardless of how many cleanup
    /// steps also fail afterwards.
    pub fn set_error(&mut self, err: Error) {
        if self.first_error.is_none() {
            self.first_error = Some(err);
        } else {
            debug!(error = %err, "suppressing error recorded after the first");
        }
    }

    /// The first recorded error, if any
    pub fn first_error(&self) -> Option<&Error> {
        self.first_error.as_ref()
    }

    /// Take ownership of the first recorded error, leaving the slot empty
    pub fn take_first_error(&mut self) -> Option<Error> {
        self.first_error.take()
    }

    /// The cluster currently holding management responsibility for the
    /// target, falling back to the bootstrap cluster
    pub fn managing_cluster(&self) -> Option<&Cluster> {
        self.management_cluster
            .as_ref()
            .or(self.bootstrap_cluster.as_ref())
    }
}

/// Drives a task chain to completion.
///
/// The runner never decides to abort; which task runs next is encoded
/// entirely in the tasks themselves. With checkpointing enabled, the
/// runner persists the set of completed tasks after each one and skips
/// already-completed tasks on resume by calling their `restore` instead
/// of `run`.
pub struct TaskRunner {
    task: Box<dyn Task>,
    writer: Arc<dyn FileWriter>,
    with_checkpoint: bool,
}

impl TaskRunner {
    /// Create a runner starting at the chain's entry task
    pub fn new(task: Box<dyn Task>, writer: Arc<dyn FileWriter>) -> Self {
        Self {
            task,
            writer,
            with_checkpoint: false,
        }
    }

    /// Enable checkpoint persistence and resume for this invocation
    pub fn with_checkpoint(mut self) -> Self {
        debug!("Checkpoint feature enabled");
        self.with_checkpoint = true;
        self
    }

    /// Run the chain to completion and surface the first recorded error.
    ///
    /// The profiler on the context is reset; each executed task gets one
    /// timing entry, in execution order. Restored tasks are not timed.
    pub async fn run(self, ctx: &mut CommandContext) -> Result<()> {
        let cluster_name = ctx.cluster_spec.cluster_name().to_string();
        let checkpoint_file = format!("{cluster_name}{CHECKPOINT_FILE_SUFFIX}");

        ctx.profiler = Profiler::new();
        ctx.backup_cluster_state_dir = format!(
            "{cluster_name}-backup-{}",
            Utc::now().format("%Y-%m-%dT%H_%M_%S")
        );

        let start = Instant::now();
        let mut info = self.load_checkpoint_info(&checkpoint_file);
        let TaskRunner {
            task,
            writer,
            with_checkpoint,
        } = self;

        let mut current = Some(task);
        while let Some(mut task) = current {
            let name = task.name();

            let transition = if let Some(completed) = info.completed(name) {
                debug!(task_name = %name, "Restoring task");
                let completed = completed.clone();
                task.restore(ctx, &completed).await.map_err(|e| {
                    Error::checkpoint_for_task(name, format!("restoring checkpoint info: {e}"))
                })?
            } else {
                debug!(task_name = %name, "Task start");
                ctx.profiler.set_start_task(name);
                let transition = task.run(ctx).await;
                ctx.profiler.mark_done_task(name);
                ctx.profiler.log_summary(name);

                if ctx.first_error().is_none() {
                    info.task_completed(name, task.checkpoint());
                    if with_checkpoint {
                        checkpoint::save(writer.as_ref(), &checkpoint_file, &info)?;
                    }
                }
                transition
            };

            current = match transition {
                Transition::Next(next) => Some(next),
                Transition::Done | Transition::Failed => None,
            };
        }

        if with_checkpoint {
            checkpoint::save(writer.as_ref(), &checkpoint_file, &info)?;
        }
        debug!(duration = ?start.elapsed(), "Tasks completed");

        match ctx.take_first_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Load previously-completed tasks when resuming.
    ///
    /// A missing file means a fresh run. An unreadable or unparseable
    /// file is what a crash mid-write leaves behind; it is discarded and
    /// the chain re-runs from the start.
    fn load_checkpoint_info(&self, checkpoint_file: &str) -> CheckpointInfo {
        if !self.with_checkpoint {
            return CheckpointInfo::new();
        }
        let path: PathBuf = self.writer.dir().join(checkpoint_file);
        if !path.exists() {
            return CheckpointInfo::new();
        }
        match checkpoint::load(&path) {
            Ok(info) => {
                debug!(file = %path.display(), tasks = info.len(), "Resuming from checkpoint");
                info
            }
            Err(e) => {
                warn!(
                    file = %path.display(),
                    error = %e,
                    "discarding unreadable checkpoint file, re-running all tasks"
                );
                CheckpointInfo::new()
            }
        }
    }
}
