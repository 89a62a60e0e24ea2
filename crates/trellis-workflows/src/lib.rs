//! Workflow graphs for cluster lifecycle operations.
//!
//! Each operation (create, upgrade, delete, for both the management and
//! workload cluster roles) is a hand-assembled chain of tasks built on
//! the `trellis-task` engine. The assemblers in [`management`] and
//! [`workload`] populate the shared context and hand the runner the entry
//! task of a pre-wired chain.

#![deny(missing_docs)]

pub mod client;
pub mod cluster_config;
pub mod diagnostics;
pub mod management;
#[cfg(test)]
pub(crate) mod testutil;
pub mod workload;

use trellis_common::types::Cluster;
use trellis_common::{Error, Result};

/// Per-invocation behavior toggles, threaded explicitly into each
/// workflow assembler (there is no global feature cache).
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowConfig {
    /// Persist a checkpoint after each task and resume from it on rerun
    pub checkpoint_enabled: bool,
    /// Delete leftover bootstrap infrastructure from a previous
    /// interrupted run before starting
    pub force_cleanup: bool,
}

/// Fetch a cluster handle a task depends on.
///
/// A missing handle means the graph was wired wrong or a predecessor was
/// skipped; it is an internal error, not an infrastructure failure.
pub(crate) fn require_cluster(cluster: &Option<Cluster>, role: &str) -> Result<Cluster> {
    cluster
        .clone()
        .ok_or_else(|| Error::internal_with_context("workflow", format!("missing {role} cluster handle")))
}
