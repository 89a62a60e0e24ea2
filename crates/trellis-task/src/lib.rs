//! Task chain execution engine for cluster lifecycle operations.
//!
//! An operation (create, upgrade, delete) is a chain of discrete named
//! tasks. Each task performs one logical action against the shared
//! [`CommandContext`] and hands back the next task to run. The
//! [`TaskRunner`] drives the chain, times every task, and persists a
//! checkpoint after each completed task so an interrupted multi-hour
//! operation resumes without re-running finished work.
//!
//! Failure handling is encoded in the graph, not the runner: a failing
//! task records the first error on the context and returns a diagnostics
//! or cleanup successor. The runner surfaces that first error only after
//! the chain has fully unwound.

pub mod checkpoint;
pub mod interfaces;
pub mod profiler;
mod task;

pub use checkpoint::{CheckpointInfo, CompletedTask, TaskCheckpoint};
pub use profiler::Profiler;
pub use task::{CommandContext, Dependencies, Task, TaskRunner, Transition};
