//! Per-task duration profiling.
//!
//! The runner records a span for every task it executes; tasks may record
//! additional labelled sub-spans for expensive internal phases. Entries
//! keep insertion order, which matches execution order.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

/// One finished span: a task, an optional sub-task label, and how long it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEntry {
    /// Name of the task that owns this span
    pub task: String,
    /// Span label; equals `task` for the task's own span
    pub label: String,
    /// Measured wall-clock duration
    pub duration: Duration,
}

/// Collects task and sub-task durations for one runner invocation
#[derive(Debug, Default)]
pub struct Profiler {
    starts: HashMap<(String, String), Instant>,
    entries: Vec<ProfileEntry>,
}

impl Profiler {
    /// Create an empty profiler
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the span for a task
    pub fn set_start_task(&mut self, task: &str) {
        self.set_start(task, task);
    }

    /// Start a labelled sub-span within a task
    pub fn set_start(&mut self, task: &str, label: &str) {
        self.starts
            .insert((task.to_string(), label.to_string()), Instant::now());
    }

    /// Finish the span for a task; must follow `set_start_task`
    pub fn mark_done_task(&mut self, task: &str) {
        self.mark_done(task, task);
    }

    /// Finish a labelled sub-span; a label that was never started is ignored
    pub fn mark_done(&mut self, task: &str, label: &str) {
        let key = (task.to_string(), label.to_string());
        if let Some(start) = self.starts.remove(&key) {
            self.entries.push(ProfileEntry {
                task: key.0,
                label: key.1,
                duration: start.elapsed(),
            });
        }
    }

    /// All finished spans, in the order they completed
    pub fn metrics(&self) -> &[ProfileEntry] {
        &self.entries
    }

    /// Duration of a task's own span, if it finished
    pub fn task_duration(&self, task: &str) -> Option<Duration> {
        self.entries
            .iter()
            .find(|e| e.task == task && e.label == task)
            .map(|e| e.duration)
    }

    /// Log a summary of the task's span and sub-spans
    pub(crate) fn log_summary(&self, task: &str) {
        for entry in self.entries.iter().filter(|e| e.task == task) {
            if entry.label == task {
                debug!(task_name = %task, duration = ?entry.duration, "Task finished");
            } else {
                debug!(
                    task_name = %task,
                    subtask_name = %entry.label,
                    duration = ?entry.duration,
                    "Subtask finished"
                );
            }
        }
    }
}
