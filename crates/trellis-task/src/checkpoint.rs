//! Checkpoint store: which tasks completed, and what they need to resume.
//!
//! One YAML file per cluster name holds a mapping from task name to the
//! task's serialized checkpoint payload. The file is rewritten in full
//! after every completed task; a partially-written file from a crash is
//! simply unparseable and treated as "no checkpoint" on the next run.
//! A parseable file whose payload does not decode into the type the task
//! declares is a fatal condition the operator must resolve, typically by
//! deleting the stale file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use trellis_common::filewriter::FileWriter;
use trellis_common::{Error, Result};

/// Opaque checkpoint payload, tagged in the store by the task's unique name
pub type TaskCheckpoint = serde_yaml::Value;

/// Record of one completed task: its checkpoint payload, if it has one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletedTask {
    /// Serialized snapshot the task needs to reproduce its effects on resume
    pub checkpoint: Option<TaskCheckpoint>,
}

impl CompletedTask {
    /// Decode this record's payload into the type the task declares.
    ///
    /// Fails when the payload is absent or structurally incompatible;
    /// both are fatal to resumption.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let payload = self
            .checkpoint
            .clone()
            .ok_or_else(|| Error::checkpoint("completed task has no checkpoint payload"))?;
        serde_yaml::from_value(payload)
            .map_err(|e| Error::checkpoint(format!("decoding checkpoint payload: {e}")))
    }
}

/// Serialize a task's resume state into a checkpoint payload.
///
/// Serialization of plain data types does not fail in practice; if it
/// ever does, the task is treated as having no payload and resume will
/// surface the missing payload instead of a corrupt one.
pub fn to_payload<T: Serialize>(state: &T) -> Option<TaskCheckpoint> {
    match serde_yaml::to_value(state) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(error = %e, "failed to serialize checkpoint payload");
            None
        }
    }
}

/// All completed tasks of one invocation, keyed by task name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointInfo {
    /// Task name to completion record; names are unique within a chain
    pub completed_tasks: BTreeMap<String, CompletedTask>,
}

impl CheckpointInfo {
    /// Create an empty checkpoint
    pub fn new() -> Self {
        Self::default()
    }

    /// Record of a completed task, if the task already ran
    pub fn completed(&self, task_name: &str) -> Option<&CompletedTask> {
        self.completed_tasks.get(task_name)
    }

    /// Record a task completion, replacing any previous record
    pub fn task_completed(&mut self, task_name: &str, payload: Option<TaskCheckpoint>) {
        self.completed_tasks
            .insert(task_name.to_string(), CompletedTask { checkpoint: payload });
    }

    /// Number of recorded completions
    pub fn len(&self) -> usize {
        self.completed_tasks.len()
    }

    /// True when nothing has completed yet
    pub fn is_empty(&self) -> bool {
        self.completed_tasks.is_empty()
    }
}

/// Persist the checkpoint, overwriting the previous file in full
pub fn save(writer: &dyn FileWriter, file_name: &str, info: &CheckpointInfo) -> Result<PathBuf> {
    debug!(file = %file_name, tasks = info.len(), "Saving checkpoint");
    let content = serde_yaml::to_string(info)
        .map_err(|e| Error::serialization_for_kind("CheckpointInfo", e.to_string()))?;
    writer.write(file_name, content.as_bytes())
}

/// Load a checkpoint file.
///
/// Returns an error for unreadable or unparseable content; the caller
/// decides whether that means "no checkpoint" (crash mid-write) or a
/// fatal condition.
pub fn load(path: &Path) -> Result<CheckpointInfo> {
    debug!(file = %path.display(), "Reading checkpoint");
    let content =
        fs::read_to_string(path).map_err(|e| Error::file(path.display().to_string(), e))?;
    serde_yaml::from_str(&content)
        .map_err(|e| Error::checkpoint(format!("parsing checkpoint file: {e}")))
}
