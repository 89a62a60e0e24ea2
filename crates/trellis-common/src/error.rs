//! Error types for Trellis cluster lifecycle operations
//!
//! Errors are structured with fields to aid debugging in production.
//! Each error variant includes contextual information like cluster names,
//! provider types, and underlying causes.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for Trellis operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Validation error for a cluster spec
    #[error("validation error for {cluster}: {message}")]
    Validation {
        /// Name of the cluster with invalid configuration
        cluster: String,
        /// Description of what's invalid
        message: String,
    },

    /// Aggregated pre-flight validation failures, reported before any
    /// mutating step runs
    #[error("preflight validations failed: [{}]", failures.join("; "))]
    Preflight {
        /// One entry per failed check, "name: cause"
        failures: Vec<String>,
    },

    /// Infrastructure provider error
    #[error("provider error [{provider}] for {cluster}: {message}")]
    Provider {
        /// Name of the cluster being provisioned
        cluster: String,
        /// Provider type (docker, vsphere, baremetal, ...)
        provider: String,
        /// Description of what failed
        message: String,
    },

    /// Bootstrap cluster error
    #[error("bootstrap error for {cluster}: {message}")]
    Bootstrap {
        /// Name of the cluster the bootstrap cluster serves
        cluster: String,
        /// Description of what failed
        message: String,
    },

    /// Cluster-management move error
    #[error("cluster management move error for {cluster}: {message}")]
    Move {
        /// Name of the cluster whose management is being moved
        cluster: String,
        /// Description of what failed
        message: String,
        /// Phase of the move that failed (backup, pause, move, resume)
        phase: Option<String>,
    },

    /// Cluster lifecycle operation error (create, upgrade, delete)
    #[error("cluster operation error [{operation}] for {cluster}: {message}")]
    ClusterOp {
        /// Name of the target cluster
        cluster: String,
        /// Operation being performed
        operation: String,
        /// Description of what failed
        message: String,
    },

    /// GitOps toolkit error
    #[error("gitops error for {cluster}: {message}")]
    GitOps {
        /// Name of the cluster the git-ops toolkit serves
        cluster: String,
        /// Description of what failed
        message: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The kind of content being serialized (if known)
        kind: Option<String>,
    },

    /// Checkpoint store error: unreadable payloads are fatal and must be
    /// resolved by the operator, typically by deleting the stale file
    #[error("checkpoint error: {message}")]
    Checkpoint {
        /// Description of what failed
        message: String,
        /// Name of the task whose checkpoint could not be handled
        task: Option<String>,
    },

    /// Filesystem error with the offending path
    #[error("file error for {path}: {source}")]
    File {
        /// Path that could not be read or written
        path: String,
        /// The underlying io error
        source: std::io::Error,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred (e.g., "runner", "workflow")
        context: String,
    },
}

impl Error {
    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            cluster: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
        }
    }

    /// Create a validation error with cluster context
    pub fn validation_for(cluster: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            cluster: cluster.into(),
            message: msg.into(),
        }
    }

    /// Create an aggregated preflight error from failed check reports
    pub fn preflight(failures: Vec<String>) -> Self {
        Self::Preflight { failures }
    }

    /// Create a provider error with full context
    pub fn provider_for(
        cluster: impl Into<String>,
        provider: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Provider {
            cluster: cluster.into(),
            provider: provider.into(),
            message: msg.into(),
        }
    }

    /// Create a bootstrap error with cluster context
    pub fn bootstrap_for(cluster: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Bootstrap {
            cluster: cluster.into(),
            message: msg.into(),
        }
    }

    /// Create a cluster-management move error
    pub fn move_for(cluster: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Move {
            cluster: cluster.into(),
            message: msg.into(),
            phase: None,
        }
    }

    /// Create a cluster-management move error with phase information
    pub fn move_in_phase(
        cluster: impl Into<String>,
        phase: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Move {
            cluster: cluster.into(),
            message: msg.into(),
            phase: Some(phase.into()),
        }
    }

    /// Create a cluster operation error
    pub fn cluster_op(
        cluster: impl Into<String>,
        operation: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::ClusterOp {
            cluster: cluster.into(),
            operation: operation.into(),
            message: msg.into(),
        }
    }

    /// Create a gitops error with cluster context
    pub fn gitops_for(cluster: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::GitOps {
            cluster: cluster.into(),
            message: msg.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with content kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create a checkpoint error with the given message
    pub fn checkpoint(msg: impl Into<String>) -> Self {
        Self::Checkpoint {
            message: msg.into(),
            task: None,
        }
    }

    /// Create a checkpoint error for a specific task
    pub fn checkpoint_for_task(task: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Checkpoint {
            message: msg.into(),
            task: Some(task.into()),
        }
    }

    /// Create a file error with the offending path
    pub fn file(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Create an internal error without specific context
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: UNKNOWN_CONTEXT.to_string(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Validation, preflight, serialization, and checkpoint errors require
    /// operator intervention. Infrastructure and move errors are generally
    /// transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => {
                // Retry on transient K8s errors, not on 4xx responses
                !matches!(
                    source,
                    kube::Error::Api(ae) if (400..500).contains(&ae.code)
                )
            }
            Error::Validation { .. } => false,
            Error::Preflight { .. } => false,
            Error::Provider { .. } => true,
            Error::Bootstrap { .. } => true,
            Error::Move { .. } => true,
            Error::ClusterOp { .. } => true,
            Error::GitOps { .. } => true,
            Error::Serialization { .. } => false,
            Error::Checkpoint { .. } => false,
            Error::File { .. } => true,
            Error::Internal { .. } => true,
        }
    }

    /// Get the cluster name if this error is associated with a specific cluster
    pub fn cluster(&self) -> Option<&str> {
        match self {
            Error::Validation { cluster, .. }
            | Error::Provider { cluster, .. }
            | Error::Bootstrap { cluster, .. }
            | Error::Move { cluster, .. }
            | Error::ClusterOp { cluster, .. }
            | Error::GitOps { cluster, .. } => Some(cluster),
            _ => None,
        }
    }
}
