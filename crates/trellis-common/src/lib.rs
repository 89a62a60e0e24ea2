//! Common types for Trellis: errors, cluster handles, specs, and utilities
//!
//! Everything in this crate is shared between the task engine and the
//! workflow graphs. Concrete infrastructure lives behind the collaborator
//! traits defined in `trellis-task`.

#![deny(missing_docs)]

pub mod error;
pub mod filewriter;
pub mod spec;
pub mod telemetry;
pub mod types;
pub mod validations;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Suffix of the per-cluster checkpoint file written by the task runner
pub const CHECKPOINT_FILE_SUFFIX: &str = "-checkpoint.yaml";

/// Suffix of the cluster config file written at the end of a workflow
pub const CLUSTER_CONFIG_FILE_SUFFIX: &str = "-cluster-config.yaml";
