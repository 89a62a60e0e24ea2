//! Pre-flight validation results and aggregation.
//!
//! Validators and collaborators report named check results; workflows run
//! every check before the first mutating step and aggregate all failures
//! into a single report so the operator fixes everything in one pass.

use tracing::info;

use crate::{Error, Result};

/// Outcome of one named pre-flight check
#[derive(Debug)]
pub struct ValidationResult {
    /// Human-readable name of the check
    pub name: String,
    /// The check's outcome
    pub result: Result<()>,
}

impl ValidationResult {
    /// A check that passed
    pub fn passed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result: Ok(()),
        }
    }

    /// A check that failed with the given error
    pub fn failed(name: impl Into<String>, err: Error) -> Self {
        Self {
            name: name.into(),
            result: Err(err),
        }
    }

    /// Build a result from a fallible check outcome
    pub fn from_result(name: impl Into<String>, result: Result<()>) -> Self {
        Self {
            name: name.into(),
            result,
        }
    }
}

/// Run-once aggregation over a set of evaluated checks.
///
/// Passing checks are logged; every failure is collected into one
/// [`Error::Preflight`] listing each failed check by name.
pub fn aggregate(results: Vec<ValidationResult>) -> Result<()> {
    let mut failures = Vec::new();
    for r in results {
        match r.result {
            Ok(()) => info!(check = %r.name, "Validation passed"),
            Err(e) => failures.push(format!("{}: {}", r.name, e)),
        }
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::preflight(failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_passes_when_all_checks_pass() {
        let results = vec![
            ValidationResult::passed("provider setup is valid"),
            ValidationResult::passed("gitops repository reachable"),
        ];
        assert!(aggregate(results).is_ok());
    }

    #[test]
    fn test_aggregate_reports_every_failure() {
        let results = vec![
            ValidationResult::passed("provider setup is valid"),
            ValidationResult::failed(
                "control plane ip",
                Error::validation("10.0.0.1 already in use"),
            ),
            ValidationResult::failed(
                "kubernetes version",
                Error::validation("1.19 is no longer supported"),
            ),
        ];
        let err = aggregate(results).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("control plane ip"));
        assert!(msg.contains("kubernetes version"));
        assert!(msg.contains("no longer supported"));
    }

    #[test]
    fn test_aggregate_empty_is_ok() {
        assert!(aggregate(Vec::new()).is_ok());
    }
}
