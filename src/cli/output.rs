//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::WorkflowError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &WorkflowError) -> String {
    match e {
        WorkflowError::Snapshot(inner) => {
            format!("{} (no stage should run until the snapshot is saved)", inner)
        }
        other => other.to_string(),
    }
}
