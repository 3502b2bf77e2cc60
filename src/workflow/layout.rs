//! On-disk layout of one run under the results directory.

use std::path::{Path, PathBuf};

use crate::flag::FLAG_DIR_NAME;
use crate::snapshot::SNAPSHOT_FILE_NAME;

/// Default results directory, relative to the workflow root.
pub const DEFAULT_RESULTS_DIR: &str = "results";

/// Paths of one run: `results/<run_name>/...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    run_name: String,
    run_dir: PathBuf,
}

impl RunLayout {
    pub fn new(results_dir: &Path, run_name: &str) -> Self {
        Self {
            run_name: run_name.to_string(),
            run_dir: results_dir.join(run_name),
        }
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// `results/<run_name>/full_config.yaml`
    pub fn snapshot_path(&self) -> PathBuf {
        self.run_dir.join(SNAPSHOT_FILE_NAME)
    }

    /// `results/<run_name>/flags`
    pub fn flag_dir(&self) -> PathBuf {
        self.run_dir.join(FLAG_DIR_NAME)
    }

    /// A path inside the run directory.
    pub fn artifact(&self, relative: &str) -> PathBuf {
        self.run_dir.join(relative)
    }
}
