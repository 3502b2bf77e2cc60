//! Config flagging: per-subsection change detection for the workflow graph.
//!
//! The workflow runner decides staleness from file modification times, and
//! configuration values are not files. [`ConfigFlagger`] bridges the two: it
//! compares a subsection of the effective configuration with the same
//! subsection of the previous run's snapshot and materialises the answer as a
//! marker file (see [`marker`]).
//!
//! The previous snapshot is read once, when the flagger is constructed. The
//! run session persists the new snapshot afterwards, so every flag of a run
//! is computed against the same baseline no matter when it is queried.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{ConfigValue, SubsectionPath};
use crate::digest::compute_config_digest;
use crate::error::FlagError;
use crate::snapshot::load_snapshot;
use crate::types::digest_hex;

pub mod diff;
pub mod marker;

pub use diff::{diff_values, Change};
pub use marker::{marker_path, FlagMarker, FLAG_DIR_NAME, FLAG_EXTENSION};

/// Decides, per subsection, whether the configuration changed since the last run.
pub struct ConfigFlagger {
    current: ConfigValue,
    baseline: Option<ConfigValue>,
    flag_dir: PathBuf,
    /// Markers already resolved by this flagger, keyed by subsection
    resolved: Mutex<HashMap<SubsectionPath, FlagMarker>>,
}

impl ConfigFlagger {
    /// Create a flagger for `current`, whose snapshot will be written to `snapshot_path`.
    ///
    /// Whatever snapshot is at `snapshot_path` right now becomes the baseline.
    /// A missing or unreadable snapshot means "no baseline": every subsection
    /// is reported as changed. Markers go to `flags/` beside the snapshot.
    pub fn new(current: ConfigValue, snapshot_path: &Path) -> Self {
        let baseline = match load_snapshot(snapshot_path) {
            Ok(Some(snapshot)) => {
                debug!(path = %snapshot_path.display(), "Loaded baseline snapshot");
                Some(snapshot.config)
            }
            Ok(None) => {
                info!(
                    path = %snapshot_path.display(),
                    "No previous snapshot; all flagged subsections count as changed"
                );
                None
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Ignoring unusable snapshot; all flagged subsections count as changed"
                );
                None
            }
        };

        let flag_dir = snapshot_path
            .parent()
            .map(|dir| dir.join(FLAG_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(FLAG_DIR_NAME));

        Self::with_baseline(current, baseline, flag_dir)
    }

    /// Create a flagger from an in-memory baseline.
    pub fn with_baseline(
        current: ConfigValue,
        baseline: Option<ConfigValue>,
        flag_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            current,
            baseline,
            flag_dir: flag_dir.into(),
            resolved: Mutex::new(HashMap::new()),
        }
    }

    pub fn baseline(&self) -> Option<&ConfigValue> {
        self.baseline.as_ref()
    }

    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn flag_dir(&self) -> &Path {
        &self.flag_dir
    }

    /// Whether the subsection at `path` differs from the baseline.
    ///
    /// Pure: touches no files. A subsection missing from the baseline counts
    /// as changed, as does everything when there is no baseline.
    pub fn is_changed(&self, path: &SubsectionPath) -> Result<bool, FlagError> {
        let current = self.lookup_current(path)?;
        let previous = self
            .baseline
            .as_ref()
            .and_then(|baseline| baseline.get_path(path));
        Ok(previous != Some(current))
    }

    /// Leaf-level changes under `path`. The root path is allowed here.
    ///
    /// Without a baseline the whole subtree is reported as one addition.
    pub fn changes(&self, path: &SubsectionPath) -> Vec<Change> {
        let previous = self
            .baseline
            .as_ref()
            .and_then(|baseline| baseline.get_path(path));
        diff_values(path, previous, self.current.get_path(path))
    }

    /// Resolve the marker for `path`, writing the marker file as needed.
    ///
    /// Repeated calls for the same path return the same marker and touch the
    /// file at most once.
    pub fn flag(&self, path: &SubsectionPath) -> Result<FlagMarker, FlagError> {
        let mut resolved = self.resolved.lock();
        if let Some(marker) = resolved.get(path) {
            return Ok(marker.clone());
        }

        let current = self.lookup_current(path)?;
        let changed = self.is_changed(path)?;
        let digest = compute_config_digest(current);
        let file = marker_path(&self.flag_dir, path);

        let write_result = if changed {
            marker::touch_changed(&file, &digest)
        } else {
            marker::ensure_unchanged(&file, &digest).map(|_| ())
        };
        write_result.map_err(|source| FlagError::Marker {
            path: file.clone(),
            source,
        })?;

        if changed {
            for change in self.changes(path) {
                debug!(subsection = %path, change = %change, "Config change");
            }
            info!(subsection = %path, marker = %file.display(), "Subsection changed");
        } else {
            debug!(subsection = %path, "Subsection unchanged");
        }

        let marker = FlagMarker {
            subsection: path.clone(),
            path: file,
            changed,
            digest: digest_hex(&digest),
        };
        resolved.insert(path.clone(), marker.clone());
        Ok(marker)
    }

    /// [`ConfigFlagger::flag`] for a dotted path such as `plotting.model_losses`.
    pub fn flag_dotted(&self, dotted: &str) -> Result<FlagMarker, FlagError> {
        self.flag(&SubsectionPath::parse(dotted))
    }

    fn lookup_current(&self, path: &SubsectionPath) -> Result<&ConfigValue, FlagError> {
        if path.is_root() {
            return Err(FlagError::EmptyPath);
        }
        self.current
            .get_path(path)
            .ok_or_else(|| FlagError::UnknownSubsection(path.to_string()))
    }
}
