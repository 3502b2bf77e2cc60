//! Run session: the ordered lifecycle of one workflow invocation.
//!
//! 1. [`RunSession::open`] builds the effective configuration and constructs
//!    the [`ConfigFlagger`], which reads the previous snapshot into memory.
//! 2. Flags are computed ([`RunSession::flag`], [`RunSession::flag_stages`]).
//! 3. [`RunSession::persist`] overwrites the snapshot, exactly once.
//!
//! Because the baseline lives in memory from step 1 on, flags computed after
//! step 3 still compare against the previous run.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{ConfigLoader, ConfigSources, EffectiveConfig, SubsectionPath};
use crate::error::{SnapshotError, WorkflowError};
use crate::flag::{Change, ConfigFlagger, FlagMarker};
use crate::snapshot::save_config;

use super::layout::{RunLayout, DEFAULT_RESULTS_DIR};
use super::stages::{pipeline_stages, Stage};

/// Everything needed to open a run session.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub sources: ConfigSources,
    pub results_dir: PathBuf,
}

impl SessionRequest {
    pub fn new(sources: ConfigSources) -> Self {
        Self {
            sources,
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
        }
    }

    pub fn with_results_dir(mut self, results_dir: impl Into<PathBuf>) -> Self {
        self.results_dir = results_dir.into();
        self
    }
}

/// A stage together with its resolved flag markers.
#[derive(Debug, Clone, Serialize)]
pub struct StageFlags {
    pub stage: Stage,
    pub markers: Vec<FlagMarker>,
}

impl StageFlags {
    /// True when at least one declared subsection changed.
    pub fn config_dirty(&self) -> bool {
        self.markers.iter().any(|m| m.changed)
    }

    /// Rule inputs: flag markers first, then data inputs.
    pub fn rule_inputs(&self) -> Vec<PathBuf> {
        self.markers
            .iter()
            .map(|m| m.path.clone())
            .chain(self.stage.inputs.iter().cloned())
            .collect()
    }
}

/// Config-dirtiness of one stage, computed without touching any file.
#[derive(Debug, Clone, Serialize)]
pub struct StageStatus {
    pub stage: String,
    pub changed_flags: Vec<SubsectionPath>,
    pub unchanged_flags: Vec<SubsectionPath>,
}

impl StageStatus {
    pub fn config_dirty(&self) -> bool {
        !self.changed_flags.is_empty()
    }
}

/// One workflow invocation.
pub struct RunSession {
    config: EffectiveConfig,
    layout: RunLayout,
    flagger: ConfigFlagger,
    persisted: bool,
}

impl RunSession {
    /// Load configuration, resolve the run layout and read the baseline snapshot.
    pub fn open(request: &SessionRequest) -> Result<Self, WorkflowError> {
        let config = ConfigLoader::load(&request.sources)?;
        let run_name = config.run_name()?;
        let layout = RunLayout::new(&request.results_dir, &run_name);

        // The baseline must be in memory before anything can overwrite it
        let flagger = ConfigFlagger::new(config.value().clone(), &layout.snapshot_path());

        info!(
            run = %run_name,
            run_dir = %layout.run_dir().display(),
            baseline = flagger.has_baseline(),
            "Run session opened"
        );

        Ok(Self {
            config,
            layout,
            flagger,
            persisted: false,
        })
    }

    pub fn config(&self) -> &EffectiveConfig {
        &self.config
    }

    pub fn layout(&self) -> &RunLayout {
        &self.layout
    }

    pub fn flagger(&self) -> &ConfigFlagger {
        &self.flagger
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Resolved pipeline stages for this run.
    pub fn stages(&self) -> Vec<Stage> {
        pipeline_stages(&self.config, &self.layout)
    }

    /// Marker for one subsection.
    pub fn flag(&self, path: &SubsectionPath) -> Result<FlagMarker, WorkflowError> {
        Ok(self.flagger.flag(path)?)
    }

    /// Markers for every flag of every stage.
    pub fn flag_stages(&self) -> Result<Vec<StageFlags>, WorkflowError> {
        self.stages()
            .into_iter()
            .map(|stage| {
                let markers = stage
                    .flags
                    .iter()
                    .map(|path| self.flagger.flag(path))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(StageFlags { stage, markers })
            })
            .collect()
    }

    /// Which stages a configuration change makes dirty. Writes nothing.
    pub fn stage_status(&self) -> Result<Vec<StageStatus>, WorkflowError> {
        self.stages()
            .into_iter()
            .map(|stage| {
                let mut changed_flags = Vec::new();
                let mut unchanged_flags = Vec::new();
                for path in &stage.flags {
                    if self.flagger.is_changed(path)? {
                        changed_flags.push(path.clone());
                    } else {
                        unchanged_flags.push(path.clone());
                    }
                }
                Ok(StageStatus {
                    stage: stage.name,
                    changed_flags,
                    unchanged_flags,
                })
            })
            .collect()
    }

    /// Leaf changes under `path` (the root when `None`).
    pub fn changes(&self, path: Option<&SubsectionPath>) -> Vec<Change> {
        match path {
            Some(path) => self.flagger.changes(path),
            None => self.flagger.changes(&SubsectionPath::root()),
        }
    }

    /// Write this run's snapshot. May only be called once per session.
    pub fn persist(&mut self) -> Result<PathBuf, WorkflowError> {
        let path = self.layout.snapshot_path();
        if self.persisted {
            return Err(SnapshotError::AlreadyPersisted(path).into());
        }
        save_config(self.config.value(), &path, self.config.provenance())?;
        self.persisted = true;
        Ok(path)
    }

    /// Open, flag every stage, then persist. The `prepare` command.
    pub fn prepare(request: &SessionRequest) -> Result<PreparedRun, WorkflowError> {
        let mut session = Self::open(request)?;
        let stages = session.flag_stages()?;
        let snapshot = session.persist()?;
        Ok(PreparedRun {
            run_name: session.layout.run_name().to_string(),
            snapshot,
            stages,
        })
    }
}

/// Result of [`RunSession::prepare`].
#[derive(Debug, Clone, Serialize)]
pub struct PreparedRun {
    pub run_name: String,
    pub snapshot: PathBuf,
    pub stages: Vec<StageFlags>,
}

impl PreparedRun {
    /// Names of stages with at least one changed flag.
    pub fn dirty_stages(&self) -> Vec<&str> {
        self.stages
            .iter()
            .filter(|s| s.config_dirty())
            .map(|s| s.stage.name.as_str())
            .collect()
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot
    }
}
