//! Shared test utilities for integration tests
//!
//! Every test gets its own workflow root in a temp dir: a default
//! configuration covering every pipeline stage, and an empty results
//! directory.

use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

use lgsm_workflow::config::ConfigSources;
use lgsm_workflow::workflow::SessionRequest;

/// Small default configuration with every subsection a stage flags.
pub const DEFAULTS_YAML: &str = r#"
run_name: default
sims:
  sed_file: data/seds.pkl
  random_seed: 0
  min_redshift: 0.0
  max_redshift: 3.0
  bandpasses: [lsst_u, lsst_g, lsst_r]
lgsm:
  vae:
    latent_dim: 2
  training:
    epochs: 100
    losses:
      SpectralLoss:
        use: false
        params:
          eta: 0.1
plotting:
  rcParams:
    font.size: 10
  model_losses:
    format: png
  model_predictions:
    format: png
    nsamples: 10
  latent_variables:
    format: pdf
"#;

/// An mtime well after the epoch, used to age markers between runs.
pub fn aged() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_000_000)
}

/// Isolated workflow root.
pub struct Workspace {
    temp: TempDir,
    defaults: PathBuf,
    results: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_defaults(DEFAULTS_YAML)
    }

    pub fn with_defaults(contents: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let defaults = temp.path().join("config").join("default.yaml");
        fs::create_dir_all(defaults.parent().unwrap()).unwrap();
        fs::write(&defaults, contents).unwrap();
        let results = temp.path().join("results");
        Self {
            temp,
            defaults,
            results,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn defaults(&self) -> &Path {
        &self.defaults
    }

    pub fn results(&self) -> &Path {
        &self.results
    }

    /// Write a user override file next to the defaults.
    pub fn write_override(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn sources(&self) -> ConfigSources {
        ConfigSources::new(&self.defaults)
    }

    /// Session request with the given `key.path=value` overrides.
    pub fn request(&self, overrides: &[&str]) -> SessionRequest {
        let sources = overrides
            .iter()
            .fold(self.sources(), |sources, spec| sources.with_cli_override(*spec));
        SessionRequest::new(sources).with_results_dir(&self.results)
    }

    pub fn run_dir(&self, run_name: &str) -> PathBuf {
        self.results.join(run_name)
    }

    pub fn marker(&self, run_name: &str, subsection: &str) -> PathBuf {
        self.run_dir(run_name)
            .join("flags")
            .join(format!("{}.flag", subsection))
    }
}

pub fn mtime(path: &Path) -> SystemTime {
    fs::metadata(path).unwrap().modified().unwrap()
}

pub fn set_mtime(path: &Path, time: SystemTime) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_times(FileTimes::new().set_modified(time)).unwrap();
}

/// Age every marker in a run's flag directory.
pub fn age_markers(flag_dir: &Path) {
    for entry in fs::read_dir(flag_dir).unwrap() {
        set_mtime(&entry.unwrap().path(), aged());
    }
}
