//! Configuration System
//!
//! Loads the default pipeline configuration, layers a user override file and
//! `key.path=value` command-line overrides on top of it, and exposes the
//! result as one [`EffectiveConfig`]. The effective configuration is built
//! once per invocation and passed by reference; there is no global config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::ConfigError;

mod merge;
mod path;
mod sources;
mod value;

pub use merge::{merge, merge_layers};
pub use path::SubsectionPath;
pub use sources::{load_defaults, load_override, parse_override, parse_yaml, read_yaml_file};
pub use value::{ConfigMap, ConfigValue};

/// Default location of the pipeline defaults, relative to the workflow root.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.yaml";

/// Top-level key naming the run; results land in `results/<run_name>/`.
pub const RUN_NAME_KEY: &str = "run_name";

/// Run name used when the configuration does not set one.
pub const DEFAULT_RUN_NAME: &str = "default";

/// Where a configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Default configuration file
    pub default_config: PathBuf,

    /// User override file, if one was given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_config: Option<PathBuf>,

    /// `key.path=value` overrides, in the order applied
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cli_overrides: Vec<String>,
}

/// Inputs to [`ConfigLoader::load`].
#[derive(Debug, Clone)]
pub struct ConfigSources {
    pub defaults: PathBuf,
    pub override_file: Option<PathBuf>,
    pub cli_overrides: Vec<String>,
    /// Run name applied after every other layer, taken literally
    pub run_name: Option<String>,
}

impl ConfigSources {
    pub fn new(defaults: impl Into<PathBuf>) -> Self {
        Self {
            defaults: defaults.into(),
            override_file: None,
            cli_overrides: Vec::new(),
            run_name: None,
        }
    }

    pub fn with_override_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_file = Some(path.into());
        self
    }

    pub fn with_cli_override(mut self, spec: impl Into<String>) -> Self {
        self.cli_overrides.push(spec.into());
        self
    }

    pub fn with_run_name(mut self, name: impl Into<String>) -> Self {
        self.run_name = Some(name.into());
        self
    }
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}

/// The fully merged configuration of one run, with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    value: ConfigValue,
    provenance: Provenance,
}

impl EffectiveConfig {
    pub fn new(value: ConfigValue, provenance: Provenance) -> Self {
        Self { value, provenance }
    }

    pub fn value(&self) -> &ConfigValue {
        &self.value
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Get a config value by dotted path.
    pub fn get(&self, dotted: &str) -> Option<&ConfigValue> {
        self.value.get(dotted)
    }

    /// Run name, validated to be a single path component.
    pub fn run_name(&self) -> Result<String, ConfigError> {
        let name = match self.value.get(RUN_NAME_KEY) {
            None | Some(ConfigValue::Null) => return Ok(DEFAULT_RUN_NAME.to_string()),
            Some(ConfigValue::String(s)) => s.clone(),
            Some(ConfigValue::Integer(i)) => i.to_string(),
            Some(other) => return Err(ConfigError::InvalidRunName(other.to_string())),
        };

        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if !valid {
            return Err(ConfigError::InvalidRunName(name));
        }
        Ok(name)
    }
}

/// Builds the effective configuration from its sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults, then the override file, then command-line overrides.
    pub fn load(sources: &ConfigSources) -> Result<EffectiveConfig, ConfigError> {
        let defaults = load_defaults(&sources.defaults)?;
        debug!(path = %sources.defaults.display(), "Loaded default configuration");

        let user = match &sources.override_file {
            Some(path) => {
                let value = load_override(path)?;
                debug!(path = %path.display(), "Loaded override configuration");
                value
            }
            None => ConfigValue::empty_map(),
        };

        let mut cli = sources
            .cli_overrides
            .iter()
            .map(|spec| parse_override(spec))
            .collect::<Result<Vec<_>, _>>()?;
        let mut cli_overrides = sources.cli_overrides.clone();

        // Not YAML-decoded: `null`, `true` or `1e3` are run names like any other
        if let Some(name) = &sources.run_name {
            cli.push(ConfigValue::nested(
                &SubsectionPath::parse(RUN_NAME_KEY),
                ConfigValue::String(name.clone()),
            ));
            cli_overrides.push(format!("{}={}", RUN_NAME_KEY, name));
        }

        let merged = merge_layers(
            std::iter::once(&defaults)
                .chain(std::iter::once(&user))
                .chain(cli.iter()),
        );

        let provenance = Provenance {
            default_config: display_path(&sources.defaults),
            override_config: sources.override_file.as_deref().map(display_path),
            cli_overrides,
        };

        info!(
            defaults = %provenance.default_config.display(),
            override_file = ?provenance.override_config,
            cli_overrides = provenance.cli_overrides.len(),
            "Effective configuration built"
        );

        Ok(EffectiveConfig::new(merged, provenance))
    }

    /// Load from defaults alone.
    pub fn load_defaults_only(defaults: &Path) -> Result<EffectiveConfig, ConfigError> {
        Self::load(&ConfigSources::new(defaults))
    }
}

/// Canonical form of a provenance path, falling back to the path as given.
fn display_path(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
