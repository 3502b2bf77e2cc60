//! Configuration sources: YAML files and `key.path=value` command-line overrides.

use std::fs;
use std::path::Path;

use crate::error::ConfigError;

use super::path::SubsectionPath;
use super::value::ConfigValue;

/// Read a YAML configuration file. An empty document decodes to `Null`.
pub fn read_yaml_file(path: &Path) -> Result<ConfigValue, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_yaml(&contents, path)
}

/// Parse YAML text, attributing errors to `origin`.
pub fn parse_yaml(contents: &str, origin: &Path) -> Result<ConfigValue, ConfigError> {
    let has_content = contents.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#') && line != "---"
    });
    if !has_content {
        return Ok(ConfigValue::Null);
    }
    let parse_error = |message: String| ConfigError::Parse {
        path: origin.to_path_buf(),
        message,
    };
    let mut document: serde_yaml::Value =
        serde_yaml::from_str(contents).map_err(|e| parse_error(e.to_string()))?;
    document
        .apply_merge()
        .map_err(|e| parse_error(e.to_string()))?;
    ConfigValue::from_yaml(document).map_err(parse_error)
}

/// Read the default configuration. It must exist and be a mapping.
pub fn load_defaults(path: &Path) -> Result<ConfigValue, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::DefaultsNotFound(path.to_path_buf()));
    }
    let value = read_yaml_file(path)?;
    if !value.is_map() {
        return Err(ConfigError::NotAMapping(path.to_path_buf()));
    }
    Ok(value)
}

/// Read a user override file. An empty file is an empty override.
pub fn load_override(path: &Path) -> Result<ConfigValue, ConfigError> {
    match read_yaml_file(path)? {
        ConfigValue::Null => Ok(ConfigValue::empty_map()),
        value @ ConfigValue::Map(_) => Ok(value),
        _ => Err(ConfigError::NotAMapping(path.to_path_buf())),
    }
}

/// Parse one `key.path=value` override into a nested tree.
///
/// The value is decoded as a YAML scalar/flow node, so `1` is an integer,
/// `[u, g]` a sequence and `pdf` a string.
pub fn parse_override(spec: &str) -> Result<ConfigValue, ConfigError> {
    let (key, raw) = spec
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidOverride(spec.to_string()))?;

    let path = SubsectionPath::parse(key);
    if path.is_root() {
        return Err(ConfigError::InvalidOverride(spec.to_string()));
    }

    let raw = raw.trim();
    let value = if raw.is_empty() {
        ConfigValue::String(String::new())
    } else {
        serde_yaml::from_str::<serde_yaml::Value>(raw)
            .ok()
            .and_then(|value| ConfigValue::from_yaml(value).ok())
            .unwrap_or_else(|| ConfigValue::String(raw.to_string()))
    };

    Ok(ConfigValue::nested(&path, value))
}
