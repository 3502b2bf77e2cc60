//! Tagged configuration tree.
//!
//! Every configuration file, override and snapshot is decoded into a
//! [`ConfigValue`]. Maps are keyed by string and kept sorted, so equality
//! and serialization never depend on the order keys appeared in a file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::path::SubsectionPath;

/// A configuration map node.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// One node of a configuration tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<ConfigValue>),
    Map(ConfigMap),
}

impl ConfigValue {
    /// An empty map node.
    pub fn empty_map() -> Self {
        ConfigValue::Map(ConfigMap::new())
    }

    pub fn is_map(&self) -> bool {
        matches!(self, ConfigValue::Map(_))
    }

    pub fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// True for `Null` and for an empty map, the two spellings of "no override".
    pub fn is_empty_override(&self) -> bool {
        match self {
            ConfigValue::Null => true,
            ConfigValue::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Name of the node kind, used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::String(_) => "string",
            ConfigValue::Sequence(_) => "sequence",
            ConfigValue::Map(_) => "map",
        }
    }

    /// Look up the subtree at `path`. The empty path addresses the root.
    pub fn get_path(&self, path: &SubsectionPath) -> Option<&ConfigValue> {
        let mut current = self;
        for segment in path.segments() {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }

    /// Dotted-path convenience wrapper around [`ConfigValue::get_path`].
    pub fn get(&self, dotted: &str) -> Option<&ConfigValue> {
        self.get_path(&SubsectionPath::parse(dotted))
    }

    /// Convert a decoded YAML document, with merge keys already applied.
    ///
    /// Scalar mapping keys (`0: a`, `true: b`) become their string form.
    /// Sequence or mapping keys, and two keys that stringify alike, are
    /// rejected with a message naming where they occur.
    pub fn from_yaml(value: serde_yaml::Value) -> Result<ConfigValue, String> {
        from_yaml_at(&SubsectionPath::root(), value)
    }

    /// Build a tree holding `value` at `path`, with maps for every parent segment.
    pub fn nested(path: &SubsectionPath, value: ConfigValue) -> ConfigValue {
        path.segments().iter().rev().fold(value, |inner, segment| {
            let mut map = ConfigMap::new();
            map.insert(segment.clone(), inner);
            ConfigValue::Map(map)
        })
    }
}

fn from_yaml_at(path: &SubsectionPath, value: serde_yaml::Value) -> Result<ConfigValue, String> {
    use serde_yaml::Value;

    Ok(match value {
        Value::Null => ConfigValue::Null,
        Value::Bool(b) => ConfigValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => ConfigValue::Integer(i),
            None => ConfigValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => ConfigValue::String(s),
        Value::Sequence(items) => ConfigValue::Sequence(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| from_yaml_at(&path.child(&i.to_string()), item))
                .collect::<Result<_, _>>()?,
        ),
        Value::Mapping(entries) => {
            let mut map = ConfigMap::new();
            for (key, child) in entries {
                let key = match key {
                    Value::String(s) => s,
                    Value::Bool(b) => b.to_string(),
                    Value::Number(n) => n.to_string(),
                    Value::Null => "null".to_string(),
                    Value::Tagged(tagged) => match tagged.value {
                        Value::String(s) => s,
                        _ => return Err(format!("unsupported tagged mapping key under {}", path)),
                    },
                    Value::Sequence(_) | Value::Mapping(_) => {
                        return Err(format!("mapping key under {} must be a scalar", path))
                    }
                };
                let child_path = path.child(&key);
                if map.contains_key(&key) {
                    return Err(format!("duplicate mapping key {}", child_path));
                }
                let child = from_yaml_at(&child_path, child)?;
                map.insert(key, child);
            }
            ConfigValue::Map(map)
        }
        Value::Tagged(tagged) => from_yaml_at(path, tagged.value)?,
    })
}

impl Default for ConfigValue {
    fn default() -> Self {
        ConfigValue::empty_map()
    }
}

// Floats compare by bit pattern: a NaN that did not change must compare equal
// to itself, otherwise its subsection would be flagged on every run.
impl PartialEq for ConfigValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ConfigValue::Null, ConfigValue::Null) => true,
            (ConfigValue::Bool(a), ConfigValue::Bool(b)) => a == b,
            (ConfigValue::Integer(a), ConfigValue::Integer(b)) => a == b,
            (ConfigValue::Float(a), ConfigValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ConfigValue::String(a), ConfigValue::String(b)) => a == b,
            (ConfigValue::Sequence(a), ConfigValue::Sequence(b)) => a == b,
            (ConfigValue::Map(a), ConfigValue::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ConfigValue {}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl<T: Into<ConfigValue>> From<Vec<T>> for ConfigValue {
    fn from(values: Vec<T>) -> Self {
        ConfigValue::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => write!(f, "null"),
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Integer(i) => write!(f, "{}", i),
            ConfigValue::Float(x) => write!(f, "{:?}", x),
            ConfigValue::String(s) => write!(f, "{:?}", s),
            ConfigValue::Sequence(_) | ConfigValue::Map(_) => {
                let rendered = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                write!(f, "{}", rendered)
            }
        }
    }
}

/// Build a [`ConfigValue::Map`] from `key => value` pairs.
#[macro_export]
macro_rules! config_map {
    () => {
        $crate::config::ConfigValue::empty_map()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::config::ConfigMap::new();
        $(map.insert($key.to_string(), $crate::config::ConfigValue::from($value));)+
        $crate::config::ConfigValue::Map(map)
    }};
}
