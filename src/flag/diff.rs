//! Leaf-level differences between two configuration trees.

use serde::Serialize;
use std::fmt;

use crate::config::{ConfigValue, SubsectionPath};

/// How one leaf differs between the baseline and the current configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Change {
    /// Present now, absent from the baseline
    Added { path: SubsectionPath, current: ConfigValue },
    /// Present in the baseline, absent now
    Removed { path: SubsectionPath, previous: ConfigValue },
    /// Present in both with different values
    Modified {
        path: SubsectionPath,
        previous: ConfigValue,
        current: ConfigValue,
    },
}

impl Change {
    pub fn path(&self) -> &SubsectionPath {
        match self {
            Change::Added { path, .. } | Change::Removed { path, .. } | Change::Modified { path, .. } => {
                path
            }
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Added { path, current } => write!(f, "+ {}: {}", path, current),
            Change::Removed { path, previous } => write!(f, "- {}: {}", path, previous),
            Change::Modified {
                path,
                previous,
                current,
            } => write!(f, "~ {}: {} -> {}", path, previous, current),
        }
    }
}

/// Collect the changes between `previous` and `current`, both rooted at `path`.
///
/// Maps are walked key by key; any other differing node (including a
/// sequence) is reported as a single change at its own path.
pub fn diff_values(
    path: &SubsectionPath,
    previous: Option<&ConfigValue>,
    current: Option<&ConfigValue>,
) -> Vec<Change> {
    let mut changes = Vec::new();
    diff_into(path, previous, current, &mut changes);
    changes
}

fn diff_into(
    path: &SubsectionPath,
    previous: Option<&ConfigValue>,
    current: Option<&ConfigValue>,
    changes: &mut Vec<Change>,
) {
    match (previous, current) {
        (None, None) => {}
        (None, Some(current)) => changes.push(Change::Added {
            path: path.clone(),
            current: current.clone(),
        }),
        (Some(previous), None) => changes.push(Change::Removed {
            path: path.clone(),
            previous: previous.clone(),
        }),
        (Some(ConfigValue::Map(prev_map)), Some(ConfigValue::Map(curr_map))) => {
            let mut keys: Vec<&String> = prev_map.keys().chain(curr_map.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                diff_into(&path.child(key), prev_map.get(key), curr_map.get(key), changes);
            }
        }
        (Some(previous), Some(current)) => {
            if previous != current {
                changes.push(Change::Modified {
                    path: path.clone(),
                    previous: previous.clone(),
                    current: current.clone(),
                });
            }
        }
    }
}
