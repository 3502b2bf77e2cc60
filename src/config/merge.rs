//! Merge rules for configuration layers.
//!
//! - Maps: deep-merge by key (recursive)
//! - Sequences: replaced wholesale (override wins)
//! - Scalars and map/non-map conflicts: override wins
//!
//! Keys that exist only in the override are kept. Nothing is validated
//! against the defaults; such keys are reported at debug level so a typo
//! in a user override can still be found in the logs.

use tracing::debug;

use super::path::SubsectionPath;
use super::value::{ConfigMap, ConfigValue};

/// Merge `overlay` over `base`, returning a new tree. Neither input is modified.
///
/// A `Null` or empty-map overlay means "no override" and yields a copy of `base`.
pub fn merge(base: &ConfigValue, overlay: &ConfigValue) -> ConfigValue {
    if overlay.is_empty_override() {
        return base.clone();
    }
    merge_at(&SubsectionPath::root(), base, overlay)
}

/// Fold layers left to right: the first is the base, the last has highest precedence.
pub fn merge_layers<'a, I>(layers: I) -> ConfigValue
where
    I: IntoIterator<Item = &'a ConfigValue>,
{
    let mut layers = layers.into_iter();
    let Some(first) = layers.next() else {
        return ConfigValue::empty_map();
    };
    layers.fold(first.clone(), |acc, layer| merge(&acc, layer))
}

fn merge_at(path: &SubsectionPath, base: &ConfigValue, overlay: &ConfigValue) -> ConfigValue {
    match (base, overlay) {
        (ConfigValue::Map(base_map), ConfigValue::Map(overlay_map)) => {
            let mut merged: ConfigMap = base_map.clone();
            for (key, overlay_value) in overlay_map {
                let child = path.child(key);
                let value = match base_map.get(key) {
                    Some(base_value) => merge_at(&child, base_value, overlay_value),
                    None => {
                        debug!(key = %child, "override adds key absent from defaults");
                        overlay_value.clone()
                    }
                };
                merged.insert(key.clone(), value);
            }
            ConfigValue::Map(merged)
        }
        (ConfigValue::Map(_), other) => {
            debug!(
                key = %path,
                kind = other.kind(),
                "override replaces a mapping with a non-mapping value"
            );
            other.clone()
        }
        (_, other) => other.clone(),
    }
}
