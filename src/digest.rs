//! Content digests for configuration subtrees using BLAKE3
//!
//! The encoding is canonical: every node is prefixed with a type
//! discriminator, lengths are 8-byte big-endian, and map entries are hashed
//! in sorted key order. Equal trees (in the [`ConfigValue`] sense) therefore
//! always produce equal digests.

use blake3::Hasher;

use crate::config::ConfigValue;
use crate::types::Digest;

/// Compute the digest of a configuration subtree.
pub fn compute_config_digest(value: &ConfigValue) -> Digest {
    let mut hasher = Hasher::new();
    update_value(&mut hasher, value);
    *hasher.finalize().as_bytes()
}

fn update_len(hasher: &mut Hasher, len: usize) {
    hasher.update(&(len as u64).to_be_bytes());
}

fn update_str(hasher: &mut Hasher, s: &str) {
    update_len(hasher, s.len());
    hasher.update(s.as_bytes());
}

fn update_value(hasher: &mut Hasher, value: &ConfigValue) {
    match value {
        ConfigValue::Null => {
            hasher.update(b"null");
        }
        ConfigValue::Bool(b) => {
            hasher.update(b"bool");
            hasher.update(&[u8::from(*b)]);
        }
        ConfigValue::Integer(i) => {
            hasher.update(b"int");
            hasher.update(&i.to_be_bytes());
        }
        ConfigValue::Float(x) => {
            hasher.update(b"float");
            hasher.update(&x.to_bits().to_be_bytes());
        }
        ConfigValue::String(s) => {
            hasher.update(b"str");
            update_str(hasher, s);
        }
        ConfigValue::Sequence(items) => {
            hasher.update(b"seq");
            update_len(hasher, items.len());
            for item in items {
                update_value(hasher, item);
            }
        }
        ConfigValue::Map(map) => {
            // BTreeMap iteration is already sorted by key
            hasher.update(b"map");
            update_len(hasher, map.len());
            for (key, item) in map {
                update_str(hasher, key);
                update_value(hasher, item);
            }
        }
    }
}
