//! Core type definitions shared across the crate.

/// BLAKE3 digest of a canonically encoded configuration subtree.
pub type Digest = [u8; 32];

/// Lower-case hex rendering of a digest, as written into flag markers.
pub fn digest_hex(digest: &Digest) -> String {
    hex::encode(digest)
}
