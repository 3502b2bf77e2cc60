//! Flag marker files.
//!
//! A workflow rule declares `<run>/flags/<subsection>.flag` as an input. The
//! runner re-executes a rule when an input is newer than its outputs, so a
//! marker's modification time only ever moves forward when its subsection
//! changed. Unchanged markers that have to be created get an mtime at the
//! Unix epoch, which is older than any output.

use serde::Serialize;
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::SubsectionPath;
use crate::types::{digest_hex, Digest};

/// Directory holding markers, relative to the run directory.
pub const FLAG_DIR_NAME: &str = "flags";

/// File extension of marker files.
pub const FLAG_EXTENSION: &str = "flag";

/// The value `flag` hands back to the workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagMarker {
    /// Subsection this marker tracks
    pub subsection: SubsectionPath,
    /// Marker file to declare as a rule input
    pub path: PathBuf,
    /// Whether the subsection changed since the previous snapshot
    pub changed: bool,
    /// Hex BLAKE3 digest of the current subsection
    pub digest: String,
}

impl FlagMarker {
    /// Marker path as a string, the form a rule definition embeds.
    pub fn input(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Marker file location for `subsection` inside `flag_dir`.
pub fn marker_path(flag_dir: &Path, subsection: &SubsectionPath) -> PathBuf {
    flag_dir.join(format!("{}.{}", subsection.marker_stem(), FLAG_EXTENSION))
}

/// Write a marker whose mtime is "now", forcing dependent rules to run.
pub fn touch_changed(path: &Path, digest: &Digest) -> io::Result<()> {
    write_marker(path, digest)?;
    set_modified(path, SystemTime::now())
}

/// Make sure an unchanged marker exists without making it look new.
///
/// An existing marker is left alone, content and mtime included.
pub fn ensure_unchanged(path: &Path, digest: &Digest) -> io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    write_marker(path, digest)?;
    set_modified(path, UNIX_EPOCH)?;
    Ok(true)
}

fn write_marker(path: &Path, digest: &Digest) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("{}\n", digest_hex(digest)))
}

fn set_modified(path: &Path, time: SystemTime) -> io::Result<()> {
    let file = File::options().write(true).open(path)?;
    file.set_times(FileTimes::new().set_modified(time))
}
