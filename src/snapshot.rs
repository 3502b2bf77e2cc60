//! Configuration snapshots
//!
//! The effective configuration of every run is written to
//! `results/<run_name>/full_config.yaml`. The file is plain YAML preceded by a
//! comment header carrying provenance, so it stays readable by any YAML tool:
//!
//! ```text
//! # lgsm-workflow effective configuration snapshot
//! # written_at: 2024-05-01T12:00:00+00:00
//! # default_config: /work/config/default.yaml
//! # override_config: /work/config/user.yaml
//! # cli_override: sims.random_seed=1
//! lgsm:
//!   ...
//! ```

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{parse_yaml, ConfigValue, Provenance};
use crate::error::SnapshotError;

/// File name of the snapshot inside a run directory.
pub const SNAPSHOT_FILE_NAME: &str = "full_config.yaml";

const HEADER_TITLE: &str = "# lgsm-workflow effective configuration snapshot";
const KEY_WRITTEN_AT: &str = "written_at";
const KEY_DEFAULT_CONFIG: &str = "default_config";
const KEY_OVERRIDE_CONFIG: &str = "override_config";
const KEY_CLI_OVERRIDE: &str = "cli_override";

/// A snapshot read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub config: ConfigValue,
    /// None when the header is missing or has no `default_config` line
    pub provenance: Option<Provenance>,
    pub written_at: Option<DateTime<Utc>>,
}

/// Write `config` to `destination`, replacing any previous snapshot.
///
/// Missing parent directories are created. The content goes to a sibling
/// temporary file first and is renamed into place.
pub fn save_config(
    config: &ConfigValue,
    destination: &Path,
    provenance: &Provenance,
) -> Result<(), SnapshotError> {
    let write_err = |source: std::io::Error| SnapshotError::Write {
        path: destination.to_path_buf(),
        source,
    };

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
    }

    let rendered = render_snapshot(config, provenance, Utc::now())?;
    let staging = staging_path(destination);

    fs::write(&staging, rendered.as_bytes()).map_err(write_err)?;
    if let Err(e) = fs::rename(&staging, destination) {
        let _ = fs::remove_file(&staging);
        return Err(write_err(e));
    }

    info!(path = %destination.display(), "Configuration snapshot saved");
    Ok(())
}

/// Read a snapshot. A missing file is `Ok(None)`; an unreadable or malformed
/// one is an error so callers can decide how loudly to report it.
pub fn load_snapshot(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No previous snapshot");
            return Ok(None);
        }
        Err(source) => {
            return Err(SnapshotError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let corrupt = |message: String| SnapshotError::Corrupt {
        path: path.to_path_buf(),
        message,
    };

    let config = parse_yaml(&contents, path).map_err(|e| corrupt(e.to_string()))?;
    if !config.is_map() {
        return Err(corrupt(format!(
            "expected a mapping at the top level, found {}",
            config.kind()
        )));
    }

    let header = parse_header(&contents);
    Ok(Some(Snapshot {
        config,
        provenance: header.provenance(),
        written_at: header.written_at,
    }))
}

/// Render a snapshot document.
pub fn render_snapshot(
    config: &ConfigValue,
    provenance: &Provenance,
    written_at: DateTime<Utc>,
) -> Result<String, SnapshotError> {
    let body =
        serde_yaml::to_string(config).map_err(|e| SnapshotError::Serialize(e.to_string()))?;

    let mut out = String::new();
    out.push_str(HEADER_TITLE);
    out.push('\n');
    push_header_line(&mut out, KEY_WRITTEN_AT, &written_at.to_rfc3339());
    push_header_line(
        &mut out,
        KEY_DEFAULT_CONFIG,
        &provenance.default_config.to_string_lossy(),
    );
    if let Some(path) = &provenance.override_config {
        push_header_line(&mut out, KEY_OVERRIDE_CONFIG, &path.to_string_lossy());
    }
    for spec in &provenance.cli_overrides {
        push_header_line(&mut out, KEY_CLI_OVERRIDE, spec);
    }
    out.push_str(&body);
    Ok(out)
}

fn push_header_line(out: &mut String, key: &str, value: &str) {
    // A newline inside a value would end the comment early
    let value = value.replace(['\n', '\r'], " ");
    out.push_str(&format!("# {}: {}\n", key, value));
}

fn staging_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| SNAPSHOT_FILE_NAME.to_string());
    destination.with_file_name(format!(".{}.tmp", name))
}

#[derive(Default)]
struct Header {
    written_at: Option<DateTime<Utc>>,
    default_config: Option<PathBuf>,
    override_config: Option<PathBuf>,
    cli_overrides: Vec<String>,
}

impl Header {
    fn provenance(&self) -> Option<Provenance> {
        Some(Provenance {
            default_config: self.default_config.clone()?,
            override_config: self.override_config.clone(),
            cli_overrides: self.cli_overrides.clone(),
        })
    }
}

/// Parse the leading comment block; stops at the first non-comment line.
fn parse_header(contents: &str) -> Header {
    let mut header = Header::default();
    for line in contents.lines() {
        let Some(comment) = line.strip_prefix('#') else {
            break;
        };
        let Some((key, value)) = comment.trim().split_once(": ") else {
            continue;
        };
        let value = value.trim();
        match key {
            KEY_WRITTEN_AT => {
                header.written_at = DateTime::parse_from_rfc3339(value)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc));
            }
            KEY_DEFAULT_CONFIG => header.default_config = Some(PathBuf::from(value)),
            KEY_OVERRIDE_CONFIG => header.override_config = Some(PathBuf::from(value)),
            KEY_CLI_OVERRIDE => header.cli_overrides.push(value.to_string()),
            _ => {}
        }
    }
    header
}
