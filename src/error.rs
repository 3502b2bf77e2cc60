//! Error types for the LGSM workflow configuration layer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or merging configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Default configuration not found: {0}")]
    DefaultsNotFound(PathBuf),

    #[error("Failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Configuration {0} must be a mapping at the top level")]
    NotAMapping(PathBuf),

    #[error("Invalid override '{0}' (expected key.path=value)")]
    InvalidOverride(String),

    #[error("Invalid run name: {0}")]
    InvalidRunName(String),
}

/// Errors raised while persisting a configuration snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to write snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt snapshot {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Failed to serialize snapshot: {0}")]
    Serialize(String),

    #[error("Snapshot already persisted for this run: {0}")]
    AlreadyPersisted(PathBuf),
}

/// Errors raised while computing or writing flag markers.
#[derive(Debug, Error)]
pub enum FlagError {
    #[error("Flag path must have at least one segment")]
    EmptyPath,

    #[error("Subsection '{0}' is not present in the effective configuration")]
    UnknownSubsection(String),

    #[error("Failed to write flag marker {path}: {source}")]
    Marker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level error for workflow operations and the CLI.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Flag(#[from] FlagError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Output error: {0}")]
    Output(String),
}
