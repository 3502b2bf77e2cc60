//! Logging System
//!
//! Structured logging using the `tracing` crate. Level, format and destination
//! come from [`LoggingConfig`], which the CLI builds from its flags; the
//! `LGSM_LOG*` environment variables take precedence over both.

use crate::error::WorkflowError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Master switch; `--quiet` turns it off
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stderr, stdout, file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path (required when output is "file")
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Enable colored output (text format, terminal destinations only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    // stdout carries command output (marker paths, manifests)
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

/// Log destination
#[derive(Debug, Clone, PartialEq, Eq)]
enum Output {
    Stdout,
    Stderr,
    File(PathBuf),
}

/// Initialize the logging system
///
/// Priority order (highest to lowest):
/// 1. Environment variables (LGSM_LOG, LGSM_LOG_FORMAT, LGSM_LOG_OUTPUT)
/// 2. The given config (built from CLI flags)
/// 3. Defaults
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), WorkflowError> {
    let default_config = LoggingConfig::default();
    let config = config.unwrap_or(&default_config);

    if !config.enabled {
        return Ok(());
    }

    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;

    let use_color = config.color && format == "text";
    let (writer, ansi) = match &output {
        Output::Stdout => (BoxMakeWriter::new(std::io::stdout), use_color),
        Output::Stderr => (BoxMakeWriter::new(std::io::stderr), use_color),
        Output::File(path) => (BoxMakeWriter::new(Mutex::new(open_log_file(path)?)), false),
    };

    let registry = Registry::default().with(filter);
    let result = if format == "json" {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init()
    };

    result.map_err(|e| WorkflowError::Logging(e.to_string()))
}

fn open_log_file(path: &Path) -> Result<std::fs::File, WorkflowError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                WorkflowError::Logging(format!("Failed to create log directory: {}", e))
            })?;
        }
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| WorkflowError::Logging(format!("Failed to open log file {:?}: {}", path, e)))
}

/// Build environment filter from config or environment variables
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, WorkflowError> {
    if let Ok(filter) = EnvFilter::try_from_env("LGSM_LOG") {
        return Ok(filter);
    }

    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(&config.level);

    for (module, module_level) in &config.modules {
        let directive = format!("{}={}", module, module_level);
        filter = filter.add_directive(
            directive
                .parse()
                .map_err(|e| WorkflowError::Logging(format!("Invalid log directive: {}", e)))?,
        );
    }

    if let Ok(modules_str) = std::env::var("LGSM_LOG_MODULES") {
        for module_spec in modules_str.split(',') {
            if let Some((module, level)) = module_spec.split_once('=') {
                let directive = format!("{}={}", module.trim(), level.trim());
                filter = filter.add_directive(directive.parse().map_err(|e| {
                    WorkflowError::Logging(format!("Invalid log directive from env: {}", e))
                })?);
            }
        }
    }

    Ok(filter)
}

/// Determine output format from environment or config
fn determine_format(config: &LoggingConfig) -> Result<String, WorkflowError> {
    if let Ok(format) = std::env::var("LGSM_LOG_FORMAT") {
        if format == "json" || format == "text" {
            return Ok(format);
        }
    }

    match config.format.as_str() {
        "json" | "text" => Ok(config.format.clone()),
        other => Err(WorkflowError::Logging(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            other
        ))),
    }
}

/// Determine output destination from environment or config
fn determine_output(config: &LoggingConfig) -> Result<Output, WorkflowError> {
    let output = std::env::var("LGSM_LOG_OUTPUT").unwrap_or_else(|_| config.output.clone());
    parse_output(&output, config.file.as_ref())
}

fn parse_output(output: &str, file: Option<&PathBuf>) -> Result<Output, WorkflowError> {
    match output {
        "stdout" => Ok(Output::Stdout),
        "stderr" => Ok(Output::Stderr),
        "file" => file.cloned().map(Output::File).ok_or_else(|| {
            WorkflowError::Logging("Log output 'file' requires a log file path".to_string())
        }),
        _ => Err(WorkflowError::Logging(format!(
            "Invalid log output: {} (must be 'stdout', 'stderr' or 'file')",
            output
        ))),
    }
}
