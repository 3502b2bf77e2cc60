//! CLI parse: clap types for lgsm-workflow. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;
use crate::workflow::DEFAULT_RESULTS_DIR;

/// lgsm-workflow - configuration merging and config-change flags for the LGSM pipeline
#[derive(Parser)]
#[command(name = "lgsm-workflow")]
#[command(about = "Configuration merging and config-change flags for the LGSM workflow")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Default configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub defaults: PathBuf,

    /// Override configuration file, merged over the defaults
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Override a single value, e.g. --set sims.random_seed=1 (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Results directory; run outputs go to <results-dir>/<run_name>
    #[arg(long, default_value = DEFAULT_RESULTS_DIR)]
    pub results_dir: PathBuf,

    /// Run name (overrides `run_name` from the configuration)
    #[arg(long)]
    pub run_name: Option<String>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stderr, stdout, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Flag every stage's subsections, then save the configuration snapshot
    Prepare {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Resolve the marker for one subsection and print its path
    Flag {
        /// Dotted subsection path, e.g. plotting.model_losses
        path: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List configuration changes since the previous snapshot
    Diff {
        /// Restrict to a dotted subsection path
        path: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show which stages a configuration change makes dirty (writes nothing)
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the effective configuration as YAML
    Show {
        /// Restrict to a dotted subsection path
        path: Option<String>,
    },
}
