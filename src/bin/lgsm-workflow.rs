//! lgsm-workflow CLI Binary
//!
//! Command-line interface to the LGSM workflow configuration layer.

use clap::Parser;
use lgsm_workflow::cli::{Cli, RunContext};
use lgsm_workflow::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);

    // Initialize logging early
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("lgsm-workflow starting");

    let context = RunContext::from_cli(&cli);

    match context.execute(&cli.command) {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", lgsm_workflow::cli::map_error(&e));
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI args.
/// Precedence: explicit flags override --verbose/--quiet override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = LoggingConfig::default();

    if cli.quiet {
        config.enabled = false;
    }
    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
        config.output = "file".to_string();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }

    config
}
