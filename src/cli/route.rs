//! CLI route: single route table and run context. Dispatches to the workflow
//! session and presentation.

use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::{ConfigSources, SubsectionPath};
use crate::error::{FlagError, WorkflowError};
use crate::workflow::{RunSession, SessionRequest};

use crate::cli::parse::{Cli, Commands};
use crate::cli::presentation::{
    format_changes_text, format_config_yaml, format_flag_marker_text, format_prepared_run_text,
    format_stage_status_text, to_json,
};

/// Runtime context for CLI execution: where configuration and results live.
pub struct RunContext {
    request: SessionRequest,
}

impl RunContext {
    /// Build the context from parsed global options.
    pub fn from_cli(cli: &Cli) -> Self {
        let mut sources = ConfigSources::new(cli.defaults.clone());
        if let Some(ref path) = cli.config {
            sources = sources.with_override_file(path.clone());
        }
        for spec in &cli.set {
            sources = sources.with_cli_override(spec.clone());
        }
        // --run-name is applied last so it wins over any file or --set value
        if let Some(ref run_name) = cli.run_name {
            sources = sources.with_run_name(run_name.clone());
        }
        Self::new(sources, cli.results_dir.clone())
    }

    pub fn new(sources: ConfigSources, results_dir: PathBuf) -> Self {
        Self {
            request: SessionRequest::new(sources).with_results_dir(results_dir),
        }
    }

    pub fn request(&self) -> &SessionRequest {
        &self.request
    }

    /// Execute a command, returning the text to print on stdout.
    pub fn execute(&self, command: &Commands) -> Result<String, WorkflowError> {
        debug!(command = ?command, "Executing command");
        match command {
            Commands::Prepare { format } => {
                let run = RunSession::prepare(&self.request)?;
                info!(
                    run = %run.run_name,
                    dirty = run.dirty_stages().len(),
                    "Run prepared"
                );
                if format == "json" {
                    to_json(&run)
                } else {
                    Ok(format_prepared_run_text(&run))
                }
            }
            Commands::Flag { path, format } => {
                let session = RunSession::open(&self.request)?;
                let marker = session.flag(&SubsectionPath::parse(path))?;
                if format == "json" {
                    to_json(&marker)
                } else {
                    Ok(format_flag_marker_text(&marker))
                }
            }
            Commands::Diff { path, format } => {
                let session = RunSession::open(&self.request)?;
                let path = path.as_deref().map(SubsectionPath::parse);
                let changes = session.changes(path.as_ref());
                if format == "json" {
                    to_json(&changes)
                } else {
                    Ok(format_changes_text(&changes))
                }
            }
            Commands::Status { format } => {
                let session = RunSession::open(&self.request)?;
                let statuses = session.stage_status()?;
                if format == "json" {
                    to_json(&statuses)
                } else {
                    Ok(format_stage_status_text(
                        &statuses,
                        session.flagger().has_baseline(),
                    ))
                }
            }
            Commands::Show { path } => {
                let session = RunSession::open(&self.request)?;
                let root = session.config().value();
                let value = match path {
                    Some(dotted) => {
                        let path = SubsectionPath::parse(dotted);
                        root.get_path(&path)
                            .ok_or_else(|| FlagError::UnknownSubsection(path.to_string()))?
                    }
                    None => root,
                };
                format_config_yaml(value)
            }
        }
    }
}
