//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to the run session.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_changes_text, format_config_yaml, format_flag_marker_text, format_prepared_run_text,
    format_section_heading, format_stage_status_text,
};
pub use route::RunContext;
