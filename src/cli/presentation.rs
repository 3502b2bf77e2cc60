//! Presentation: text and JSON formatters for command results.

use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::config::{ConfigValue, SubsectionPath};
use crate::error::WorkflowError;
use crate::flag::{Change, FlagMarker};
use crate::workflow::{PreparedRun, StageStatus};

pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn join_paths(paths: &[SubsectionPath]) -> String {
    if paths.is_empty() {
        "-".to_string()
    } else {
        paths.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(", ")
    }
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String, WorkflowError> {
    serde_json::to_string_pretty(value).map_err(|e| WorkflowError::Output(e.to_string()))
}

pub fn format_prepared_run_text(run: &PreparedRun) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Prepared run")));
    out.push_str(&format!("  Run: {}\n", run.run_name));
    out.push_str(&format!("  Snapshot: {}\n\n", run.snapshot.display()));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Stage", "Flag", "Marker", "Changed"]);
    for stage in &run.stages {
        for marker in &stage.markers {
            table.add_row(vec![
                stage.stage.name.clone(),
                marker.subsection.to_string(),
                marker.input(),
                if marker.changed { "yes" } else { "no" }.to_string(),
            ]);
        }
    }
    out.push_str(&format!("{}\n", table));

    let dirty = run.dirty_stages();
    if dirty.is_empty() {
        out.push_str("\nNo stage needs to re-run because of configuration changes.\n");
    } else {
        out.push_str(&format!("\nConfig-dirty stages: {}\n", dirty.join(", ")));
    }
    out
}

/// Just the marker path, so the output can be embedded in a rule definition.
pub fn format_flag_marker_text(marker: &FlagMarker) -> String {
    marker.input()
}

pub fn format_changes_text(changes: &[Change]) -> String {
    if changes.is_empty() {
        return "No configuration changes since the previous snapshot.".to_string();
    }
    let mut lines: Vec<String> = changes.iter().map(|c| c.to_string()).collect();
    lines.push(format!("\n{} change(s)", changes.len()));
    lines.join("\n")
}

pub fn format_stage_status_text(statuses: &[StageStatus], has_baseline: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Stage status")));
    if !has_baseline {
        out.push_str("  No previous snapshot: every flagged subsection counts as changed.\n\n");
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Stage", "Changed", "Unchanged", "Config"]);
    for status in statuses {
        let state = if status.config_dirty() {
            format!("{}", "dirty".yellow())
        } else {
            format!("{}", "clean".green())
        };
        table.add_row(vec![
            status.stage.clone(),
            join_paths(&status.changed_flags),
            join_paths(&status.unchanged_flags),
            state,
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_config_yaml(value: &ConfigValue) -> Result<String, WorkflowError> {
    serde_yaml::to_string(value).map_err(|e| WorkflowError::Output(e.to_string()))
}
