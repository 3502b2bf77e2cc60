//! Stage catalogue of the LGSM pipeline.
//!
//! Stages are external scripts run by the workflow runner. Here they are only
//! described: the configuration subsections each one declares as flags, its
//! data inputs and its outputs. Flags come first in a rule's input list,
//! followed by the data inputs.

use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use crate::config::{EffectiveConfig, SubsectionPath};

use super::layout::RunLayout;

/// Figure format used when `plotting.<figure>.format` is not set.
pub const DEFAULT_FIGURE_FORMAT: &str = "png";

/// Simulated photometry table, relative to the run directory.
pub const PHOTOMETRY_ARTIFACT: &str = "photometry.pkl";

/// Trained model directory, relative to the run directory.
pub const MODEL_ARTIFACT: &str = "trained_model";

/// Shared matplotlib settings applied by every plotting stage.
pub const RC_PARAMS_SUBSECTION: &str = "plotting.rcParams";

enum Input {
    /// Path taken from a string value in the configuration
    ConfigPath(&'static str),
    /// Artifact inside the run directory
    Artifact(&'static str),
}

enum Output {
    Artifact(&'static str),
    /// `figures/<name>.<format>` with format from `plotting.<name>.format`
    Figure(&'static str),
}

struct StageDef {
    name: &'static str,
    flags: &'static [&'static str],
    inputs: &'static [Input],
    output: Output,
}

const STAGES: &[StageDef] = &[
    StageDef {
        name: "simulate_photometry",
        flags: &["sims"],
        inputs: &[Input::ConfigPath("sims.sed_file")],
        output: Output::Artifact(PHOTOMETRY_ARTIFACT),
    },
    StageDef {
        name: "train_lgsmodel",
        flags: &["lgsm"],
        inputs: &[Input::Artifact(PHOTOMETRY_ARTIFACT)],
        output: Output::Artifact(MODEL_ARTIFACT),
    },
    StageDef {
        name: "plot_model_losses",
        flags: &[RC_PARAMS_SUBSECTION, "plotting.model_losses"],
        inputs: &[Input::Artifact(MODEL_ARTIFACT)],
        output: Output::Figure("model_losses"),
    },
    StageDef {
        name: "plot_model_predictions",
        flags: &[RC_PARAMS_SUBSECTION, "plotting.model_predictions"],
        inputs: &[
            Input::Artifact(MODEL_ARTIFACT),
            Input::Artifact(PHOTOMETRY_ARTIFACT),
        ],
        output: Output::Figure("model_predictions"),
    },
    StageDef {
        name: "plot_latent_variables",
        flags: &[RC_PARAMS_SUBSECTION, "plotting.latent_variables"],
        inputs: &[
            Input::Artifact(MODEL_ARTIFACT),
            Input::Artifact(PHOTOMETRY_ARTIFACT),
        ],
        output: Output::Figure("latent_variables"),
    },
];

/// One pipeline stage resolved against a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub name: String,
    /// Subsections declared as flags, in declaration order
    pub flags: Vec<SubsectionPath>,
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
}

/// Resolve every pipeline stage for `config` and `layout`.
pub fn pipeline_stages(config: &EffectiveConfig, layout: &RunLayout) -> Vec<Stage> {
    STAGES
        .iter()
        .map(|def| resolve_stage(def, config, layout))
        .collect()
}

/// Names of all pipeline stages, in execution order.
pub fn stage_names() -> Vec<&'static str> {
    STAGES.iter().map(|def| def.name).collect()
}

fn resolve_stage(def: &StageDef, config: &EffectiveConfig, layout: &RunLayout) -> Stage {
    let inputs = def
        .inputs
        .iter()
        .filter_map(|input| match input {
            Input::ConfigPath(key) => match config.get(key).and_then(|v| v.as_str()) {
                Some(path) => Some(PathBuf::from(path)),
                None => {
                    debug!(stage = def.name, key, "Input path not configured");
                    None
                }
            },
            Input::Artifact(name) => Some(layout.artifact(name)),
        })
        .collect();

    let output = match def.output {
        Output::Artifact(name) => layout.artifact(name),
        Output::Figure(name) => {
            let format = config
                .get(&format!("plotting.{}.format", name))
                .and_then(|v| v.as_str())
                .unwrap_or(DEFAULT_FIGURE_FORMAT);
            layout.artifact(&format!("figures/{}.{}", name, format))
        }
    };

    Stage {
        name: def.name.to_string(),
        flags: def.flags.iter().map(|f| SubsectionPath::parse(f)).collect(),
        inputs,
        outputs: vec![output],
    }
}
