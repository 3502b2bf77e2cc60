//! LGSM Workflow: configuration glue for the LGSM training pipeline
//!
//! Merges the pipeline's default configuration with user overrides, persists
//! the effective configuration of each run, and turns per-subsection
//! configuration changes into marker files the workflow runner can depend on.

pub mod cli;
pub mod config;
pub mod digest;
pub mod error;
pub mod flag;
pub mod logging;
pub mod snapshot;
pub mod types;
pub mod workflow;

pub use config::{merge, ConfigValue, EffectiveConfig, SubsectionPath};
pub use flag::{ConfigFlagger, FlagMarker};
pub use snapshot::save_config;
pub use workflow::RunSession;
