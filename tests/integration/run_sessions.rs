//! Integration tests for run sessions: flag markers, baselines and snapshot ordering

use std::fs;
use std::time::UNIX_EPOCH;

use lgsm_workflow::config::{ConfigValue, SubsectionPath};
use lgsm_workflow::error::{ConfigError, FlagError, SnapshotError, WorkflowError};
use lgsm_workflow::snapshot::load_snapshot;
use lgsm_workflow::workflow::{stage_names, RunSession};

use super::test_utils::{age_markers, aged, mtime, Workspace};

#[test]
fn test_first_run_flags_every_stage() {
    let ws = Workspace::new();

    let run = RunSession::prepare(&ws.request(&[])).unwrap();

    assert_eq!(run.run_name, "default");
    assert_eq!(run.dirty_stages(), stage_names());
    for stage in &run.stages {
        for marker in &stage.markers {
            assert!(marker.changed);
            assert!(marker.path.exists());
            assert!(mtime(&marker.path) > UNIX_EPOCH);
        }
    }
    assert!(run.snapshot_path().exists());
}

#[test]
fn test_rerun_with_same_config_leaves_markers_untouched() {
    let ws = Workspace::new();
    RunSession::prepare(&ws.request(&[])).unwrap();
    age_markers(&ws.run_dir("default").join("flags"));

    let run = RunSession::prepare(&ws.request(&[])).unwrap();

    assert!(run.dirty_stages().is_empty());
    for stage in &run.stages {
        for marker in &stage.markers {
            assert!(!marker.changed);
            assert_eq!(mtime(&marker.path), aged(), "{} was touched", marker.subsection);
        }
    }
}

#[test]
fn test_seed_change_dirties_only_simulation() {
    let ws = Workspace::new();
    RunSession::prepare(&ws.request(&[])).unwrap();
    age_markers(&ws.run_dir("default").join("flags"));

    let run = RunSession::prepare(&ws.request(&["sims.random_seed=1"])).unwrap();

    assert_eq!(run.dirty_stages(), vec!["simulate_photometry"]);
    assert!(mtime(&ws.marker("default", "sims")) > aged());
    assert_eq!(mtime(&ws.marker("default", "lgsm")), aged());
    assert_eq!(mtime(&ws.marker("default", "plotting.rcParams")), aged());
}

#[test]
fn test_rc_params_change_dirties_every_plot() {
    let ws = Workspace::new();
    RunSession::prepare(&ws.request(&[])).unwrap();

    // flow mapping, since rcParams keys contain dots
    let run = RunSession::prepare(&ws.request(&["plotting.rcParams={font.size: 12}"])).unwrap();

    assert_eq!(
        run.dirty_stages(),
        vec!["plot_model_losses", "plot_model_predictions", "plot_latent_variables"]
    );
}

#[test]
fn test_deep_loss_toggle_dirties_training_only() {
    let ws = Workspace::new();
    RunSession::prepare(&ws.request(&[])).unwrap();

    let run =
        RunSession::prepare(&ws.request(&["lgsm.training.losses.SpectralLoss.use=true"])).unwrap();

    assert_eq!(run.dirty_stages(), vec!["train_lgsmodel"]);
}

#[test]
fn test_missing_snapshot_counts_everything_changed() {
    let ws = Workspace::new();
    RunSession::prepare(&ws.request(&[])).unwrap();
    fs::remove_file(ws.run_dir("default").join("full_config.yaml")).unwrap();

    let run = RunSession::prepare(&ws.request(&[])).unwrap();

    assert_eq!(run.dirty_stages(), stage_names());
}

#[test]
fn test_corrupt_snapshot_counts_everything_changed() {
    let ws = Workspace::new();
    RunSession::prepare(&ws.request(&[])).unwrap();
    fs::write(ws.run_dir("default").join("full_config.yaml"), "sims: [unclosed\n").unwrap();

    let session = RunSession::open(&ws.request(&[])).unwrap();

    assert!(!session.flagger().has_baseline());
    assert!(session.stage_status().unwrap().iter().all(|s| s.config_dirty()));
}

#[test]
fn test_flags_after_persist_compare_against_previous_run() {
    let ws = Workspace::new();
    RunSession::prepare(&ws.request(&[])).unwrap();

    let mut session = RunSession::open(&ws.request(&["sims.random_seed=1"])).unwrap();
    session.persist().unwrap();
    let marker = session.flag(&SubsectionPath::parse("sims")).unwrap();

    assert!(marker.changed, "baseline must be the snapshot read at open time");
    let saved = load_snapshot(&ws.run_dir("default").join("full_config.yaml"))
        .unwrap()
        .unwrap();
    assert_eq!(saved.config.get("sims.random_seed"), Some(&ConfigValue::Integer(1)));
}

#[test]
fn test_second_persist_is_rejected() {
    let ws = Workspace::new();
    let mut session = RunSession::open(&ws.request(&[])).unwrap();

    session.persist().unwrap();
    let err = session.persist().unwrap_err();

    assert!(session.is_persisted());
    assert!(matches!(
        err,
        WorkflowError::Snapshot(SnapshotError::AlreadyPersisted(_))
    ));
}

#[test]
fn test_status_writes_nothing() {
    let ws = Workspace::new();
    let session = RunSession::open(&ws.request(&[])).unwrap();

    let statuses = session.stage_status().unwrap();

    assert_eq!(statuses.len(), stage_names().len());
    assert!(!ws.run_dir("default").exists());
}

#[test]
fn test_repeated_flag_calls_touch_once() {
    let ws = Workspace::new();
    let session = RunSession::open(&ws.request(&[])).unwrap();
    let path = SubsectionPath::parse("plotting.model_losses");

    let first = session.flag(&path).unwrap();
    let touched = mtime(&first.path);
    let second = session.flag(&path).unwrap();

    assert_eq!(first, second);
    assert_eq!(mtime(&second.path), touched);
}

#[test]
fn test_flag_unknown_subsection_is_an_error() {
    let ws = Workspace::new();
    let session = RunSession::open(&ws.request(&[])).unwrap();

    let err = session.flag(&SubsectionPath::parse("plotting.sed_gallery")).unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Flag(FlagError::UnknownSubsection(ref path)) if path == "plotting.sed_gallery"
    ));
}

#[test]
fn test_rule_inputs_list_flags_before_data() {
    let ws = Workspace::new();
    let session = RunSession::open(&ws.request(&[])).unwrap();

    let stages = session.flag_stages().unwrap();
    let predictions = stages
        .iter()
        .find(|s| s.stage.name == "plot_model_predictions")
        .unwrap();
    let inputs = predictions.rule_inputs();

    assert_eq!(inputs.len(), 4);
    assert_eq!(inputs[0], ws.marker("default", "plotting.rcParams"));
    assert_eq!(inputs[1], ws.marker("default", "plotting.model_predictions"));
    assert_eq!(inputs[2], ws.run_dir("default").join("trained_model"));
    assert_eq!(inputs[3], ws.run_dir("default").join("photometry.pkl"));
}

#[test]
fn test_figure_outputs_use_configured_format() {
    let ws = Workspace::new();
    let session = RunSession::open(&ws.request(&[])).unwrap();

    let stages = session.stages();
    let latent = stages
        .iter()
        .find(|s| s.name == "plot_latent_variables")
        .unwrap();

    assert_eq!(
        latent.outputs,
        vec![ws
            .run_dir("default")
            .join("figures")
            .join("latent_variables.pdf")]
    );
}

#[test]
fn test_runs_keep_separate_baselines() {
    let ws = Workspace::new();
    RunSession::prepare(&ws.request(&["run_name=alpha"])).unwrap();

    let beta = RunSession::prepare(&ws.request(&["run_name=beta"])).unwrap();
    let alpha = RunSession::prepare(&ws.request(&["run_name=alpha"])).unwrap();

    assert_eq!(beta.dirty_stages(), stage_names());
    assert!(alpha.dirty_stages().is_empty());
    assert!(ws.run_dir("beta").join("full_config.yaml").exists());
}

#[test]
fn test_run_name_cannot_escape_results_dir() {
    let ws = Workspace::new();

    let err = match RunSession::open(&ws.request(&["run_name=../elsewhere"])) {
        Ok(_) => panic!("run name with a path separator was accepted"),
        Err(e) => e,
    };

    assert!(matches!(
        err,
        WorkflowError::Config(ConfigError::InvalidRunName(_))
    ));
}

#[test]
fn test_figure_format_change_dirties_only_that_plot() {
    let ws = Workspace::new();
    RunSession::prepare(&ws.request(&[])).unwrap();
    age_markers(&ws.run_dir("default").join("flags"));

    let run = RunSession::prepare(&ws.request(&["plotting.model_losses.format=pdf"])).unwrap();

    assert_eq!(run.dirty_stages(), vec!["plot_model_losses"]);
    assert_eq!(mtime(&ws.marker("default", "lgsm")), aged());
    assert!(mtime(&ws.marker("default", "plotting.model_losses")) > aged());
    let losses = run
        .stages
        .iter()
        .find(|s| s.stage.name == "plot_model_losses")
        .unwrap();
    assert!(losses.stage.outputs[0].ends_with("figures/model_losses.pdf"));
}

#[test]
fn test_empty_override_file_changes_nothing() {
    let ws = Workspace::new();
    RunSession::prepare(&ws.request(&[])).unwrap();
    let user = ws.write_override("user.yaml", "");

    let mut request = ws.request(&[]);
    request.sources = request.sources.with_override_file(&user);
    let run = RunSession::prepare(&request).unwrap();

    assert!(run.dirty_stages().is_empty());
}
