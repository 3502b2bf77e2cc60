//! Integration tests for building the effective configuration from files and overrides

use std::path::{Path, PathBuf};

use lgsm_workflow::config::{ConfigLoader, ConfigValue, SubsectionPath};
use lgsm_workflow::error::ConfigError;
use lgsm_workflow::workflow::{pipeline_stages, RunLayout};

use super::test_utils::Workspace;

#[test]
fn test_shipped_defaults_cover_every_stage_flag() {
    let defaults = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/default.yaml");
    let config = ConfigLoader::load_defaults_only(&defaults).unwrap();
    let layout = RunLayout::new(Path::new("results"), &config.run_name().unwrap());

    for stage in pipeline_stages(&config, &layout) {
        for flag in &stage.flags {
            assert!(
                config.value().get_path(flag).is_some(),
                "stage {} flags {} which the defaults do not define",
                stage.name,
                flag
            );
        }
    }
}

#[test]
fn test_override_file_replaces_leaf_and_keeps_siblings() {
    let ws = Workspace::new();
    let user = ws.write_override("user.yaml", "sims:\n  random_seed: 7\n");

    let config = ConfigLoader::load(&ws.sources().with_override_file(&user)).unwrap();

    assert_eq!(config.get("sims.random_seed"), Some(&ConfigValue::Integer(7)));
    assert_eq!(config.get("sims.sed_file"), Some(&ConfigValue::from("data/seds.pkl")));
    assert_eq!(config.get("lgsm.vae.latent_dim"), Some(&ConfigValue::Integer(2)));
}

#[test]
fn test_nested_override_three_levels_deep() {
    let ws = Workspace::new();
    let user = ws.write_override(
        "user.yaml",
        "lgsm:\n  training:\n    losses:\n      SpectralLoss:\n        use: true\n",
    );

    let config = ConfigLoader::load(&ws.sources().with_override_file(&user)).unwrap();

    assert_eq!(
        config.get("lgsm.training.losses.SpectralLoss.use"),
        Some(&ConfigValue::Bool(true))
    );
    assert_eq!(
        config.get("lgsm.training.losses.SpectralLoss.params.eta"),
        Some(&ConfigValue::Float(0.1))
    );
    assert_eq!(config.get("lgsm.training.epochs"), Some(&ConfigValue::Integer(100)));
}

#[test]
fn test_sequences_are_replaced_not_concatenated() {
    let ws = Workspace::new();
    let user = ws.write_override("user.yaml", "sims:\n  bandpasses: [lsst_z]\n");

    let config = ConfigLoader::load(&ws.sources().with_override_file(&user)).unwrap();

    assert_eq!(
        config.get("sims.bandpasses"),
        Some(&ConfigValue::from(vec!["lsst_z"]))
    );
}

#[test]
fn test_command_line_override_beats_override_file() {
    let ws = Workspace::new();
    let user = ws.write_override("user.yaml", "sims:\n  random_seed: 7\n");
    let sources = ws
        .sources()
        .with_override_file(&user)
        .with_cli_override("sims.random_seed=9");

    let config = ConfigLoader::load(&sources).unwrap();

    assert_eq!(config.get("sims.random_seed"), Some(&ConfigValue::Integer(9)));
    assert_eq!(config.provenance().cli_overrides, vec!["sims.random_seed=9"]);
    assert!(config.provenance().override_config.is_some());
}

#[test]
fn test_later_command_line_override_wins() {
    let ws = Workspace::new();
    let sources = ws
        .sources()
        .with_cli_override("plotting.model_losses.format=pdf")
        .with_cli_override("plotting.model_losses.format=svg");

    let config = ConfigLoader::load(&sources).unwrap();

    assert_eq!(
        config.get("plotting.model_losses.format"),
        Some(&ConfigValue::from("svg"))
    );
}

#[test]
fn test_empty_override_file_yields_defaults() {
    let ws = Workspace::new();
    let user = ws.write_override("user.yaml", "# nothing to change\n");

    let with_override = ConfigLoader::load(&ws.sources().with_override_file(&user)).unwrap();
    let defaults_only = ConfigLoader::load_defaults_only(ws.defaults()).unwrap();

    assert_eq!(with_override.value(), defaults_only.value());
}

#[test]
fn test_unknown_override_key_is_kept() {
    let ws = Workspace::new();
    let user = ws.write_override("user.yaml", "sims:\n  extra_noise: 0.5\n");

    let config = ConfigLoader::load(&ws.sources().with_override_file(&user)).unwrap();

    assert_eq!(config.get("sims.extra_noise"), Some(&ConfigValue::Float(0.5)));
}

#[test]
fn test_missing_defaults_is_an_error() {
    let ws = Workspace::new();
    let missing = ws.root().join("config").join("absent.yaml");

    let err = ConfigLoader::load_defaults_only(&missing).unwrap_err();

    assert!(matches!(err, ConfigError::DefaultsNotFound(path) if path == missing));
}

#[test]
fn test_malformed_override_file_is_a_parse_error() {
    let ws = Workspace::new();
    let user = ws.write_override("user.yaml", "sims: [unclosed\n");

    let err = ConfigLoader::load(&ws.sources().with_override_file(&user)).unwrap_err();

    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_override_file_must_be_a_mapping() {
    let ws = Workspace::new();
    let user = ws.write_override("user.yaml", "- just\n- a list\n");

    let err = ConfigLoader::load(&ws.sources().with_override_file(&user)).unwrap_err();

    assert!(matches!(err, ConfigError::NotAMapping(_)));
}

#[test]
fn test_loading_does_not_modify_default_file() {
    let ws = Workspace::new();
    let before = std::fs::read_to_string(ws.defaults()).unwrap();
    let user = ws.write_override("user.yaml", "sims:\n  random_seed: 7\n");

    ConfigLoader::load(&ws.sources().with_override_file(&user)).unwrap();

    assert_eq!(std::fs::read_to_string(ws.defaults()).unwrap(), before);
}

#[test]
fn test_subsection_lookup_by_path() {
    let ws = Workspace::new();
    let config = ConfigLoader::load_defaults_only(ws.defaults()).unwrap();

    let rc = config
        .value()
        .get_path(&SubsectionPath::new(["plotting", "rcParams"]))
        .unwrap();

    // rcParams keys contain dots themselves
    let keys: Vec<&String> = rc.as_map().unwrap().keys().collect();
    assert_eq!(keys, vec!["font.size"]);
}
