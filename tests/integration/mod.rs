//! Integration tests for the LGSM workflow configuration layer

mod config_merging;
mod run_sessions;
mod test_utils;
