//! Workflow domain: run layout, stage catalogue and the run session that
//! sequences snapshot read, flag computation and snapshot write.

pub mod layout;
pub mod session;
pub mod stages;

pub use layout::{RunLayout, DEFAULT_RESULTS_DIR};
pub use session::{PreparedRun, RunSession, SessionRequest, StageFlags, StageStatus};
pub use stages::{pipeline_stages, stage_names, Stage};
