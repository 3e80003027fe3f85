// sentinel-core/src/application/mod.rs

pub mod batch;
pub mod orchestrator;

pub use batch::{EntityJob, run_entities};
pub use orchestrator::{QualityOrchestrator, QualityReport, Stage, StageFailure};
