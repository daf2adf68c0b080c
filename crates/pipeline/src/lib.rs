//! Lighting pipeline orchestration.
//!
//! Composes job submission and polling into the variant and mask stages,
//! the optional location recommendation step, and the result handoff.

pub mod config;
pub mod error;
pub mod handoff;
pub mod orchestrator;
pub mod recommend;
pub mod stage;

pub use config::PipelineConfig;
pub use error::{PipelineError, Stage};
pub use handoff::{Continuation, JsonFileHandoff, ResultHandoff};
pub use orchestrator::PipelineOrchestrator;
pub use recommend::LocationRecommender;
pub use stage::{Settle, StagePolicy};
