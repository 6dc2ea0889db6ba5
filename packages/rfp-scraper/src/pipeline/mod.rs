//! Extraction pipeline.

mod orchestrator;

pub use orchestrator::{
    Orchestrator, OrchestratorBuilder, CANCELLED_MESSAGE, LOW_QUALITY_WARNING,
};
