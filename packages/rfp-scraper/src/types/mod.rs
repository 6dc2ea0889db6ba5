//! Data types produced by the tiers and the orchestrator.

pub mod attempt;
pub mod result;
