//! Attempt-log implementations.

pub mod memory;

pub use memory::{AttemptStats, MemoryAttemptLog, ScraperStats};
