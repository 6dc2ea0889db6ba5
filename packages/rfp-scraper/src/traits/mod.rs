//! Core trait abstractions.

pub mod attempt_log;
pub mod strategy;
