//! Tiered Web-Content Extraction for Procurement Pages
//!
//! Turns a government-procurement URL into clean structured text (headings,
//! paragraphs, lists, links, forms, tables, images), falling back through
//! progressively cheaper fetch tiers until one produces content good enough
//! to hand to downstream analysis.
//!
//! # Tiers
//!
//! 1. SAM.gov opportunity API lookup (sam.gov URLs only)
//! 2. Remote headless-browser render
//! 3. Browser-like HTTP fetch with user-agent rotation and retries
//! 4. Single plain HTTP GET
//!
//! After each tier the result is scored HIGH / MEDIUM / LOW; the first HIGH
//! or MEDIUM result wins.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rfp_scraper::{MemoryAttemptLog, Orchestrator, ScraperConfig};
//!
//! let config = ScraperConfig::from_env()?;
//! let log = Arc::new(MemoryAttemptLog::with_capacity(config.attempt_log_capacity));
//! let orchestrator = Orchestrator::from_config(&config, log.clone())?;
//!
//! let result = orchestrator.extract("https://example.gov/rfp/123").await;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! ```
//!
//! # Modules
//!
//! - [`html`] - Regex-driven HTML content extractor
//! - [`barrier`] - Login-wall / CAPTCHA / bot-check detection
//! - [`quality`] - Content-quality scoring
//! - [`strategies`] - The fetch tiers
//! - [`pipeline`] - Tier orchestration
//! - [`stores`] - Attempt-log implementations
//! - [`security`] - Credential handling
//! - [`testing`] - Scripted strategy for tests

pub mod barrier;
pub mod config;
pub mod error;
pub mod html;
pub mod pipeline;
pub mod quality;
pub mod security;
pub mod stores;
pub mod strategies;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use barrier::{detect_barrier, BarrierCheck, BarrierKind};
pub use config::{ExtractionMode, ScraperConfig};
pub use error::{BrowserServiceError, ConfigError, FetchError};
pub use pipeline::{Orchestrator, OrchestratorBuilder};
pub use quality::{QualityLabel, QualityThresholds};
pub use security::{SecretString, ServiceCredentials};
pub use stores::{AttemptStats, MemoryAttemptLog, ScraperStats};
pub use strategies::{
    BasicStrategy, BrowserStrategy, EnhancedStrategy, FixtureStrategy, SamGovStrategy,
};
pub use traits::{
    attempt_log::{AttemptLog, NoopAttemptLog},
    strategy::FetchStrategy,
};
pub use types::{
    attempt::AttemptRecord,
    result::{
        ContentList, ExtractionContent, ExtractionResult, ExtractionStatus, Form, FormInput,
        Heading, Image, Link, ListKind, Statistics, Table, TextContent,
    },
};
