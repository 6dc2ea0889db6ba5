//! Audit record for a single tier invocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::result::ExtractionResult;

/// One tier invocation, as written to the attempt log.
///
/// Fields are private; a record is built once and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    id: Uuid,
    url: String,
    scraper_type: String,
    success: bool,
    content_length: usize,
    duration_ms: u64,
    error: Option<String>,
    timestamp: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn new(
        url: impl Into<String>,
        scraper_type: impl Into<String>,
        success: bool,
        content_length: usize,
        duration: Duration,
        error: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            url: url.into(),
            scraper_type: scraper_type.into(),
            success,
            content_length,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            error,
            timestamp: Utc::now(),
        }
    }

    /// Build the record for a tier that returned `result` after `duration`.
    pub fn from_result(scraper_type: &str, result: &ExtractionResult, duration: Duration) -> Self {
        Self::new(
            result.url.clone(),
            scraper_type,
            result.is_success(),
            result.text_length(),
            duration,
            result.error_message().map(str::to_string),
        )
    }

    /// Override the timestamp (backfills and tests).
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn scraper_type(&self) -> &str {
        &self.scraper_type
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn content_length(&self) -> usize {
        self.content_length
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
