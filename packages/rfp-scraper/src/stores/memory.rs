//! In-memory attempt log.
//!
//! Keeps the most recent attempts in a capped ring buffer. Useful for
//! interactive debugging and the CLI's stats command; nothing survives a
//! restart.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::traits::attempt_log::AttemptLog;
use crate::types::attempt::AttemptRecord;

/// Default number of attempts retained.
pub const DEFAULT_CAPACITY: usize = 10;

pub struct MemoryAttemptLog {
    records: Mutex<VecDeque<AttemptRecord>>,
    capacity: usize,
}

impl Default for MemoryAttemptLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAttemptLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a log retaining at most `capacity` attempts (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lock the buffer, recovering from a poisoned mutex rather than
    /// propagating the panic.
    fn lock(&self) -> MutexGuard<'_, VecDeque<AttemptRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| {
            warn!("Attempt log mutex poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Snapshot of retained attempts, oldest first.
    pub fn recent(&self) -> Vec<AttemptRecord> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Aggregate stats over attempts newer than `window`.
    pub fn stats(&self, window: Duration) -> AttemptStats {
        let since = Utc::now()
            .checked_sub_signed(window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.stats_since(since)
    }

    /// Aggregate stats over attempts at or after `since`.
    pub fn stats_since(&self, since: DateTime<Utc>) -> AttemptStats {
        let records = self.lock();
        AttemptStats::from_records(records.iter().filter(|r| r.timestamp() >= since))
    }
}

impl AttemptLog for MemoryAttemptLog {
    fn record(&self, attempt: AttemptRecord) {
        debug!(
            url = %attempt.url(),
            scraper = %attempt.scraper_type(),
            success = attempt.success(),
            content_length = attempt.content_length(),
            duration_ms = attempt.duration_ms(),
            error = ?attempt.error(),
            "Extraction attempt recorded"
        );

        let mut records = self.lock();
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(attempt);
    }
}

/// Per-scraper-type aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScraperStats {
    pub attempts: usize,
    pub successes: usize,
    /// Percentage, 0.0..=100.0
    pub success_rate: f64,
    pub average_duration_ms: f64,
}

/// Success-rate and latency summary over a set of attempts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttemptStats {
    pub total_attempts: usize,
    pub successful_attempts: usize,
    pub average_duration_ms: f64,
    pub by_scraper: BTreeMap<String, ScraperStats>,
}

impl AttemptStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AttemptRecord>) -> Self {
        let mut stats = AttemptStats::default();
        let mut total_duration: u64 = 0;
        let mut durations: BTreeMap<String, u64> = BTreeMap::new();

        for record in records {
            stats.total_attempts += 1;
            total_duration = total_duration.saturating_add(record.duration_ms());

            let entry = stats
                .by_scraper
                .entry(record.scraper_type().to_string())
                .or_default();
            entry.attempts += 1;
            *durations.entry(record.scraper_type().to_string()).or_default() += record.duration_ms();

            if record.success() {
                stats.successful_attempts += 1;
                entry.successes += 1;
            }
        }

        if stats.total_attempts > 0 {
            stats.average_duration_ms = total_duration as f64 / stats.total_attempts as f64;
        }

        for (scraper, entry) in stats.by_scraper.iter_mut() {
            let attempts = entry.attempts as f64;
            entry.success_rate = entry.successes as f64 / attempts * 100.0;
            entry.average_duration_ms =
                durations.get(scraper).copied().unwrap_or(0) as f64 / attempts;
        }

        stats
    }
}
