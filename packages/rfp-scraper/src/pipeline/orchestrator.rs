//! Tier orchestration: try each tier in order, stop at the first result the
//! quality gate accepts.
//!
//! ```text
//! START -> [sam-gov-api if applicable] -> browserql -> enhanced -> basic -> DONE
//! ```
//!
//! Every tier attempt is written to the attempt log. Tiers never fail, so
//! the control flow is plain branching on the returned result.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{ExtractionMode, ScraperConfig};
use crate::error::{FetchError, FetchResult};
use crate::quality::{QualityLabel, QualityThresholds};
use crate::strategies::{
    BasicStrategy, BrowserStrategy, EnhancedStrategy, FixtureStrategy, SamGovStrategy,
};
use crate::traits::attempt_log::{AttemptLog, NoopAttemptLog};
use crate::traits::strategy::FetchStrategy;
use crate::types::attempt::AttemptRecord;
use crate::types::result::ExtractionResult;

/// Message on the result returned after cancellation.
pub const CANCELLED_MESSAGE: &str = "extraction cancelled";

/// Attached to a sub-threshold result returned after every tier was tried.
pub const LOW_QUALITY_WARNING: &str = "low content quality";

/// Drives the tiers for one URL at a time. Holds no per-run state, so a
/// single instance can serve concurrent extractions.
pub struct Orchestrator {
    tiers: Vec<Arc<dyn FetchStrategy>>,
    attempt_log: Arc<dyn AttemptLog>,
    thresholds: QualityThresholds,
    deadline: Option<Duration>,
}

/// How a single tier run ended.
enum TierRun {
    Finished(ExtractionResult),
    OutOfTime(ExtractionResult),
    Cancelled,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Build the standard tier stack for `config`.
    ///
    /// Live mode runs the SAM.gov lookup, browser, enhanced and basic tiers;
    /// demo mode runs the fixture tier alone.
    pub fn from_config(
        config: &ScraperConfig,
        attempt_log: Arc<dyn AttemptLog>,
    ) -> FetchResult<Self> {
        let mut builder = Self::builder()
            .thresholds(config.quality)
            .attempt_log_arc(attempt_log);
        if let Some(deadline) = config.deadline {
            builder = builder.deadline(deadline);
        }

        builder = match config.mode {
            ExtractionMode::Demo => builder.tier(FixtureStrategy::new()),
            ExtractionMode::Live => builder
                .tier(SamGovStrategy::new(config.sam_gov.clone(), config.http_timeout)?)
                .tier(BrowserStrategy::new(config.browser.clone(), config.browser_timeout)?)
                .tier(
                    EnhancedStrategy::new(config.http_timeout)?
                        .with_max_attempts(config.enhanced_max_attempts)
                        .with_backoff(config.enhanced_backoff),
                )
                .tier(BasicStrategy::new(config.http_timeout)?),
        };

        Ok(builder.build())
    }

    /// Tier names in the order they are tried.
    pub fn tier_names(&self) -> Vec<&str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    pub fn thresholds(&self) -> QualityThresholds {
        self.thresholds
    }

    /// Extract `url`, falling back through the tiers.
    pub async fn extract(&self, url: &str) -> ExtractionResult {
        self.extract_with_cancel(url, CancellationToken::new()).await
    }

    /// Like [`extract`](Self::extract), abandoning the in-flight tier as soon
    /// as `cancel` fires.
    pub async fn extract_with_cancel(&self, url: &str, cancel: CancellationToken) -> ExtractionResult {
        let started = Instant::now();
        info!(url = %url, tiers = ?self.tier_names(), "Extraction starting");

        let mut attempted: Vec<String> = Vec::new();
        let mut last_success: Option<(String, ExtractionResult)> = None;
        let mut out_of_time = false;

        for tier in &self.tiers {
            let name = tier.name().to_string();
            if !tier.applies_to(url) {
                debug!(url = %url, tier = %name, "Tier not applicable, skipping");
                continue;
            }

            let remaining = match self.deadline {
                Some(deadline) => match deadline.checked_sub(started.elapsed()) {
                    Some(left) if !left.is_zero() => Some(left),
                    _ => {
                        out_of_time = true;
                        break;
                    }
                },
                None => None,
            };

            debug!(url = %url, tier = %name, "Trying tier");
            let tier_started = Instant::now();
            let run = self
                .run_tier(tier.as_ref(), url, remaining, &cancel, started)
                .await;

            let (result, timed_out) = match run {
                TierRun::Finished(result) => (result, false),
                TierRun::OutOfTime(result) => (result, true),
                TierRun::Cancelled => {
                    self.log_attempt(AttemptRecord::new(
                        url,
                        name.as_str(),
                        false,
                        0,
                        tier_started.elapsed(),
                        Some(CANCELLED_MESSAGE.to_string()),
                    ));
                    warn!(url = %url, tier = %name, "Extraction cancelled");
                    return ExtractionResult::error(url, CANCELLED_MESSAGE);
                }
            };

            self.log_attempt(AttemptRecord::from_result(
                &name,
                &result,
                tier_started.elapsed(),
            ));

            if result.is_success() {
                let label = self.thresholds.label(&result);
                if label.is_acceptable() {
                    info!(
                        url = %url,
                        tier = %name,
                        quality = %label,
                        text_length = result.text_length(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Extraction accepted"
                    );
                    return result
                        .with_meta("quality", label.as_str())
                        .with_meta("strategy", name);
                }

                info!(
                    url = %url,
                    tier = %name,
                    text_length = result.text_length(),
                    headings = result.heading_count(),
                    links = result.link_count(),
                    "Result below quality threshold, falling back"
                );
                attempted.push(format!(
                    "{name} (low quality, {} chars)",
                    result.text_length()
                ));
                last_success = Some((name, result));
            } else {
                let error = result.error_message().unwrap_or("unknown error");
                info!(url = %url, tier = %name, error = %error, "Tier failed, falling back");
                attempted.push(format!("{name} ({error})"));
            }

            if timed_out {
                out_of_time = true;
                break;
            }
        }

        self.exhausted(url, attempted, last_success, out_of_time, started)
    }

    /// Hand a record to the attempt log. A sink that panics is reported and
    /// otherwise ignored; it never ends the extraction.
    fn log_attempt(&self, attempt: AttemptRecord) {
        let scraper = attempt.scraper_type().to_string();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.attempt_log.record(attempt)));
        if outcome.is_err() {
            warn!(scraper = %scraper, "Attempt log panicked, record dropped");
        }
    }

    async fn run_tier(
        &self,
        tier: &dyn FetchStrategy,
        url: &str,
        remaining: Option<Duration>,
        cancel: &CancellationToken,
        started: Instant,
    ) -> TierRun {
        let fetch = async {
            match remaining {
                None => TierRun::Finished(tier.fetch(url).await),
                Some(left) => match tokio::time::timeout(left, tier.fetch(url)).await {
                    Ok(result) => TierRun::Finished(result),
                    Err(_) => {
                        let err = FetchError::DeadlineExceeded {
                            elapsed_ms: started.elapsed().as_millis() as u64,
                        };
                        warn!(url = %url, tier = %tier.name(), error = %err, "Tier cut off");
                        TierRun::OutOfTime(
                            ExtractionResult::error(url, err.to_string())
                                .with_meta("scraper", tier.name()),
                        )
                    }
                },
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => TierRun::Cancelled,
            run = fetch => run,
        }
    }

    fn exhausted(
        &self,
        url: &str,
        attempted: Vec<String>,
        last_success: Option<(String, ExtractionResult)>,
        out_of_time: bool,
        started: Instant,
    ) -> ExtractionResult {
        if let Some((name, result)) = last_success.filter(|(_, r)| r.has_content()) {
            warn!(
                url = %url,
                tier = %name,
                text_length = result.text_length(),
                "No tier met the quality threshold, returning best effort"
            );
            return result
                .with_meta("warning", LOW_QUALITY_WARNING)
                .with_meta("quality", QualityLabel::Low.as_str())
                .with_meta("strategy", name);
        }

        let mut message = if attempted.is_empty() {
            "All extraction strategies exhausted: no strategy was attempted".to_string()
        } else {
            format!(
                "All extraction strategies exhausted. Attempted: {}",
                attempted.join("; ")
            )
        };
        if out_of_time {
            if let Some(deadline) = self.deadline {
                message.push_str(&format!(
                    ". Extraction deadline of {}s exceeded",
                    deadline.as_secs_f64()
                ));
            }
        }

        warn!(
            url = %url,
            elapsed_ms = started.elapsed().as_millis() as u64,
            error = %message,
            "Extraction failed"
        );
        ExtractionResult::error(url, message)
    }
}

/// Builder for [`Orchestrator`]. Tiers run in the order they are added.
#[derive(Default)]
pub struct OrchestratorBuilder {
    tiers: Vec<Arc<dyn FetchStrategy>>,
    attempt_log: Option<Arc<dyn AttemptLog>>,
    thresholds: QualityThresholds,
    deadline: Option<Duration>,
}

impl OrchestratorBuilder {
    pub fn tier(mut self, tier: impl FetchStrategy + 'static) -> Self {
        self.tiers.push(Arc::new(tier));
        self
    }

    pub fn tier_arc(mut self, tier: Arc<dyn FetchStrategy>) -> Self {
        self.tiers.push(tier);
        self
    }

    pub fn attempt_log(self, log: impl AttemptLog + 'static) -> Self {
        self.attempt_log_arc(Arc::new(log))
    }

    pub fn attempt_log_arc(mut self, log: Arc<dyn AttemptLog>) -> Self {
        self.attempt_log = Some(log);
        self
    }

    pub fn thresholds(mut self, thresholds: QualityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Wall-clock budget for a whole run.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn build(self) -> Orchestrator {
        Orchestrator {
            tiers: self.tiers,
            attempt_log: self
                .attempt_log
                .unwrap_or_else(|| Arc::new(NoopAttemptLog)),
            thresholds: self.thresholds,
            deadline: self.deadline,
        }
    }
}
