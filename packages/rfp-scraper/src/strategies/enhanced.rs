//! Tier 2: browser-like HTTP fetch with retries.
//!
//! Each attempt uses the next user agent from a fixed pool and a full set of
//! navigation headers. Non-success statuses, transport errors, detected
//! barriers and near-empty pages are retried with a linearly growing delay.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{http_client, page_result, parse_url, scraped_at};
use crate::barrier::detect_barrier;
use crate::error::{FetchError, FetchResult};
use crate::html;
use crate::traits::strategy::{settle, FetchStrategy};
use crate::types::result::ExtractionResult;

const SCRAPER: &str = "enhanced";

/// Pages with less text than this are retried while attempts remain.
const RETRY_BELOW_CHARS: usize = 100;

/// Characters of page text quoted in barrier errors.
const BARRIER_PREVIEW_CHARS: usize = 150;

/// Rotated per attempt.
pub const USER_AGENTS: [&str; 6] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Agent for the 1-based `attempt` of a fetch that started at `start`.
fn user_agent_for(start: usize, attempt: u32) -> &'static str {
    USER_AGENTS[start.wrapping_add(attempt as usize - 1) % USER_AGENTS.len()]
}

/// What one attempt produced.
enum Attempt {
    /// Usable page
    Page(ExtractionResult),
    /// Worth another try; carries the reason in case this was the last one
    Retry(FetchError),
}

pub struct EnhancedStrategy {
    client: Client,
    max_attempts: u32,
    backoff: Duration,
    next_agent: AtomicUsize,
}

impl EnhancedStrategy {
    /// Three attempts, 1s base backoff.
    pub fn new(timeout: Duration) -> FetchResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            max_attempts: 3,
            backoff: Duration::from_millis(1000),
            next_agent: AtomicUsize::new(0),
        })
    }

    /// Set the attempt budget (minimum 1).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the base delay. Attempt `n` (n >= 2) waits `n * backoff` first.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Wait before the 1-based `attempt`; none before the first.
    fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            Duration::ZERO
        } else {
            self.backoff.saturating_mul(attempt)
        }
    }

    /// Starting pool offset for one fetch. Concurrent fetches each take
    /// their own offset, so rotation within a fetch never repeats an agent.
    fn rotation_start(&self) -> usize {
        self.next_agent.fetch_add(1, Ordering::Relaxed)
    }

    async fn attempt(
        &self,
        url: &str,
        origin: &str,
        user_agent: &str,
        is_last: bool,
    ) -> Attempt {
        let response = match self
            .client
            .get(url)
            .header("User-Agent", user_agent)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Sec-Fetch-User", "?1")
            .header("Upgrade-Insecure-Requests", "1")
            .header("Referer", origin)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Attempt::Retry(FetchError::from_reqwest(e, url)),
        };

        let status = response.status();
        if !status.is_success() {
            return Attempt::Retry(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let final_url = response.url().clone();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Attempt::Retry(FetchError::from_reqwest(e, url)),
        };

        let text = html::extract_text(&body);
        let check = detect_barrier(&body, &text);
        if let Some(kind) = check.kind {
            warn!(url = %url, reason = %kind, "Access barrier detected");
            return Attempt::Retry(FetchError::Barrier {
                reason: kind.reason().to_string(),
                preview: text.chars().take(BARRIER_PREVIEW_CHARS).collect(),
            });
        }

        let text_length = text.chars().count();
        if text_length < RETRY_BELOW_CHARS && !is_last {
            debug!(url = %url, text_length, "Page nearly empty, retrying");
            return Attempt::Retry(FetchError::InsufficientContent {
                url: final_url.to_string(),
                text_length,
            });
        }

        Attempt::Page(page_result(url, &final_url, &body))
    }

    async fn try_fetch(&self, url: &str) -> FetchResult<ExtractionResult> {
        let parsed: Url = parse_url(url)?;
        let origin = parsed.origin().ascii_serialization();

        let start = self.rotation_start();
        let mut last_error = None;
        for attempt in 1..=self.max_attempts {
            let delay = self.delay_before(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let user_agent = user_agent_for(start, attempt);
            debug!(url = %url, attempt, max = self.max_attempts, "Enhanced fetch attempt");

            match self
                .attempt(url, &origin, user_agent, attempt == self.max_attempts)
                .await
            {
                Attempt::Page(result) => {
                    info!(
                        url = %url,
                        attempt,
                        text_length = result.text_length(),
                        links = result.link_count(),
                        "Enhanced fetch succeeded"
                    );
                    return Ok(result
                        .with_meta("scraper", SCRAPER)
                        .with_meta("user-agent", user_agent)
                        .with_meta("scraped_at", scraped_at())
                        .with_meta("attempts", attempt.to_string()));
                }
                Attempt::Retry(err) => {
                    warn!(url = %url, attempt, error = %err, "Enhanced fetch attempt failed");
                    last_error = Some(err);
                }
            }
        }

        Err(match last_error {
            Some(barrier @ FetchError::Barrier { .. }) => barrier,
            Some(err) => FetchError::Exhausted {
                attempts: self.max_attempts,
                source: Box::new(err),
            },
            None => FetchError::InvalidUrl {
                url: url.to_string(),
            },
        })
    }
}

#[async_trait]
impl FetchStrategy for EnhancedStrategy {
    async fn fetch(&self, url: &str) -> ExtractionResult {
        settle(url, SCRAPER, self.try_fetch(url).await)
    }

    fn name(&self) -> &str {
        SCRAPER
    }
}
