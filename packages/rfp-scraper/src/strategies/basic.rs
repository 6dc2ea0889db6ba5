//! Tier 3: one plain GET, no retries. Last resort.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::{http_client, page_result, parse_url, scraped_at};
use crate::error::{FetchError, FetchResult};
use crate::traits::strategy::{settle, FetchStrategy};
use crate::types::result::ExtractionResult;

const SCRAPER: &str = "basic";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub struct BasicStrategy {
    client: Client,
}

impl BasicStrategy {
    pub fn new(timeout: Duration) -> FetchResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
        })
    }

    async fn try_fetch(&self, url: &str) -> FetchResult<ExtractionResult> {
        parse_url(url)?;
        debug!(url = %url, "Basic fetch starting");

        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                FetchError::from_reqwest(e, url)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, url))?;

        Ok(page_result(url, &final_url, &body)
            .with_meta("scraper", SCRAPER)
            .with_meta("scraped_at", scraped_at())
            .with_meta("description", format!("Scraped content from {url}")))
    }
}

#[async_trait]
impl FetchStrategy for BasicStrategy {
    async fn fetch(&self, url: &str) -> ExtractionResult {
        settle(url, SCRAPER, self.try_fetch(url).await)
    }

    fn name(&self) -> &str {
        SCRAPER
    }
}
