//! Fetch strategies, one per pipeline tier.
//!
//! Ordered from most capable to cheapest:
//!
//! - `SamGovStrategy` - opportunity-database API lookup (sam.gov URLs only)
//! - `BrowserStrategy` - remote headless browser render
//! - `EnhancedStrategy` - browser-like HTTP fetch with rotation and retries
//! - `BasicStrategy` - single plain GET
//!
//! `FixtureStrategy` serves canned pages for demo mode and tests.

mod basic;
mod browser;
mod enhanced;
mod fixture;
mod sam_gov;

pub use basic::BasicStrategy;
pub use browser::{BrowserStrategy, DEFAULT_ENDPOINT as DEFAULT_BROWSER_ENDPOINT};
pub use enhanced::{EnhancedStrategy, USER_AGENTS};
pub use fixture::{FixtureStrategy, SAMPLE_RFP_HTML};
pub use sam_gov::{extract_notice_id, SamGovStrategy, DEFAULT_API_URL as DEFAULT_SAM_GOV_API_URL};

pub use crate::traits::strategy::FetchStrategy;

use chrono::Utc;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::html;
use crate::types::result::ExtractionResult;

pub(crate) fn http_client(timeout: Duration) -> FetchResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| FetchError::Http(Box::new(e)))
}

pub(crate) fn parse_url(url: &str) -> FetchResult<Url> {
    Url::parse(url).map_err(|_| FetchError::InvalidUrl {
        url: url.to_string(),
    })
}

pub(crate) fn scraped_at() -> String {
    Utc::now().to_rfc3339()
}

/// Run the HTML extractor over a fetched page, resolving against `final_url`.
pub(crate) fn page_result(url: &str, final_url: &Url, body: &str) -> ExtractionResult {
    let content = html::extract(body, final_url.as_str());
    ExtractionResult::success(url, final_url.as_str(), html::extract_title(body), content)
}
