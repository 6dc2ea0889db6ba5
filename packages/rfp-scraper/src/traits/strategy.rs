//! Fetch-strategy trait: one tier of the extraction pipeline.
//!
//! Every tier turns a URL into an [`ExtractionResult`]. Tiers never return
//! `Err`; failures come back as error-status results so the orchestrator's
//! control flow is plain branching on data.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rfp_scraper::traits::strategy::FetchStrategy;
//!
//! let result = strategy.fetch("https://example.gov/rfp/123").await;
//! if result.is_success() { /* ... */ }
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::FetchResult;
use crate::types::result::ExtractionResult;

#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Fetch and extract `url`. Never fails; see module docs.
    async fn fetch(&self, url: &str) -> ExtractionResult;

    /// Whether this tier should be tried for `url` at all.
    ///
    /// Only the opportunity-database tier is selective.
    fn applies_to(&self, _url: &str) -> bool {
        true
    }

    /// Tier name, used as `meta.scraper` and as the attempt-log scraper type.
    fn name(&self) -> &str;
}

#[async_trait]
impl<S: FetchStrategy + ?Sized> FetchStrategy for Arc<S> {
    async fn fetch(&self, url: &str) -> ExtractionResult {
        (**self).fetch(url).await
    }

    fn applies_to(&self, url: &str) -> bool {
        (**self).applies_to(url)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Fold a fallible tier run into the never-failing contract.
pub(crate) fn settle(url: &str, scraper: &str, outcome: FetchResult<ExtractionResult>) -> ExtractionResult {
    match outcome {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(url = %url, scraper = %scraper, error = %e, "Tier failed");
            ExtractionResult::error(url, e.to_string()).with_meta("scraper", scraper)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    #[test]
    fn test_settle_maps_error() {
        let result = settle(
            "https://example.gov",
            "basic",
            Err(FetchError::Status {
                status: 503,
                url: "https://example.gov".to_string(),
            }),
        );
        assert!(!result.is_success());
        assert_eq!(result.scraper(), Some("basic"));
        assert_eq!(
            result.error_message(),
            Some("HTTP 503 for https://example.gov")
        );
    }
}
