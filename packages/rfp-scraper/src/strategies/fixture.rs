//! Canned pages for demo mode and tests. Never touches the network.

use async_trait::async_trait;
use std::collections::HashMap;

use super::{page_result, parse_url};
use crate::error::FetchResult;
use crate::traits::strategy::{settle, FetchStrategy};
use crate::types::result::ExtractionResult;

const SCRAPER: &str = "fixture";

/// Served for any URL without a registered page.
pub const SAMPLE_RFP_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>RFP 2024-017: Citywide Network Modernization</title></head>
<body>
<nav><a href="/">Home</a> <a href="/bids">Open Bids</a></nav>
<main>
<h1>Request for Proposal 2024-017: Citywide Network Modernization</h1>
<p>The City Department of Information Technology invites qualified vendors to submit proposals for the design, procurement, installation and support of a modernized wide-area network connecting municipal facilities.</p>
<h2>Scope of Work</h2>
<p>The selected contractor will replace aging edge routers at forty-two sites, deploy redundant fiber links between the primary and secondary data centers, and provide managed monitoring for a period of five years following acceptance.</p>
<ul>
<li>Site surveys and a detailed migration plan for every facility</li>
<li>Hardware procurement, staging and configuration</li>
<li>Cutover scheduling that avoids disruption to emergency services</li>
<li>Training for city network operations staff</li>
</ul>
<h2>Submission Requirements</h2>
<p>Proposals must include a technical approach, a staffing plan with resumes of key personnel, three references from public-sector clients of similar size, and a cost proposal submitted in a separate sealed envelope.</p>
<ol>
<li>Technical approach (maximum 30 pages)</li>
<li>Management and staffing plan</li>
<li>Past performance references</li>
<li>Cost proposal</li>
</ol>
<h2>Key Dates</h2>
<table>
<tr><th>Milestone</th><th>Date</th></tr>
<tr><td>Pre-proposal conference</td><td>March 4, 2024</td></tr>
<tr><td>Questions due</td><td>March 11, 2024</td></tr>
<tr><td>Proposals due</td><td>April 1, 2024 at 2:00 PM</td></tr>
</table>
<h2>Evaluation</h2>
<p>Proposals will be evaluated on technical merit (40 points), qualifications and past performance (30 points), and price (30 points). The city reserves the right to request oral presentations from the highest-ranked offerors before making an award.</p>
<p>Questions about this solicitation should be directed to the procurement officer listed below. Contact with other city staff regarding this solicitation during the procurement period may result in disqualification.</p>
<p>Download the complete solicitation package and attachments: <a href="/bids/2024-017/solicitation.pdf">Solicitation package (PDF)</a></p>
<img src="/images/city-seal.png" alt="City seal">
</main>
<footer><p>City Procurement Office, 100 Main Street, Room 210</p></footer>
</body>
</html>"#;

/// Serves registered HTML per URL, or [`SAMPLE_RFP_HTML`] by default,
/// through the regular HTML extractor.
#[derive(Debug, Clone)]
pub struct FixtureStrategy {
    pages: HashMap<String, String>,
    default_html: String,
}

impl Default for FixtureStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureStrategy {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            default_html: SAMPLE_RFP_HTML.to_string(),
        }
    }

    /// Register the page served for `url`.
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// Replace the page served for unregistered URLs.
    pub fn with_default(mut self, html: impl Into<String>) -> Self {
        self.default_html = html.into();
        self
    }

    fn try_fetch(&self, url: &str) -> FetchResult<ExtractionResult> {
        let base = parse_url(url)?;
        let html = self.pages.get(url).unwrap_or(&self.default_html);
        Ok(page_result(url, &base, html).with_meta("scraper", SCRAPER))
    }
}

#[async_trait]
impl FetchStrategy for FixtureStrategy {
    async fn fetch(&self, url: &str) -> ExtractionResult {
        settle(url, SCRAPER, self.try_fetch(url))
    }

    fn name(&self) -> &str {
        SCRAPER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::{QualityLabel, QualityThresholds};

    #[tokio::test]
    async fn test_sample_page_is_high_quality() {
        let result = FixtureStrategy::new()
            .fetch("https://demo.example.gov/rfp/2024-017")
            .await;

        assert!(result.is_success());
        assert_eq!(result.scraper(), Some("fixture"));
        assert_eq!(
            QualityThresholds::default().label(&result),
            QualityLabel::High
        );

        let content = result.content().unwrap();
        assert_eq!(content.tables.len(), 1);
        assert_eq!(content.tables[0].total_rows, 3);
        assert_eq!(
            content.links.last().unwrap().absolute_url,
            "https://demo.example.gov/bids/2024-017/solicitation.pdf"
        );
    }

    #[tokio::test]
    async fn test_registered_page() {
        let strategy = FixtureStrategy::new()
            .with_page("https://example.gov/a", "<h1>Page A</h1><p>short</p>");
        let result = strategy.fetch("https://example.gov/a").await;
        assert_eq!(result.heading_count(), 1);
        assert_eq!(result.content().unwrap().text.full_text, "Page A short");
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let result = FixtureStrategy::new().fetch("::").await;
        assert!(!result.is_success());
        assert_eq!(result.scraper(), Some("fixture"));
    }
}
