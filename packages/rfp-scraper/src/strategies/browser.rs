//! Tier 1: render the page in a remote headless browser.
//!
//! Posts a small script to the browser service's function endpoint. The
//! script navigates, waits for the network to go idle plus a fixed settle
//! delay, tries a "continue as guest" click, and returns the rendered DOM.
//! The service may answer with raw HTML, a JSON wrapper around the HTML, or
//! a pre-structured extraction payload; all three are handled.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{http_client, page_result, parse_url, scraped_at};
use crate::error::{BrowserServiceError, FetchError, FetchResult};
use crate::html::{build_image, build_link};
use crate::security::ServiceCredentials;
use crate::traits::strategy::{settle, FetchStrategy};
use crate::types::result::{
    ContentList, ExtractionContent, ExtractionResult, Form, Heading, Table, TextContent,
};

/// Hosted browser service.
pub const DEFAULT_ENDPOINT: &str = "https://production-sfo.browserless.io";

const SCRAPER: &str = "browserql";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const NAVIGATION_TIMEOUT_MS: u64 = 45_000;
const SETTLE_DELAY_MS: u64 = 2_000;

const MINIMAL_CONTENT_CHARS: usize = 100;
const RICH_CONTENT_CHARS: usize = 1_000;

// Placeholders are substituted with JSON literals before sending.
const RENDER_SCRIPT: &str = r#"export default async ({ page }) => {
  await page.setUserAgent(__USER_AGENT__);
  await page.setViewport({ width: 1366, height: 768 });
  await page.goto(__TARGET_URL__, { waitUntil: 'networkidle2', timeout: __NAV_TIMEOUT__ });
  await new Promise((r) => setTimeout(r, __SETTLE_MS__));

  try {
    const clicked = await page.evaluate(() => {
      const candidates = Array.from(document.querySelectorAll('button, a, [role="button"]'));
      const target = candidates.find((el) =>
        /continue as guest|guest access|skip|continue without/i.test(el.textContent || '')
      );
      if (!target) return false;
      target.click();
      return true;
    });
    if (clicked) {
      await page.waitForNetworkIdle({ timeout: 5000 }).catch(() => {});
    }
  } catch (e) {}

  return {
    data: {
      finalUrl: page.url(),
      title: await page.title(),
      html: await page.content(),
    },
    type: 'application/json',
  };
};"#;

/// Response body when the service returns JSON.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BrowserPayload {
    final_url: Option<String>,
    title: Option<String>,
    /// Rendered DOM, when the script returned markup
    html: Option<String>,
    full_text: Option<String>,
    headings: Vec<Heading>,
    paragraphs: Vec<String>,
    lists: Vec<ContentList>,
    links: Vec<PayloadLink>,
    forms: Vec<Form>,
    images: Vec<PayloadImage>,
    tables: Vec<Table>,
}

/// Link as reported by the page script. Resolution is redone locally.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PayloadLink {
    text: String,
    href: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PayloadImage {
    src: String,
    alt: String,
}

impl BrowserPayload {
    fn into_result(self, url: &str) -> ExtractionResult {
        let final_url = self
            .final_url
            .as_deref()
            .and_then(|u| Url::parse(u).ok())
            .or_else(|| Url::parse(url).ok());

        if let (Some(markup), Some(base)) = (self.html.as_deref(), final_url.as_ref()) {
            let mut result = page_result(url, base, markup);
            if let Some(title) = self.title.filter(|t| !t.trim().is_empty()) {
                result.title = Some(title.trim().to_string());
            }
            return result;
        }

        let full_text = self
            .full_text
            .unwrap_or_default()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let content = ExtractionContent {
            text: TextContent {
                full_text,
                headings: self.headings,
                paragraphs: self.paragraphs,
                lists: self.lists,
            },
            links: final_url
                .as_ref()
                .map(|base| {
                    self.links
                        .iter()
                        .filter_map(|l| build_link(l.href.trim(), &l.text, base))
                        .collect()
                })
                .unwrap_or_default(),
            forms: self.forms,
            images: final_url
                .as_ref()
                .map(|base| {
                    self.images
                        .iter()
                        .filter_map(|i| build_image(i.src.trim(), &i.alt, base))
                        .collect()
                })
                .unwrap_or_default(),
            tables: self.tables,
        };

        ExtractionResult::success(
            url,
            final_url
                .map(|u| u.to_string())
                .unwrap_or_else(|| url.to_string()),
            self.title.filter(|t| !t.trim().is_empty()),
            content,
        )
    }
}

/// Browser-automation tier.
///
/// Without an API key every fetch returns a missing-credentials error
/// result, so the orchestrator moves straight on to the HTTP tiers.
pub struct BrowserStrategy {
    client: Client,
    credentials: ServiceCredentials,
}

impl BrowserStrategy {
    pub fn new(credentials: ServiceCredentials, timeout: Duration) -> FetchResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            credentials,
        })
    }

    fn script_for(url: &str) -> FetchResult<String> {
        Ok(RENDER_SCRIPT
            .replace("__USER_AGENT__", &serde_json::to_string(BROWSER_USER_AGENT)?)
            .replace("__TARGET_URL__", &serde_json::to_string(url)?)
            .replace("__NAV_TIMEOUT__", &NAVIGATION_TIMEOUT_MS.to_string())
            .replace("__SETTLE_MS__", &SETTLE_DELAY_MS.to_string()))
    }

    fn endpoint_label(&self) -> String {
        Url::parse(&self.credentials.endpoint)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| self.credentials.endpoint.clone())
    }

    async fn try_fetch(&self, url: &str) -> FetchResult<ExtractionResult> {
        let api_key = self
            .credentials
            .api_key
            .as_ref()
            .ok_or(FetchError::MissingCredentials {
                service: "browser service",
                variable: "BROWSERLESS_API_KEY",
            })?;

        parse_url(url)?;
        let endpoint = format!("{}/function", self.credentials.endpoint.trim_end_matches('/'));
        debug!(url = %url, endpoint = %endpoint, "Browser render starting");

        let response = self
            .client
            .post(&endpoint)
            .query(&[("token", api_key.expose())])
            .header("Content-Type", "application/javascript")
            .header("Cache-Control", "no-cache")
            .body(Self::script_for(url)?)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = BrowserServiceError::from_status(status.as_u16(), &body);
            warn!(url = %url, status = status.as_u16(), error = %err, "Browser service rejected request");
            return Err(err.into());
        }

        let is_json = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, url))?;

        let result = if is_json {
            serde_json::from_str::<BrowserPayload>(&body)?.into_result(url)
        } else {
            page_result(url, &parse_url(url)?, &body)
        };

        let text_length = result.text_length();
        info!(
            url = %url,
            text_length,
            links = result.link_count(),
            headings = result.heading_count(),
            "Browser render complete"
        );

        let mut result = result
            .with_meta("scraper", SCRAPER)
            .with_meta("scraped_at", scraped_at())
            .with_meta("user_agent", BROWSER_USER_AGENT)
            .with_meta("content_length", text_length.to_string())
            .with_meta("endpoint", self.endpoint_label());

        if text_length < MINIMAL_CONTENT_CHARS {
            result = result.with_meta(
                "warning",
                "minimal content extracted - possible authentication barrier or dynamic loading",
            );
        } else if text_length > RICH_CONTENT_CHARS {
            result = result.with_meta("quality", "high");
        }

        Ok(result)
    }
}

#[async_trait]
impl FetchStrategy for BrowserStrategy {
    async fn fetch(&self, url: &str) -> ExtractionResult {
        settle(url, SCRAPER, self.try_fetch(url).await)
    }

    fn name(&self) -> &str {
        SCRAPER
    }
}
