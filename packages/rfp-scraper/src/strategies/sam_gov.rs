//! Tier 0: direct lookup in the SAM.gov opportunities API.
//!
//! Only applies to sam.gov URLs that carry a notice identifier. The record
//! comes back as JSON, so no HTML extraction happens here; headings, text
//! and links are synthesized from the record.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{http_client, parse_url};
use crate::error::{FetchError, FetchResult};
use crate::html::resolve_url;
use crate::security::ServiceCredentials;
use crate::traits::strategy::{settle, FetchStrategy};
use crate::types::result::{ExtractionContent, ExtractionResult, Heading, Link, TextContent};

/// Public search endpoint.
pub const DEFAULT_API_URL: &str = "https://api.sam.gov/opportunities/v2/search";

const USER_AGENT: &str = "RFP-Analysis-Tool/1.0";
const SCRAPER: &str = "sam-gov-api";

lazy_static! {
    // Tried in order, first capture wins.
    static ref NOTICE_ID_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)/workspace/contract/opp/([a-f0-9-]+)/view").unwrap(),
        Regex::new(r"(?i)/opp(?:ortunities)?/([a-f0-9-]+)").unwrap(),
        Regex::new(r"(?i)/([a-f0-9-]+)/view").unwrap(),
        Regex::new(r"(?i)[?&]noticeId=([a-f0-9-]+)").unwrap(),
    ];
}

/// Pull the opportunity identifier out of a sam.gov URL.
///
/// Returns `None` for other hosts and for sam.gov URLs without an identifier.
pub fn extract_notice_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    if host != "sam.gov" && !host.ends_with(".sam.gov") {
        return None;
    }

    NOTICE_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|id| id.chars().any(|c| c.is_ascii_hexdigit()))
}

// Response types for the opportunities API

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "_embedded")]
    embedded: Option<Embedded>,
    #[serde(rename = "opportunitiesData")]
    opportunities_data: Option<Vec<Opportunity>>,
}

#[derive(Debug, Deserialize)]
struct Embedded {
    #[serde(default)]
    opportunities: Vec<Opportunity>,
}

impl SearchResponse {
    fn into_first(self) -> Option<Opportunity> {
        self.embedded
            .map(|e| e.opportunities)
            .into_iter()
            .chain(self.opportunities_data)
            .flatten()
            .next()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Opportunity {
    notice_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    department: Option<String>,
    sub_tier: Option<String>,
    office: Option<String>,
    posted_date: Option<String>,
    #[serde(rename = "responseDeadLine")]
    response_deadline: Option<String>,
    naics_code: Option<String>,
    classification_code: Option<String>,
    active: Option<String>,
    award: Option<Award>,
    point_of_contact: Option<Vec<Contact>>,
    links: Option<Vec<RecordLink>>,
    ui_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Award {
    amount: Option<serde_json::Value>,
    date: Option<String>,
    award_number: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Contact {
    full_name: Option<String>,
    title: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecordLink {
    rel: Option<String>,
    href: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn json_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string()),
    }
}

impl Opportunity {
    fn is_active(&self) -> bool {
        present(&self.active).is_some_and(|a| a.eq_ignore_ascii_case("yes"))
    }

    fn full_text(&self, title: &str) -> String {
        let mut sections: Vec<String> = vec![title.to_string()];

        let org: Vec<String> = [
            ("Department", &self.department),
            ("Office", &self.office),
            ("Sub-tier", &self.sub_tier),
        ]
        .into_iter()
        .filter_map(|(label, v)| present(v).map(|v| format!("{label}: {v}")))
        .collect();
        if !org.is_empty() {
            sections.push(org.join("\n"));
        }

        if let Some(description) = present(&self.description) {
            sections.push(format!("Description:\n{description}"));
        }

        let codes: Vec<String> = [
            ("NAICS Code", &self.naics_code),
            ("Classification Code", &self.classification_code),
        ]
        .into_iter()
        .filter_map(|(label, v)| present(v).map(|v| format!("{label}: {v}")))
        .collect();
        if !codes.is_empty() {
            sections.push(codes.join("\n"));
        }

        let dates: Vec<String> = [
            ("Posted Date", &self.posted_date),
            ("Response Deadline", &self.response_deadline),
        ]
        .into_iter()
        .filter_map(|(label, v)| present(v).map(|v| format!("{label}: {v}")))
        .collect();
        if !dates.is_empty() {
            sections.push(dates.join("\n"));
        }

        sections.push(format!(
            "Status: {}",
            if self.is_active() { "Active" } else { "Inactive" }
        ));

        for contact in self.point_of_contact.iter().flatten() {
            let name = present(&contact.full_name).unwrap_or("Unknown");
            let mut lines = vec![match present(&contact.title) {
                Some(title) => format!("Contact: {name} ({title})"),
                None => format!("Contact: {name}"),
            }];
            if let Some(email) = present(&contact.email) {
                lines.push(format!("Email: {email}"));
            }
            if let Some(phone) = present(&contact.phone) {
                lines.push(format!("Phone: {phone}"));
            }
            sections.push(lines.join("\n"));
        }

        if let Some(award) = &self.award {
            let mut lines = vec!["Award Information:".to_string()];
            if let Some(amount) = award.amount.as_ref().and_then(json_text) {
                lines.push(format!("Amount: {amount}"));
            }
            if let Some(date) = present(&award.date) {
                lines.push(format!("Date: {date}"));
            }
            if let Some(number) = present(&award.award_number) {
                lines.push(format!("Award Number: {number}"));
            }
            if lines.len() > 1 {
                sections.push(lines.join("\n"));
            }
        }

        sections.join("\n\n")
    }

    fn paragraphs(&self) -> Vec<String> {
        let mut paragraphs = Vec::new();
        if let Some(description) = present(&self.description) {
            paragraphs.push(description.to_string());
        }
        for (label, value) in [
            ("Department", &self.department),
            ("Office", &self.office),
            ("Posted", &self.posted_date),
            ("Deadline", &self.response_deadline),
        ] {
            if let Some(v) = present(value) {
                paragraphs.push(format!("{label}: {v}"));
            }
        }
        paragraphs
    }

    fn links(&self, base: &Url) -> Vec<Link> {
        let base_host = base.host_str().unwrap_or_default();
        self.links
            .iter()
            .flatten()
            .filter_map(|link| {
                let href = present(&link.href)?;
                let absolute = resolve_url(href, base)?;
                Some(Link {
                    text: present(&link.rel).unwrap_or(href).to_string(),
                    href: href.to_string(),
                    is_external: absolute.host_str().unwrap_or_default() != base_host,
                    absolute_url: absolute.to_string(),
                })
            })
            .collect()
    }

    fn into_result(self, url: &str, notice_id: &str) -> ExtractionResult {
        let title = present(&self.title)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Opportunity {notice_id}"));

        let final_url = present(&self.ui_link)
            .and_then(|link| Url::parse(link).ok())
            .or_else(|| Url::parse(url).ok());
        let final_url_str = final_url
            .as_ref()
            .map(|u| u.to_string())
            .unwrap_or_else(|| url.to_string());

        let headings = [
            (1, title.as_str()),
            (2, "Department Information"),
            (2, "Description"),
            (2, "Timeline"),
            (2, "Contact Information"),
        ]
        .into_iter()
        .map(|(level, text)| Heading {
            level,
            text: text.to_string(),
        })
        .collect();

        let content = ExtractionContent {
            text: TextContent {
                full_text: self.full_text(&title),
                headings,
                paragraphs: self.paragraphs(),
                lists: Vec::new(),
            },
            links: final_url.as_ref().map(|u| self.links(u)).unwrap_or_default(),
            ..Default::default()
        };

        let mut result =
            ExtractionResult::success(url, final_url_str, Some(title), content)
                .with_meta("scraper", SCRAPER)
                .with_meta("source", "SAM.gov Public API")
                .with_meta(
                    "notice_id",
                    present(&self.notice_id).unwrap_or(notice_id).to_string(),
                );

        for (key, value) in [
            ("department", &self.department),
            ("naics_code", &self.naics_code),
            ("classification_code", &self.classification_code),
            ("posted_date", &self.posted_date),
            ("deadline", &self.response_deadline),
            ("active", &self.active),
        ] {
            if let Some(v) = present(value) {
                result = result.with_meta(key, v);
            }
        }

        result
    }
}

/// Opportunity-database lookup tier.
///
/// # Example
///
/// ```rust,ignore
/// use rfp_scraper::security::ServiceCredentials;
/// use rfp_scraper::strategies::SamGovStrategy;
///
/// let tier = SamGovStrategy::new(ServiceCredentials::new(DEFAULT_API_URL), timeout)?;
/// let result = tier.fetch("https://sam.gov/opp/05255cc258ae40d2a5af9146663a89c5/view").await;
/// ```
pub struct SamGovStrategy {
    client: Client,
    credentials: ServiceCredentials,
}

impl SamGovStrategy {
    /// `credentials.endpoint` is the full search URL; the key is optional.
    pub fn new(credentials: ServiceCredentials, timeout: Duration) -> FetchResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            credentials,
        })
    }

    async fn lookup(&self, notice_id: &str) -> FetchResult<Opportunity> {
        let endpoint = parse_url(&self.credentials.endpoint)?;

        let mut request = self
            .client
            .get(endpoint)
            .query(&[("noticeid", notice_id), ("limit", "1")])
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT);
        if let Some(key) = &self.credentials.api_key {
            request = request.query(&[("api_key", key.expose())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, &self.credentials.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.credentials.endpoint.clone(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, &self.credentials.endpoint))?;
        let envelope: SearchResponse = serde_json::from_str(&body)?;

        envelope
            .into_first()
            .ok_or_else(|| FetchError::OpportunityNotFound {
                notice_id: notice_id.to_string(),
            })
    }

    async fn try_fetch(&self, url: &str) -> FetchResult<ExtractionResult> {
        let notice_id = extract_notice_id(url).ok_or_else(|| FetchError::NotApplicable {
            url: url.to_string(),
        })?;
        debug!(url = %url, notice_id = %notice_id, "Looking up opportunity");

        let opportunity = self.lookup(&notice_id).await?;
        info!(
            url = %url,
            notice_id = %notice_id,
            title = ?opportunity.title,
            "Opportunity found"
        );

        Ok(opportunity.into_result(url, &notice_id))
    }
}

#[async_trait]
impl FetchStrategy for SamGovStrategy {
    async fn fetch(&self, url: &str) -> ExtractionResult {
        settle(url, SCRAPER, self.try_fetch(url).await)
    }

    fn applies_to(&self, url: &str) -> bool {
        extract_notice_id(url).is_some()
    }

    fn name(&self) -> &str {
        SCRAPER
    }
}
