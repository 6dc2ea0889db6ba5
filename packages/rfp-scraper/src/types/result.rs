//! Extraction result types shared by every tier.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of a single tier attempt or of a whole pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    Success,
    Error,
}

/// A heading in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// 1..=6
    pub level: u8,
    pub text: String,
}

/// Kind of HTML list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Ul,
    Ol,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentList {
    #[serde(rename = "type")]
    pub kind: ListKind,
    pub items: Vec<String>,
}

/// Textual content of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub full_text: String,
    pub headings: Vec<Heading>,
    pub paragraphs: Vec<String>,
    pub lists: Vec<ContentList>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub href: String,
    pub absolute_url: String,
    pub is_external: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInput {
    #[serde(rename = "type")]
    pub input_type: String,
    pub name: String,
    pub placeholder: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    pub action: String,
    pub method: String,
    pub inputs: Vec<FormInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    pub absolute_url: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

/// Structured content produced by the HTML extractor or synthesized by a tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionContent {
    pub text: TextContent,
    pub links: Vec<Link>,
    pub forms: Vec<Form>,
    pub images: Vec<Image>,
    pub tables: Vec<Table>,
}

impl ExtractionContent {
    /// Character count of the full text.
    pub fn text_length(&self) -> usize {
        self.text.full_text.chars().count()
    }

    /// Whether anything at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.text.full_text.trim().is_empty()
            && self.text.headings.is_empty()
            && self.text.paragraphs.is_empty()
            && self.text.lists.is_empty()
            && self.links.is_empty()
            && self.forms.is_empty()
            && self.images.is_empty()
            && self.tables.is_empty()
    }
}

/// Counts derived from [`ExtractionContent`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_links: usize,
    pub total_forms: usize,
    pub total_images: usize,
    pub total_tables: usize,
    pub text_length: usize,
}

impl Statistics {
    pub fn from_content(content: &ExtractionContent) -> Self {
        Self {
            total_links: content.links.len(),
            total_forms: content.forms.len(),
            total_images: content.images.len(),
            total_tables: content.tables.len(),
            text_length: content.text_length(),
        }
    }
}

/// Canonical output of any tier and of the orchestrator.
///
/// Content, statistics and error are only reachable through constructors,
/// which keeps `statistics` in step with `content` and makes an error result
/// content-free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub status: ExtractionStatus,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<ExtractionContent>,
    pub meta: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    statistics: Option<Statistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ExtractionResult {
    /// Create a successful result. `final_url` is the post-redirect URL.
    pub fn success(
        url: impl Into<String>,
        final_url: impl Into<String>,
        title: Option<String>,
        content: ExtractionContent,
    ) -> Self {
        let statistics = Statistics::from_content(&content);
        Self {
            status: ExtractionStatus::Success,
            url: url.into(),
            final_url: Some(final_url.into()),
            title,
            content: Some(content),
            meta: BTreeMap::new(),
            statistics: Some(statistics),
            error: None,
        }
    }

    /// Create an error result with no content.
    pub fn error(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: ExtractionStatus::Error,
            url: url.into(),
            final_url: None,
            title: None,
            content: None,
            meta: BTreeMap::new(),
            statistics: None,
            error: Some(error.into()),
        }
    }

    /// Add a metadata key-value pair.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ExtractionStatus::Success
    }

    pub fn content(&self) -> Option<&ExtractionContent> {
        self.content.as_ref()
    }

    pub fn statistics(&self) -> Option<Statistics> {
        self.statistics
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Full-text character count, zero for error results.
    pub fn text_length(&self) -> usize {
        self.statistics.map(|s| s.text_length).unwrap_or(0)
    }

    pub fn heading_count(&self) -> usize {
        self.content
            .as_ref()
            .map(|c| c.text.headings.len())
            .unwrap_or(0)
    }

    pub fn link_count(&self) -> usize {
        self.statistics.map(|s| s.total_links).unwrap_or(0)
    }

    /// Whether a successful result carries anything usable.
    pub fn has_content(&self) -> bool {
        self.content.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Name of the tier that produced this result, from `meta.scraper`.
    pub fn scraper(&self) -> Option<&str> {
        self.meta.get("scraper").map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_content() -> ExtractionContent {
        ExtractionContent {
            text: TextContent {
                full_text: "Request for Proposal – résumé".to_string(),
                headings: vec![Heading {
                    level: 1,
                    text: "Request for Proposal".to_string(),
                }],
                ..Default::default()
            },
            links: vec![Link {
                text: "About".to_string(),
                href: "/about".to_string(),
                absolute_url: "https://example.gov/about".to_string(),
                is_external: false,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_success_computes_statistics() {
        let content = sample_content();
        let expected_len = content.text.full_text.chars().count();
        let result =
            ExtractionResult::success("https://example.gov", "https://example.gov/", None, content);

        let stats = result.statistics().unwrap();
        assert_eq!(stats.text_length, expected_len);
        assert_eq!(stats.total_links, 1);
        assert_eq!(result.heading_count(), 1);
        assert!(result.error_message().is_none());
    }

    #[test]
    fn test_error_has_no_content() {
        let result = ExtractionResult::error("https://example.gov", "boom");
        assert!(!result.is_success());
        assert!(result.content().is_none());
        assert!(result.statistics().is_none());
        assert_eq!(result.text_length(), 0);
        assert_eq!(result.error_message(), Some("boom"));
    }

    #[test]
    fn test_error_serialization_omits_content() {
        let result = ExtractionResult::error("https://example.gov", "boom");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json.get("content").is_none());
        assert!(json.get("statistics").is_none());
        assert_eq!(json["error"], "boom");
    }

    #[test]
    fn test_list_kind_serializes_as_type() {
        let list = ContentList {
            kind: ListKind::Ol,
            items: vec!["one".to_string()],
        };
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["type"], "ol");
    }
}
