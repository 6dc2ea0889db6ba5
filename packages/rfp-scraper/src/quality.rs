//! Content-quality scoring.
//!
//! Classifies an extraction as HIGH / MEDIUM / LOW from its text length and
//! structure. HIGH and MEDIUM are acceptable; LOW sends the orchestrator to
//! the next tier.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::result::ExtractionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityLabel {
    Low,
    Medium,
    High,
}

impl QualityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLabel::Low => "LOW",
            QualityLabel::Medium => "MEDIUM",
            QualityLabel::High => "HIGH",
        }
    }

    pub fn is_acceptable(&self) -> bool {
        matches!(self, QualityLabel::High | QualityLabel::Medium)
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Character cutoffs for the quality labels. Both are strict lower bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityThresholds {
    /// HIGH needs more than this many characters and a heading.
    pub high_min_chars: usize,

    /// MEDIUM needs more than this many characters and a heading or link.
    pub medium_min_chars: usize,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            high_min_chars: 1000,
            medium_min_chars: 200,
        }
    }
}

impl QualityThresholds {
    pub fn new(high_min_chars: usize, medium_min_chars: usize) -> Self {
        Self {
            high_min_chars,
            medium_min_chars,
        }
    }

    /// Label a result. Error results are always LOW.
    pub fn label(&self, result: &ExtractionResult) -> QualityLabel {
        if !result.is_success() {
            return QualityLabel::Low;
        }

        let text_length = result.text_length();
        let has_heading = result.heading_count() > 0;
        let has_link = result.link_count() > 0;

        if text_length > self.high_min_chars && has_heading {
            QualityLabel::High
        } else if text_length > self.medium_min_chars && (has_heading || has_link) {
            QualityLabel::Medium
        } else {
            QualityLabel::Low
        }
    }

    pub fn is_acceptable(&self, result: &ExtractionResult) -> bool {
        self.label(result).is_acceptable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::result::{ExtractionContent, Heading, Link, TextContent};

    fn result(text_len: usize, headings: usize, links: usize) -> ExtractionResult {
        let content = ExtractionContent {
            text: TextContent {
                full_text: "a".repeat(text_len),
                headings: (0..headings)
                    .map(|i| Heading {
                        level: 1,
                        text: format!("Heading {i}"),
                    })
                    .collect(),
                ..Default::default()
            },
            links: (0..links)
                .map(|i| Link {
                    text: format!("link {i}"),
                    href: format!("/{i}"),
                    absolute_url: format!("https://example.gov/{i}"),
                    is_external: false,
                })
                .collect(),
            ..Default::default()
        };
        ExtractionResult::success("https://example.gov", "https://example.gov", None, content)
    }

    #[test]
    fn test_high_boundary() {
        let q = QualityThresholds::default();
        assert_eq!(q.label(&result(1001, 1, 0)), QualityLabel::High);
        assert_eq!(q.label(&result(1000, 1, 0)), QualityLabel::Medium);
    }

    #[test]
    fn test_no_heading_no_link_rejected() {
        let q = QualityThresholds::default();
        assert_eq!(q.label(&result(1000, 0, 0)), QualityLabel::Low);
        assert!(!q.is_acceptable(&result(1000, 0, 0)));
        assert!(!q.is_acceptable(&result(5000, 0, 0)));
    }

    #[test]
    fn test_medium_via_link() {
        let q = QualityThresholds::default();
        assert_eq!(q.label(&result(201, 0, 1)), QualityLabel::Medium);
        assert!(q.is_acceptable(&result(201, 0, 1)));
        assert_eq!(q.label(&result(200, 0, 1)), QualityLabel::Low);
    }

    #[test]
    fn test_long_text_with_only_links_is_medium() {
        let q = QualityThresholds::default();
        assert_eq!(q.label(&result(4000, 0, 3)), QualityLabel::Medium);
    }

    #[test]
    fn test_error_result_is_low() {
        let q = QualityThresholds::default();
        let err = ExtractionResult::error("https://example.gov", "boom");
        assert_eq!(q.label(&err), QualityLabel::Low);
    }

    #[test]
    fn test_custom_thresholds() {
        let q = QualityThresholds::new(50, 10);
        assert_eq!(q.label(&result(51, 1, 0)), QualityLabel::High);
        assert_eq!(q.label(&result(11, 0, 1)), QualityLabel::Medium);
    }
}
