//! Testing utilities including a scripted fetch strategy.
//!
//! Useful for exercising the orchestrator's fallback behaviour without any
//! network calls.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::html;
use crate::traits::strategy::FetchStrategy;
use crate::types::result::ExtractionResult;

type UrlPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

#[derive(Clone)]
enum Script {
    /// Run the HTML extractor over this markup, using the requested URL as base
    Html(String),
    /// Error result with this message
    Error(String),
    /// Returned as-is with `url` replaced
    Canned(ExtractionResult),
}

/// A fetch strategy with a fixed outcome and call tracking.
///
/// Clones share call history, so keep one clone for assertions and hand the
/// other to the orchestrator.
///
/// # Example
///
/// ```rust
/// use rfp_scraper::testing::{sample_page, ScriptedStrategy};
///
/// let tier = ScriptedStrategy::new("enhanced").returning_html(sample_page("RFP", 1500));
/// let for_sam_only = ScriptedStrategy::new("sam-gov-api").applies_when(|url| url.contains("sam.gov"));
/// ```
#[derive(Clone)]
pub struct ScriptedStrategy {
    name: String,
    script: Script,
    applies: Option<UrlPredicate>,
    delay: Option<Duration>,
    /// URLs passed to fetch, in order
    calls: Arc<RwLock<Vec<String>>>,
}

impl ScriptedStrategy {
    /// A tier that fails every fetch until told otherwise.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            script: Script::Error(format!("{name} scripted failure")),
            name,
            applies: None,
            delay: None,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Succeed by extracting `html`.
    pub fn returning_html(mut self, html: impl Into<String>) -> Self {
        self.script = Script::Html(html.into());
        self
    }

    /// Fail with `message`.
    pub fn returning_error(mut self, message: impl Into<String>) -> Self {
        self.script = Script::Error(message.into());
        self
    }

    /// Return a prepared result.
    pub fn returning(mut self, result: ExtractionResult) -> Self {
        self.script = Script::Canned(result);
        self
    }

    /// Only apply to URLs matching `predicate`.
    pub fn applies_when(mut self, predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.applies = Some(Arc::new(predicate));
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetch calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// URLs requested so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl FetchStrategy for ScriptedStrategy {
    async fn fetch(&self, url: &str) -> ExtractionResult {
        self.calls.write().unwrap().push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = match &self.script {
            Script::Html(markup) => ExtractionResult::success(
                url,
                url,
                html::extract_title(markup),
                html::extract(markup, url),
            ),
            Script::Error(message) => ExtractionResult::error(url, message.clone()),
            Script::Canned(canned) => {
                let mut result = canned.clone();
                result.url = url.to_string();
                result
            }
        };
        result.with_meta("scraper", self.name.clone())
    }

    fn applies_to(&self, url: &str) -> bool {
        self.applies.as_ref().map_or(true, |predicate| predicate(url))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// An HTML page with one `<h1>` and roughly `text_chars` characters of
/// paragraph text.
pub fn sample_page(heading: &str, text_chars: usize) -> String {
    const SENTENCE: &str = "The contractor shall deliver all services described herein. ";
    let body: String = SENTENCE.chars().cycle().take(text_chars).collect();
    format!(
        "<html><head><title>{heading}</title></head><body><h1>{heading}</h1><p>{body}</p></body></html>"
    )
}
