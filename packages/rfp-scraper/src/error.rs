//! Typed errors for the scraper library.
//!
//! Uses `thiserror` for library errors (not `anyhow`). These errors never
//! cross the [`FetchStrategy`](crate::traits::strategy::FetchStrategy)
//! boundary: every strategy folds them into an error-status
//! [`ExtractionResult`](crate::types::result::ExtractionResult).

use thiserror::Error;

/// Errors that can occur while a single tier fetches a URL.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP transport failed (connection refused, DNS, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Target answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Request exceeded the tier's timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Page is a login wall, paywall, CAPTCHA or bot check
    #[error("Access restricted: {reason}. Content preview: \"{preview}...\"")]
    Barrier { reason: String, preview: String },

    /// Remote browser-automation service rejected the render request
    #[error(transparent)]
    BrowserService(#[from] BrowserServiceError),

    /// Opportunity database returned no record for the identifier
    #[error("no opportunity found for notice id {notice_id}")]
    OpportunityNotFound { notice_id: String },

    /// URL does not carry a recognised opportunity identifier
    #[error("no opportunity identifier in URL: {url}")]
    NotApplicable { url: String },

    /// Tier needs credentials that were not configured
    #[error("{service} not configured: missing {variable}")]
    MissingCredentials {
        service: &'static str,
        variable: &'static str,
    },

    /// Response body could not be decoded
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Page fetched but carried almost no text
    #[error("only {text_length} characters of text at {url}")]
    InsufficientContent { url: String, text_length: usize },

    /// Every retry of a retrying tier failed; carries the last failure
    #[error("failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<FetchError>,
    },

    /// Overall extraction budget ran out while this tier was running
    #[error("extraction deadline exceeded after {elapsed_ms}ms")]
    DeadlineExceeded { elapsed_ms: u64 },
}

impl FetchError {
    /// Map a reqwest error, keeping timeouts distinguishable.
    pub fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Http(Box::new(err))
        }
    }
}

/// Failures reported by the browser-automation service, one per status
/// code worth telling an operator about.
#[derive(Debug, Error)]
pub enum BrowserServiceError {
    #[error("BrowserQL authentication failed - check API key (invalid or expired credentials)")]
    InvalidCredentials,

    #[error("BrowserQL quota exceeded - upgrade plan needed")]
    QuotaExceeded,

    #[error("BrowserQL access forbidden - check API permissions")]
    Forbidden,

    #[error("BrowserQL endpoint not found - check BROWSERLESS_URL")]
    EndpointNotFound,

    #[error("BrowserQL rate limit exceeded - try again later")]
    RateLimited,

    #[error("BrowserQL service temporarily unavailable")]
    Unavailable,

    #[error("BrowserQL API error: {status} - {body}")]
    Other { status: u16, body: String },
}

impl BrowserServiceError {
    /// Classify a non-success status from the browser service.
    ///
    /// `body` is truncated to 200 characters for the catch-all variant.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => Self::InvalidCredentials,
            402 => Self::QuotaExceeded,
            403 => Self::Forbidden,
            404 => Self::EndpointNotFound,
            429 => Self::RateLimited,
            500 => Self::Unavailable,
            _ => Self::Other {
                status,
                body: body.chars().take(200).collect(),
            },
        }
    }
}

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Variable present but not parseable
    #[error("{variable} must be {expected}, got {value:?}")]
    Invalid {
        variable: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Result type alias for tier fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
