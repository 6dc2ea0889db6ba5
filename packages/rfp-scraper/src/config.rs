//! Runtime configuration, read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `EXTRACTION_MODE` | `live` (`demo` serves canned pages) |
//! | `BROWSERLESS_API_KEY` | unset (browser tier reports missing credentials) |
//! | `BROWSERLESS_URL` | `https://production-sfo.browserless.io` |
//! | `SAM_GOV_API_URL` | `https://api.sam.gov/opportunities/v2/search` |
//! | `SAM_GOV_API_KEY` | unset |
//! | `QUALITY_HIGH_MIN_CHARS` | 1000 |
//! | `QUALITY_MEDIUM_MIN_CHARS` | 200 |
//! | `ENHANCED_MAX_ATTEMPTS` | 3 |
//! | `ENHANCED_BACKOFF_MS` | 1000 |
//! | `BROWSER_TIMEOUT_SECS` | 60 |
//! | `HTTP_TIMEOUT_SECS` | 15 |
//! | `EXTRACTION_DEADLINE_SECS` | unset (no overall budget) |
//! | `ATTEMPT_LOG_CAPACITY` | 10 |

use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};
use crate::quality::QualityThresholds;
use crate::security::ServiceCredentials;
use crate::strategies::{DEFAULT_BROWSER_ENDPOINT, DEFAULT_SAM_GOV_API_URL};
use crate::stores::memory::DEFAULT_CAPACITY;

/// Which tiers the orchestrator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionMode {
    /// Real network tiers
    #[default]
    Live,
    /// Canned fixture pages only
    Demo,
}

impl FromStr for ExtractionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "demo" => Ok(Self::Demo),
            _ => Err(ConfigError::Invalid {
                variable: "EXTRACTION_MODE",
                expected: "\"live\" or \"demo\"",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub mode: ExtractionMode,
    pub browser: ServiceCredentials,
    pub sam_gov: ServiceCredentials,
    pub quality: QualityThresholds,
    pub enhanced_max_attempts: u32,
    pub enhanced_backoff: Duration,
    pub browser_timeout: Duration,
    pub http_timeout: Duration,
    /// Wall-clock budget for a whole pipeline run
    pub deadline: Option<Duration>,
    pub attempt_log_capacity: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::Live,
            browser: ServiceCredentials::new(DEFAULT_BROWSER_ENDPOINT),
            sam_gov: ServiceCredentials::new(DEFAULT_SAM_GOV_API_URL),
            quality: QualityThresholds::default(),
            enhanced_max_attempts: 3,
            enhanced_backoff: Duration::from_millis(1000),
            browser_timeout: Duration::from_secs(60),
            http_timeout: Duration::from_secs(15),
            deadline: None,
            attempt_log_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl ScraperConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> ConfigResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let mode = match get("EXTRACTION_MODE") {
            Some(value) => value.parse()?,
            None => defaults.mode,
        };

        let mut browser = ServiceCredentials::new(
            get("BROWSERLESS_URL").unwrap_or(defaults.browser.endpoint),
        );
        if let Some(key) = get("BROWSERLESS_API_KEY") {
            browser = browser.with_api_key(key);
        }

        let mut sam_gov = ServiceCredentials::new(
            get("SAM_GOV_API_URL").unwrap_or(defaults.sam_gov.endpoint),
        );
        if let Some(key) = get("SAM_GOV_API_KEY") {
            sam_gov = sam_gov.with_api_key(key);
        }

        let quality = QualityThresholds::new(
            parse_var(&get, "QUALITY_HIGH_MIN_CHARS", defaults.quality.high_min_chars)?,
            parse_var(&get, "QUALITY_MEDIUM_MIN_CHARS", defaults.quality.medium_min_chars)?,
        );

        let deadline = match get("EXTRACTION_DEADLINE_SECS") {
            Some(value) => Some(Duration::from_secs(parse_value(
                "EXTRACTION_DEADLINE_SECS",
                &value,
            )?)),
            None => None,
        };

        Ok(Self {
            mode,
            browser,
            sam_gov,
            quality,
            enhanced_max_attempts: parse_var(
                &get,
                "ENHANCED_MAX_ATTEMPTS",
                defaults.enhanced_max_attempts,
            )?,
            enhanced_backoff: Duration::from_millis(parse_var(&get, "ENHANCED_BACKOFF_MS", 1000)?),
            browser_timeout: Duration::from_secs(parse_var(&get, "BROWSER_TIMEOUT_SECS", 60)?),
            http_timeout: Duration::from_secs(parse_var(&get, "HTTP_TIMEOUT_SECS", 15)?),
            deadline,
            attempt_log_capacity: parse_var(
                &get,
                "ATTEMPT_LOG_CAPACITY",
                defaults.attempt_log_capacity,
            )?,
        })
    }

    pub fn with_mode(mut self, mode: ExtractionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_browser(mut self, browser: ServiceCredentials) -> Self {
        self.browser = browser;
        self
    }

    pub fn with_sam_gov(mut self, sam_gov: ServiceCredentials) -> Self {
        self.sam_gov = sam_gov;
        self
    }

    pub fn with_quality(mut self, quality: QualityThresholds) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_enhanced_retries(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.enhanced_max_attempts = max_attempts;
        self.enhanced_backoff = backoff;
        self
    }

    pub fn with_timeouts(mut self, browser: Duration, http: Duration) -> Self {
        self.browser_timeout = browser;
        self.http_timeout = http;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

fn parse_var<T, G>(get: &G, variable: &'static str, default: T) -> ConfigResult<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(variable) {
        Some(value) => parse_value(variable, &value),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(variable: &'static str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        variable,
        expected: "a non-negative integer",
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ScraperConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.mode, ExtractionMode::Live);
        assert!(!config.browser.has_api_key());
        assert_eq!(config.browser.endpoint, "https://production-sfo.browserless.io");
        assert_eq!(config.quality, QualityThresholds::default());
        assert_eq!(config.enhanced_max_attempts, 3);
        assert_eq!(config.http_timeout, Duration::from_secs(15));
        assert!(config.deadline.is_none());
        assert_eq!(config.attempt_log_capacity, 10);
    }

    #[test]
    fn test_overrides() {
        let config = ScraperConfig::from_lookup(lookup(&[
            ("EXTRACTION_MODE", "Demo"),
            ("BROWSERLESS_API_KEY", "bl-key"),
            ("QUALITY_HIGH_MIN_CHARS", "2000"),
            ("ENHANCED_BACKOFF_MS", "0"),
            ("EXTRACTION_DEADLINE_SECS", "90"),
        ]))
        .unwrap();

        assert_eq!(config.mode, ExtractionMode::Demo);
        assert!(config.browser.has_api_key());
        assert_eq!(config.quality.high_min_chars, 2000);
        assert_eq!(config.quality.medium_min_chars, 200);
        assert_eq!(config.enhanced_backoff, Duration::ZERO);
        assert_eq!(config.deadline, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = ScraperConfig::from_lookup(lookup(&[
            ("BROWSERLESS_API_KEY", "  "),
            ("HTTP_TIMEOUT_SECS", ""),
        ]))
        .unwrap();
        assert!(!config.browser.has_api_key());
        assert_eq!(config.http_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_invalid_number() {
        let err = ScraperConfig::from_lookup(lookup(&[("HTTP_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "HTTP_TIMEOUT_SECS must be a non-negative integer, got \"soon\""
        );
    }

    #[test]
    fn test_invalid_mode() {
        assert!(ScraperConfig::from_lookup(lookup(&[("EXTRACTION_MODE", "staging")])).is_err());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = ScraperConfig::from_lookup(lookup(&[("SAM_GOV_API_KEY", "sam-secret")])).unwrap();
        assert!(!format!("{config:?}").contains("sam-secret"));
    }
}
