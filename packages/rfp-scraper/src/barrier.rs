//! Authentication-barrier detection.
//!
//! Decides whether a fetched page is a login wall, paywall, CAPTCHA or bot
//! check rather than real content. Deliberately permissive: a false positive
//! costs a fallback, a false negative costs an analysis pass on junk.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

/// Below this many characters of text, a page with a form is treated as a
/// login wall.
pub const MINIMAL_CONTENT_CHARS: usize = 200;

/// Category of barrier, in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarrierKind {
    Login,
    AccessDenied,
    Subscription,
    JavaScriptRequired,
    CookiesRequired,
    Captcha,
    BotCheck,
    MinimalContentWithForms,
}

impl BarrierKind {
    pub fn reason(&self) -> &'static str {
        match self {
            BarrierKind::Login => "login required",
            BarrierKind::AccessDenied => "access denied",
            BarrierKind::Subscription => "subscription or payment required",
            BarrierKind::JavaScriptRequired => "javascript required",
            BarrierKind::CookiesRequired => "cookies required",
            BarrierKind::Captcha => "captcha challenge",
            BarrierKind::BotCheck => "bot check",
            BarrierKind::MinimalContentWithForms => "minimal content with forms detected",
        }
    }
}

impl fmt::Display for BarrierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Outcome of [`detect_barrier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BarrierCheck {
    pub kind: Option<BarrierKind>,
}

impl BarrierCheck {
    pub fn clear() -> Self {
        Self { kind: None }
    }

    pub fn has_barrier(&self) -> bool {
        self.kind.is_some()
    }

    pub fn reason(&self) -> Option<&'static str> {
        self.kind.map(|k| k.reason())
    }
}

lazy_static! {
    // Matched against extracted text, first hit wins.
    static ref TEXT_PATTERNS: Vec<(BarrierKind, Regex)> = vec![
        (
            BarrierKind::Login,
            Regex::new(r"(?i)\b(?:log ?in|sign ?in)\b").unwrap(),
        ),
        (
            BarrierKind::AccessDenied,
            Regex::new(r"(?i)\b(?:authentication required|access denied|unauthori[sz]ed)\b").unwrap(),
        ),
        (
            BarrierKind::Subscription,
            Regex::new(r"(?i)\b(?:subscribe|subscription|premium content|paid content|paywall|payment required)\b").unwrap(),
        ),
        (
            BarrierKind::JavaScriptRequired,
            Regex::new(r"(?i)\b(?:javascript (?:is )?required|enable javascript|requires javascript)\b").unwrap(),
        ),
        (
            BarrierKind::CookiesRequired,
            Regex::new(r"(?i)\b(?:cookies (?:are )?required|enable cookies)\b").unwrap(),
        ),
        (
            BarrierKind::Captcha,
            Regex::new(r"(?i)(?:re)?captcha|hcaptcha").unwrap(),
        ),
        (
            BarrierKind::BotCheck,
            Regex::new(r"(?i)checking your browser|bot detected|unusual traffic|verify you are (?:a )?human|ddos protection by").unwrap(),
        ),
    ];

    // Vendor challenge markers that live in markup, not in visible text.
    static ref BOT_CHECK_MARKUP: Regex = Regex::new(
        r"(?i)cf-browser-verification|challenge-platform|cf-chl-|_incapsula_resource|perimeterx|px-captcha|g-recaptcha|h-captcha"
    ).unwrap();

    static ref FORM_TAG: Regex = Regex::new(r"(?i)<form\b").unwrap();
}

/// Decide whether `html` / `text_content` is a barrier page.
///
/// `text_content` should be the page's visible text, as produced by
/// [`crate::html::extract_text`].
pub fn detect_barrier(html: &str, text_content: &str) -> BarrierCheck {
    for (kind, pattern) in TEXT_PATTERNS.iter() {
        if pattern.is_match(text_content) {
            return BarrierCheck { kind: Some(*kind) };
        }
    }

    if BOT_CHECK_MARKUP.is_match(html) {
        return BarrierCheck {
            kind: Some(BarrierKind::BotCheck),
        };
    }

    if text_content.chars().count() < MINIMAL_CONTENT_CHARS && FORM_TAG.is_match(html) {
        return BarrierCheck {
            kind: Some(BarrierKind::MinimalContentWithForms),
        };
    }

    BarrierCheck::clear()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(len: usize) -> String {
        let sentence = "The county invites qualified vendors to submit proposals for road maintenance services. ";
        sentence.repeat(len / sentence.len() + 1)[..len].to_string()
    }

    #[test]
    fn test_sign_in_is_login_barrier() {
        let text = "Please sign in to continue";
        let check = detect_barrier(text, text);
        assert!(check.has_barrier());
        assert_eq!(check.kind, Some(BarrierKind::Login));
        assert_eq!(check.reason(), Some("login required"));
    }

    #[test]
    fn test_minimal_content_with_form() {
        let text = "x".repeat(50);
        let html = format!("<html><body>{text}<form action=\"/go\"></form></body></html>");
        let check = detect_barrier(&html, &text);
        assert_eq!(check.kind, Some(BarrierKind::MinimalContentWithForms));
        assert_eq!(check.reason(), Some("minimal content with forms detected"));
    }

    #[test]
    fn test_long_article_not_flagged() {
        let text = article(5000);
        assert_eq!(text.len(), 5000);
        let html = format!("<html><body><p>{text}</p></body></html>");
        assert!(!detect_barrier(&html, &text).has_barrier());
    }

    #[test]
    fn test_long_article_with_form_not_flagged() {
        let text = article(1200);
        let html = format!("<p>{text}</p><form><input name=\"q\"></form>");
        assert!(!detect_barrier(&html, &text).has_barrier());
    }

    #[test]
    fn test_category_order() {
        // Login outranks captcha when both appear
        let text = "Complete the CAPTCHA and log in";
        assert_eq!(detect_barrier(text, text).kind, Some(BarrierKind::Login));

        let text = "Access Denied. You don't have permission.";
        assert_eq!(
            detect_barrier(text, text).kind,
            Some(BarrierKind::AccessDenied)
        );

        let text = "Please enable JavaScript to view this page";
        assert_eq!(
            detect_barrier(text, text).kind,
            Some(BarrierKind::JavaScriptRequired)
        );

        let text = "Checking your browser before accessing example.gov";
        assert_eq!(detect_barrier(text, text).kind, Some(BarrierKind::BotCheck));
    }

    #[test]
    fn test_bot_markup_in_html_only() {
        let text = article(800);
        let html = format!("<div id=\"cf-browser-verification\"></div><p>{text}</p>");
        assert_eq!(
            detect_barrier(&html, &text).kind,
            Some(BarrierKind::BotCheck)
        );
    }

    #[test]
    fn test_login_word_inside_other_word_ignored() {
        let text = "Catalogin entries for the design phase are attached.";
        assert!(!detect_barrier(text, text).has_barrier());
    }
}
