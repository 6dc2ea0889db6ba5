//! API keys for the upstream services (browser automation, opportunity API).
//!
//! Uses the `secrecy` crate so keys never reach logs or debug output.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

/// A secret string that won't be logged or displayed.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the secret value. Only call this when building a request.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_string())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Endpoint plus optional key for an upstream HTTP service.
#[derive(Clone)]
pub struct ServiceCredentials {
    /// Base URL of the service
    pub endpoint: String,

    /// API key (secret). `None` means the service is not configured.
    pub api_key: Option<SecretString>,
}

impl ServiceCredentials {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
        }
    }

    /// Set the API key. Blank keys count as absent.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let secret = SecretString::new(key);
        self.api_key = (!secret.is_empty()).then_some(secret);
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_not_in_debug() {
        let secret = SecretString::new("bl-super-secret-key");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("bl-super"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_secret_not_in_display() {
        let secret = SecretString::new("bl-super-secret-key");
        assert_eq!(format!("{}", secret), "[REDACTED]");
    }

    #[test]
    fn test_expose_works() {
        let secret = SecretString::new("bl-super-secret-key");
        assert_eq!(secret.expose(), "bl-super-secret-key");
    }

    #[test]
    fn test_service_credentials_debug() {
        let creds = ServiceCredentials::new("https://production-sfo.browserless.io")
            .with_api_key("bl-secret");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("bl-secret"));
        assert!(debug.contains("production-sfo"));
    }

    #[test]
    fn test_blank_key_is_absent() {
        let creds = ServiceCredentials::new("https://example.com").with_api_key("   ");
        assert!(!creds.has_api_key());
    }
}
