//! Client configuration.
//!
//! Values come from the environment with fallbacks suitable for a local
//! backend. Unparseable overrides are ignored with a warning.

use std::time::Duration;

use crate::HeartwiseError;

/// Default base URL of the prediction service.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const API_URL_ENV: &str = "HEARTWISE_API_URL";
const API_TIMEOUT_ENV: &str = "HEARTWISE_API_TIMEOUT_SECS";

/// Prediction service client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL, without trailing slash
    pub api_url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given base URL.
    #[must_use]
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: normalize_url(api_url.into()),
            ..Self::default()
        }
    }

    /// Replace the base URL, rejecting anything that is not http(s).
    ///
    /// # Errors
    /// Returns `HeartwiseError::Config` for a non-http(s) URL.
    pub fn with_api_url(mut self, api_url: &str) -> Result<Self, HeartwiseError> {
        self.api_url = checked_url(api_url)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Supported:
    /// - HEARTWISE_API_URL
    /// - HEARTWISE_API_TIMEOUT_SECS
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(url) = lookup(API_URL_ENV) {
            match checked_url(&url) {
                Ok(url) => cfg.api_url = url,
                Err(e) => tracing::warn!("Ignoring {}: {}", API_URL_ENV, e),
            }
        }

        if let Some(v) = lookup(API_TIMEOUT_ENV) {
            match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => cfg.timeout = Duration::from_secs(secs),
                _ => tracing::warn!("Ignoring {}: expected a positive integer", API_TIMEOUT_ENV),
            }
        }

        cfg
    }

    /// Full URL for an endpoint path such as `/predict`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }
}

fn checked_url(url: &str) -> Result<String, HeartwiseError> {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(normalize_url(url.to_string()))
    } else {
        Err(HeartwiseError::Config(format!(
            "API URL must start with http:// or https://, got '{url}'"
        )))
    }
}

fn normalize_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = ClientConfig::from_lookup(lookup_from(&[]));
        assert_eq!(cfg, ClientConfig::default());
        assert_eq!(cfg.endpoint("/predict"), "http://localhost:5000/api/predict");
    }

    #[test]
    fn test_env_overrides() {
        let cfg = ClientConfig::from_lookup(lookup_from(&[
            (API_URL_ENV, "https://risk.example.org/api/"),
            (API_TIMEOUT_ENV, "5"),
        ]));
        assert_eq!(cfg.api_url, "https://risk.example.org/api");
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.endpoint("health"), "https://risk.example.org/api/health");
    }

    #[test]
    fn test_invalid_overrides_ignored() {
        let cfg = ClientConfig::from_lookup(lookup_from(&[
            (API_URL_ENV, "localhost:5000"),
            (API_TIMEOUT_ENV, "0"),
        ]));
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_explicit_url_is_strict() {
        let cfg = ClientConfig::default()
            .with_api_url(" http://10.0.0.5:8080/api/ ")
            .expect("Should accept http URL");
        assert_eq!(cfg.endpoint("/predict"), "http://10.0.0.5:8080/api/predict");

        let err = ClientConfig::default()
            .with_api_url("ftp://example.org")
            .expect_err("Should reject non-http URL");
        assert!(matches!(err, HeartwiseError::Config(_)));
        assert_eq!(
            err.user_message(),
            "Error: Configuration error: API URL must start with http:// or https://, got 'ftp://example.org'"
        );
    }
}
