//! Per-service client settings

use std::time::Duration;

use crate::error::ClientError;

#[derive(Debug, Clone)]
pub struct HttpServiceConfig {
    /// Base URL without a trailing slash, e.g. `https://payments.example.com/api`
    pub base_url: String,
    pub timeout: Duration,
    /// Sent as `x-api-key` when present
    pub api_key: Option<String>,
}

impl HttpServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
            api_key: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn build_client(&self) -> Result<reqwest::Client, ClientError> {
        if self.base_url.is_empty() {
            return Err(ClientError::Config("base URL is empty".to_string()));
        }
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = HttpServiceConfig::new("https://pay.example.com/api/");
        assert_eq!(config.endpoint("/initiate"), "https://pay.example.com/api/initiate");
        assert_eq!(config.endpoint("verify"), "https://pay.example.com/api/verify");
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let config = HttpServiceConfig::new("http://x").with_api_key(Some("  ".to_string()));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_empty_base_url_is_rejected() {
        assert!(matches!(
            HttpServiceConfig::new("").build_client(),
            Err(ClientError::Config(_))
        ));
    }
}
