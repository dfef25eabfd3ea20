//! Client configuration
//!
//! Concurrency ceilings, retry policy and HTTP settings for a client
//! instance. Defaults match the observed service limits; a TOML file with
//! kebab-case keys can override them.

use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::Path;

/// Configuration for a [`WikidotKit`](crate::WikidotKit) instance
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Maximum number of concurrently executing structured (XML-RPC) calls
    #[serde(rename = "rpc-concurrency", default = "default_rpc_concurrency")]
    pub rpc_concurrency: usize,

    /// Maximum number of concurrently executing AJAX module calls
    #[serde(rename = "ajax-concurrency", default = "default_ajax_concurrency")]
    pub ajax_concurrency: usize,

    /// Additional attempts after a failed transport call
    #[serde(rename = "retries", default = "default_retries")]
    pub retries: u32,

    /// Base delay before the first retry (milliseconds); doubles per attempt
    #[serde(rename = "retry-base-delay-ms", default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Per-request timeout for the bundled HTTP connector (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_rpc_concurrency() -> usize {
    4
}

fn default_ajax_concurrency() -> usize {
    8
}

fn default_retries() -> u32 {
    4
}

fn default_retry_base_delay_ms() -> u64 {
    250
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_concurrency: default_rpc_concurrency(),
            ajax_concurrency: default_ajax_concurrency(),
            retries: default_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Loads and validates a configuration from a TOML file
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates a configuration from a TOML string
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values
    ///
    /// Concurrency ceilings and the request timeout must be non-zero.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.rpc_concurrency == 0 {
            return Err(ConfigError::Validation(
                "rpc-concurrency must be at least 1".to_string(),
            ));
        }

        if self.ajax_concurrency == 0 {
            return Err(ConfigError::Validation(
                "ajax-concurrency must be at least 1".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "request-timeout-secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.rpc_concurrency, 4);
        assert_eq!(config.ajax_concurrency, 8);
        assert_eq!(config.retries, 4);
        assert_eq!(config.retry_base_delay_ms, 250);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_parse_toml_overrides() {
        let config = ClientConfig::from_toml_str(
            r#"
            rpc-concurrency = 2
            ajax-concurrency = 16
            retries = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.rpc_concurrency, 2);
        assert_eq!(config.ajax_concurrency, 16);
        assert_eq!(config.retries, 1);
        // Unspecified keys fall back to defaults
        assert_eq!(config.retry_base_delay_ms, 250);
    }

    #[test]
    fn test_parse_empty_toml_is_default() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config.rpc_concurrency, 4);
        assert_eq!(config.ajax_concurrency, 8);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = ClientConfig::from_toml_str("ajax-concurrency = 0");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = ClientConfig::from_toml_str("request-timeout-secs = 0");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
