//! Wikidot-Kit: an async client for the Wikidot API surface
//!
//! This crate implements a client for the two transports Wikidot exposes: the
//! structured XML-RPC API and the undocumented AJAX module connector. Calls on
//! both transports go through bounded-concurrency queues with retry, and the
//! membership roster crawl composes paginated AJAX calls into a fully
//! enriched user list.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod report;
pub mod roster;
pub mod transport;
pub mod types;

use thiserror::Error;

/// Main error type for Wikidot-Kit operations
#[derive(Debug, Error)]
pub enum WikidotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("AJAX module call rejected with status {status}: {message}")]
    Service { status: String, message: String },

    #[error("Remote call fault: {0}")]
    Rpc(String),

    #[error("Malformed response: {0}")]
    Parse(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Dispatch queue closed")]
    QueueClosed,
}

impl WikidotError {
    /// Whether the dispatcher may retry the call that produced this error.
    ///
    /// Transport failures (network, protocol, module rejection) are
    /// retryable; malformed markup and result-shaping errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WikidotError::Http { .. } | WikidotError::Service { .. } | WikidotError::Rpc(_)
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Wikidot-Kit operations
pub type Result<T> = std::result::Result<T, WikidotError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use client::WikidotKit;
pub use config::ClientConfig;
pub use dispatch::{CallRequest, Dispatcher, TransportKind};
pub use report::{NoopReporter, Reporter};
pub use transport::{AjaxConnector, AjaxResponse, AjaxTransport, RpcTransport};
pub use types::{Page, User, UserProfile, UserStub};
