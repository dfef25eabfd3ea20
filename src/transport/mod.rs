//! Transport adapters
//!
//! The two wire protocols the service speaks, behind narrow async traits:
//! - [`RpcTransport`]: one structured remote-procedure call (XML-RPC against
//!   `www.wikidot.com/xml-rpc-api.php`, token basic auth). Implementations
//!   are supplied by the caller; this crate does not encode the XML-RPC wire
//!   format itself.
//! - [`AjaxTransport`]: one AJAX module invocation against a wiki's base URL,
//!   returning a markup document to query. [`AjaxConnector`] is the bundled
//!   HTTP implementation.

mod ajax;
mod document;

pub use ajax::AjaxConnector;
pub use document::HtmlDocument;
pub(crate) use document::{compile, text_of};

use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

/// Performs a single structured remote-procedure call
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Calls `method` with a single argument record and returns the parsed
    /// result, or the transport error that ended the attempt.
    async fn call(&self, method: &str, args: &Value) -> Result<Value>;
}

/// Performs a single AJAX module invocation
#[async_trait]
pub trait AjaxTransport: Send + Sync {
    /// Invokes the module named in `args` against `base_url` and returns the
    /// markup the module rendered.
    async fn call(&self, base_url: &Url, args: &Value) -> Result<AjaxResponse>;
}

/// Markup returned by an AJAX module call
#[derive(Debug, Clone)]
pub struct AjaxResponse {
    /// The HTML fragment rendered by the module
    pub body: String,
}

impl AjaxResponse {
    /// Returns a queryable view over the returned markup
    pub fn document(&self) -> HtmlDocument {
        HtmlDocument::parse(&self.body)
    }
}
