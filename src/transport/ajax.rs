//! HTTP implementation of the AJAX module transport
//!
//! Wikidot's module connector takes a form-encoded POST at
//! `<wiki>/ajax-module-connector.php`. The request must carry a
//! `wikidot_token7` value both as a cookie and as a form field; the response
//! is a JSON envelope whose `body` field holds the HTML the module rendered.

use super::{AjaxResponse, AjaxTransport};
use crate::{ClientConfig, Result, WikidotError};
use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// The connector endpoint, relative to a wiki's base URL
const CONNECTOR_PATH: &str = "ajax-module-connector.php";

/// Any value accepted as long as cookie and form field agree
const TOKEN7: &str = "123456";

/// JSON envelope wrapping every module response
#[derive(Debug, Deserialize)]
struct AjaxEnvelope {
    status: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Production [`AjaxTransport`] backed by reqwest
pub struct AjaxConnector {
    http: Client,
}

impl AjaxConnector {
    /// Builds a connector with the configured request timeout
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let user_agent = format!("wikidot-kit/{}", env!("CARGO_PKG_VERSION"));

        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { http })
    }
}

#[async_trait]
impl AjaxTransport for AjaxConnector {
    async fn call(&self, base_url: &Url, args: &Value) -> Result<AjaxResponse> {
        let endpoint = base_url.join(CONNECTOR_PATH)?;
        let form = form_fields(args)?;

        let response = self
            .http
            .post(endpoint.clone())
            .header(COOKIE, format!("wikidot_token7={TOKEN7}"))
            .form(&form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| WikidotError::Http {
                url: endpoint.to_string(),
                source,
            })?;

        let envelope: AjaxEnvelope =
            response
                .json()
                .await
                .map_err(|source| WikidotError::Http {
                    url: endpoint.to_string(),
                    source,
                })?;

        if envelope.status != "ok" {
            return Err(WikidotError::Service {
                status: envelope.status,
                message: envelope.message.unwrap_or_default(),
            });
        }

        Ok(AjaxResponse {
            body: envelope.body.unwrap_or_default(),
        })
    }
}

/// Renders the argument record as form fields, with the token appended
fn form_fields(args: &Value) -> Result<Vec<(String, String)>> {
    let record = args
        .as_object()
        .ok_or_else(|| WikidotError::Parse("AJAX call arguments must be an object".to_string()))?;

    let mut fields: Vec<(String, String)> = record
        .iter()
        .map(|(key, value)| (key.clone(), form_value(value)))
        .collect();

    fields.push(("wikidot_token7".to_string(), TOKEN7.to_string()));
    Ok(fields)
}

/// Form representation of a scalar argument value
fn form_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
