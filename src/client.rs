//! Client facade
//!
//! [`WikidotKit`] owns the dispatcher and the two transport adapters. All
//! remote traffic, including the roster crawl, funnels through [`call`] and
//! [`ajax_call`], which admit every request to its transport queue.
//!
//! [`call`]: WikidotKit::call
//! [`ajax_call`]: WikidotKit::ajax_call

use crate::config::ClientConfig;
use crate::dispatch::{CallRequest, Dispatcher, TransportKind};
use crate::report::{NoopReporter, Reporter};
use crate::transport::{AjaxConnector, AjaxResponse, AjaxTransport, RpcTransport};
use crate::types::Page;
use crate::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use url::Url;

/// Async client for the structured and AJAX transports of a wiki service
pub struct WikidotKit {
    config: ClientConfig,
    dispatcher: Dispatcher,
    rpc: Arc<dyn RpcTransport>,
    ajax: Arc<dyn AjaxTransport>,
    reporter: Arc<dyn Reporter>,
}

impl WikidotKit {
    /// Creates a client from a validated configuration and the two transports
    pub fn new(
        config: ClientConfig,
        rpc: Arc<dyn RpcTransport>,
        ajax: Arc<dyn AjaxTransport>,
    ) -> Result<Self> {
        config.validate()?;
        let reporter: Arc<dyn Reporter> = Arc::new(NoopReporter);
        let dispatcher = Dispatcher::new(&config, Arc::clone(&reporter));

        Ok(Self {
            config,
            dispatcher,
            rpc,
            ajax,
            reporter,
        })
    }

    /// Creates a client using the bundled HTTP AJAX connector
    ///
    /// The structured transport is still supplied by the caller, since its
    /// wire protocol lives outside this crate.
    pub fn with_http_ajax(config: ClientConfig, rpc: Arc<dyn RpcTransport>) -> Result<Self> {
        let ajax = Arc::new(AjaxConnector::new(&config)?);
        Self::new(config, rpc, ajax)
    }

    /// Attaches an observability sink receiving call attempts and crawl
    /// stage progress
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Arc::clone(&reporter);
        self.dispatcher.set_reporter(reporter);
        self
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Performs one structured call through the structured-call queue
    pub async fn call(&self, method: &str, args: Value) -> Result<Value> {
        let request = CallRequest::new(TransportKind::Rpc, method, args.clone());
        let rpc = Arc::clone(&self.rpc);
        let method = method.to_string();

        self.dispatcher
            .dispatch(request, move || {
                let rpc = Arc::clone(&rpc);
                let method = method.clone();
                let args = args.clone();
                async move { rpc.call(&method, &args).await }
            })
            .await
    }

    /// Performs one AJAX module call through the AJAX queue
    pub async fn ajax_call(&self, base_url: &Url, args: Value) -> Result<AjaxResponse> {
        let request = CallRequest::new(TransportKind::Ajax, base_url.as_str(), args.clone());
        let ajax = Arc::clone(&self.ajax);
        let base_url = base_url.clone();

        self.dispatcher
            .dispatch(request, move || {
                let ajax = Arc::clone(&ajax);
                let base_url = base_url.clone();
                let args = args.clone();
                async move { ajax.call(&base_url, &args).await }
            })
            .await
    }

    /// Lists the full names of all pages of a wiki (`pages.select`)
    pub async fn fetch_pages_list(&self, site: &str) -> Result<Vec<String>> {
        let result = self.call("pages.select", json!({ "site": site })).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Fetches one page with content and metadata (`pages.get_one`)
    pub async fn fetch_page(&self, site: &str, page: &str) -> Result<Page> {
        let result = self
            .call("pages.get_one", json!({ "site": site, "page": page }))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Reports crawl progress to the attached sink and the log
    pub(crate) fn log(&self, message: &str, payload: Value) {
        self.reporter.report(message, None, Some(&payload));
        tracing::debug!("{} {}", message, payload);
    }
}
