//! Connection gate: validate, dispatch, hand the response to the caller.
//!
//! # Responsibilities
//! - Reject relative targets before any network activity
//! - Issue exactly one request per valid call through the underlying client
//! - Wrap the response in a `ClientResponse` and run the caller's handler
//! - Bound time-to-headers with the configured response timeout
//!
//! # Design Decisions
//! - No retries: retry policy belongs to the caller
//! - Every exchange runs in its own span, keyed by `ExchangeId`

use http::Method;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

use crate::client::{HttpClient, HyperClient, OutboundRequest};
use crate::config::validation::validate_config;
use crate::config::{ConfigError, ConnectorConfig};
use crate::error::{ConnectorError, ConnectorResult};
use crate::http::exchange::ExchangeTracker;
use crate::http::response::ClientResponse;
use crate::http::target::validate_target;
use crate::observability::metrics;

/// Entry point for outgoing requests.
#[derive(Clone)]
pub struct Connector {
    client: Arc<dyn HttpClient>,
    config: ConnectorConfig,
    tracker: ExchangeTracker,
}

impl Connector {
    /// Create a connector backed by the pooled hyper client.
    ///
    /// Fails with `ConfigError::Validation` if `config` does not pass
    /// [`validate_config`].
    pub fn new(config: ConnectorConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let client = Arc::new(HyperClient::new(&config));
        Ok(Self::build(client, config))
    }

    /// Create a connector over any underlying client.
    pub fn with_client(
        client: Arc<dyn HttpClient>,
        config: ConnectorConfig,
    ) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(Self::build(client, config))
    }

    fn build(client: Arc<dyn HttpClient>, config: ConnectorConfig) -> Self {
        Self {
            client,
            config,
            tracker: ExchangeTracker::new(),
        }
    }

    /// Send `method` to `target` and pass the response to `handler`.
    ///
    /// Fails with `InvalidTarget` without touching the network when `target`
    /// is not absolute, and with `ConnectionFailed` when no response arrives.
    /// Otherwise the handler's result is returned.
    pub async fn connect<F, Fut, T>(
        &self,
        method: Method,
        target: &str,
        handler: F,
    ) -> ConnectorResult<T>
    where
        F: FnOnce(ClientResponse) -> Fut,
        Fut: Future<Output = ConnectorResult<T>>,
    {
        let url = match validate_target(target) {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(uri = %target, "Rejected relative target");
                metrics::record_connect_failure("invalid_target");
                return Err(err);
            }
        };
        self.exchange(OutboundRequest::new(method, url), handler).await
    }

    /// Like [`connect`](Self::connect) for a request built by the caller.
    ///
    /// The request URL is checked the same way as a target string.
    pub async fn connect_request<F, Fut, T>(
        &self,
        request: OutboundRequest,
        handler: F,
    ) -> ConnectorResult<T>
    where
        F: FnOnce(ClientResponse) -> Fut,
        Fut: Future<Output = ConnectorResult<T>>,
    {
        if let Err(err) = validate_target(request.url.as_str()) {
            tracing::warn!(uri = %request.url, "Rejected relative target");
            metrics::record_connect_failure("invalid_target");
            return Err(err);
        }
        self.exchange(request, handler).await
    }

    async fn exchange<F, Fut, T>(
        &self,
        request: OutboundRequest,
        handler: F,
    ) -> ConnectorResult<T>
    where
        F: FnOnce(ClientResponse) -> Fut,
        Fut: Future<Output = ConnectorResult<T>>,
    {
        let guard = self.tracker.track();
        let span = tracing::debug_span!(
            "exchange",
            id = %guard.id(),
            method = %request.method,
            uri = %request.url,
        );

        async move {
            let request = self.with_default_headers(request);
            let method = request.method.clone();
            let start = Instant::now();
            let response_timeout = Duration::from_secs(self.config.timeouts.response_secs);

            tracing::debug!("Dispatching request");
            let handle = match tokio::time::timeout(response_timeout, self.client.dispatch(request)).await {
                Ok(Ok(handle)) => handle,
                Ok(Err(cause)) => {
                    tracing::error!(error = %cause, "Connection failed");
                    metrics::record_connect_failure("client_error");
                    return Err(ConnectorError::ConnectionFailed(cause));
                }
                Err(elapsed) => {
                    tracing::error!(timeout = ?response_timeout, "No response headers before timeout");
                    metrics::record_connect_failure("timeout");
                    return Err(ConnectorError::ConnectionFailed(Box::new(elapsed)));
                }
            };

            let status = handle.status_code();
            metrics::record_exchange(method.as_str(), status, start);
            tracing::debug!(status, elapsed = ?start.elapsed(), "Response received");

            let result = handler(ClientResponse::new(handle)).await;
            drop(guard);
            result
        }
        .instrument(span)
        .await
    }

    fn with_default_headers(&self, mut request: OutboundRequest) -> OutboundRequest {
        let defaults = &self.config.client;
        let mut headers = Vec::with_capacity(defaults.default_headers.len() + request.headers.len() + 1);
        if let Some(agent) = &defaults.user_agent {
            headers.push(("user-agent".to_string(), agent.clone()));
        }
        headers.extend(defaults.default_headers.iter().cloned());
        headers.append(&mut request.headers);
        request.headers = headers;
        request
    }

    /// Number of exchanges whose handler has not finished.
    pub fn in_flight(&self) -> u64 {
        self.tracker.active_count()
    }

    /// Wait until every exchange started on this connector (or its clones) has finished.
    pub async fn wait_idle(&self) {
        self.tracker.wait_idle().await
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}
