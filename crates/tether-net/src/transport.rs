//! The reqwest-backed transport.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::redirect::Policy;
use tether_core::{Completion, RawResponse, Request, RequestBody, Transport, TransportFailure};
use tokio::runtime::Handle;

use crate::delivery::Delivery;
use crate::error::{Result, classify, invalid_url};
use crate::runtime;

/// Configuration for the transport.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Client-wide request timeout. A session timeout overrides it per request.
    pub timeout: Option<Duration>,
    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Whether to follow redirects.
    pub follow_redirects: bool,
    /// Maximum number of redirects to follow.
    pub max_redirects: usize,
    /// Whether to enable cookie storage.
    pub cookies_enabled: bool,
    /// Default user agent.
    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            follow_redirects: true,
            max_redirects: 10,
            cookies_enabled: true,
            user_agent: Some(format!("Tether/{} (Rust)", env!("CARGO_PKG_VERSION"))),
        }
    }
}

/// Builder for creating a transport with custom configuration.
#[derive(Debug)]
pub struct TransportBuilder {
    config: TransportConfig,
    handle: Option<Handle>,
}

impl Default for TransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: TransportConfig::default(),
            handle: None,
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Disable request timeout.
    pub fn no_timeout(mut self) -> Self {
        self.config.timeout = None;
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Disable redirect following.
    pub fn no_redirects(mut self) -> Self {
        self.config.follow_redirects = false;
        self
    }

    /// Set the maximum number of redirects to follow.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Disable cookie storage.
    pub fn no_cookies(mut self) -> Self {
        self.config.cookies_enabled = false;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Run exchanges and handlers on the runtime behind `handle`.
    ///
    /// Without this, the runtime current at [`build`](Self::build) is used,
    /// or the global one from [`runtime`](crate::runtime).
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<ReqwestTransport> {
        let config = &self.config;
        let redirects = if config.follow_redirects {
            Policy::limited(config.max_redirects)
        } else {
            Policy::none()
        };
        let mut builder = reqwest::Client::builder()
            .redirect(redirects)
            .cookie_store(config.cookies_enabled);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build()?;
        let handle = self.handle.unwrap_or_else(runtime::handle);
        let delivery = Delivery::start(&handle);

        tracing::debug!(
            target: "tether_net::transport",
            timeout = ?self.config.timeout,
            follow_redirects = self.config.follow_redirects,
            "transport created"
        );

        Ok(ReqwestTransport {
            inner: Arc::new(TransportInner {
                client,
                config: self.config,
                handle,
                delivery,
            }),
        })
    }
}

/// Internal state for the transport.
struct TransportInner {
    client: reqwest::Client,
    config: TransportConfig,
    handle: Handle,
    delivery: Delivery,
}

/// A [`Transport`] that performs exchanges with reqwest.
///
/// Each request runs as its own task; completions are then finished one at
/// a time by a single delivery task, so handlers never run concurrently.
/// The transport is cheaply cloneable; clones share the connection pool.
///
/// # Example
///
/// ```ignore
/// use tether_core::option::with_host;
/// use tether_core::Session;
/// use tether_net::ReqwestTransport;
///
/// let transport = ReqwestTransport::builder()
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// let session = Session::new(transport, [with_host("api.example.com")])?;
/// ```
#[derive(Clone)]
pub struct ReqwestTransport {
    inner: Arc<TransportInner>,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    /// Create a new transport with default configuration.
    pub fn new() -> Self {
        TransportBuilder::new()
            .build()
            .expect("Failed to create HTTP transport with default configuration")
    }

    /// Create a builder for configuring a new transport.
    pub fn builder() -> TransportBuilder {
        TransportBuilder::new()
    }

    /// Get the transport's configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.inner.config
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: Arc<Request>, completion: Completion) {
        let client = self.inner.client.clone();
        let delivery = self.inner.delivery.clone();
        self.inner.handle.spawn(async move {
            let outcome = send(&client, &request).await;
            if let Err(failure) = &outcome {
                tracing::debug!(
                    target: "tether_net::transport",
                    url = %request.url,
                    kind = %failure.kind,
                    "exchange failed: {}",
                    failure.description
                );
            }
            delivery.deliver(completion, outcome);
        });
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Perform one exchange.
async fn send(
    client: &reqwest::Client,
    request: &Request,
) -> std::result::Result<RawResponse, TransportFailure> {
    let url = request
        .full_url()
        .map_err(|e| invalid_url(&request.url, e))?;

    let mut req_builder = client
        .request(request.method.as_http(), url)
        .headers(request.headers.clone());

    if let Some(timeout) = request.timeout {
        req_builder = req_builder.timeout(timeout);
    }

    if let Some(body) = request.body.to_bytes() {
        if matches!(request.body, RequestBody::Json(_))
            && !request.headers.contains_key(http::header::CONTENT_TYPE)
        {
            req_builder = req_builder.header(
                http::header::CONTENT_TYPE,
                http::HeaderValue::from_static("application/json"),
            );
        }
        req_builder = req_builder.body(body);
    }

    tracing::trace!(
        target: "tether_net::transport",
        method = %request.method,
        url = %request.url,
        "sending request"
    );

    let response = req_builder.send().await.map_err(|e| classify(&e))?;
    let status = response.status();
    let body: Bytes = response.bytes().await.map_err(|e| classify(&e))?;

    Ok(RawResponse::new(status.as_u16(), status_text(status), body))
}

/// The canonical reason phrase for `status`.
fn status_text(status: http::StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}
