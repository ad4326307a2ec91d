//! Session options.
//!
//! A [`SessionOption`] is a single configuration change. Options are passed
//! to [`Session::new`](crate::Session::new) and applied in order to a fresh
//! [`Config`]:
//!
//! ```ignore
//! use tether_core::option::{with_header, with_host, with_port};
//!
//! let session = Session::new(transport, [
//!     with_host("api.example.com"),
//!     with_port("443"),
//!     with_header("Accept", "application/json"),
//! ])?;
//! ```
//!
//! Scalar fields (host, port, base URL, timeout, default handler) keep the
//! last value applied. Headers and request filters accumulate in the order
//! applied; duplicates are kept.

use std::sync::Arc;
use std::time::Duration;

use crate::request::Request;
use crate::response::Response;

/// Called on every outgoing request before it is handed to the transport.
///
/// Filters may change headers, URL, or body. They cannot stop the request.
pub type RequestFilter = Arc<dyn Fn(&mut Request) + Send + Sync>;

/// Session-wide response handler.
///
/// Receives responses for requests that registered no response handler of
/// their own.
pub type ResponseHandler = Arc<dyn Fn(Response) + Send + Sync>;

/// Merged session configuration.
#[derive(Clone, Default)]
pub struct Config {
    /// Host name used to build URLs for relative request paths.
    pub host: String,
    /// Port; `"80"` selects plain HTTP, anything else HTTPS.
    pub port: String,
    /// Prefix for every relative request path. May be an absolute URL.
    pub base_url: String,
    /// Timeout forwarded to the transport with every request.
    pub timeout: Option<Duration>,
    /// Default headers, sent with every request.
    pub headers: Vec<(String, String)>,
    /// Request filters, applied in order.
    pub request_filters: Vec<RequestFilter>,
    /// Fallback response handler.
    pub response_handler: Option<ResponseHandler>,
}

impl Config {
    /// Apply options in order to a default configuration.
    pub fn from_options(options: impl IntoIterator<Item = SessionOption>) -> Self {
        let mut config = Self::default();
        for option in options {
            option.apply(&mut config);
        }
        config
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("headers", &self.headers)
            .field("request_filters", &self.request_filters.len())
            .field("has_response_handler", &self.response_handler.is_some())
            .finish()
    }
}

/// A single configuration change for a [`Session`](crate::Session).
pub struct SessionOption(Box<dyn FnOnce(&mut Config) + Send>);

impl SessionOption {
    /// Wrap an arbitrary configuration change.
    pub fn new<F>(apply: F) -> Self
    where
        F: FnOnce(&mut Config) + Send + 'static,
    {
        Self(Box::new(apply))
    }

    /// Apply this option to a configuration.
    pub fn apply(self, config: &mut Config) {
        (self.0)(config)
    }
}

impl std::fmt::Debug for SessionOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionOption")
    }
}

/// Set the host.
pub fn with_host(host: impl Into<String>) -> SessionOption {
    let host = host.into();
    SessionOption::new(move |config| config.host = host)
}

/// Set the port.
pub fn with_port(port: impl Into<String>) -> SessionOption {
    let port = port.into();
    SessionOption::new(move |config| config.port = port)
}

/// Set the base URL that relative request paths are appended to.
pub fn with_base_url(base_url: impl Into<String>) -> SessionOption {
    let base_url = base_url.into();
    SessionOption::new(move |config| config.base_url = base_url)
}

/// Add a default header.
pub fn with_header(key: impl Into<String>, value: impl Into<String>) -> SessionOption {
    let header = (key.into(), value.into());
    SessionOption::new(move |config| config.headers.push(header))
}

/// Set the request timeout passed to the transport.
pub fn with_timeout(timeout: Duration) -> SessionOption {
    SessionOption::new(move |config| config.timeout = Some(timeout))
}

/// Add a request filter.
///
/// # Example
///
/// ```ignore
/// with_request_filter(|request| {
///     request.headers.insert("x-trace", "on".parse().unwrap());
/// })
/// ```
pub fn with_request_filter<F>(filter: F) -> SessionOption
where
    F: Fn(&mut Request) + Send + Sync + 'static,
{
    let filter: RequestFilter = Arc::new(filter);
    SessionOption::new(move |config| config.request_filters.push(filter))
}

/// Set the session-wide fallback response handler.
pub fn with_response_handler<F>(handler: F) -> SessionOption
where
    F: Fn(Response) + Send + Sync + 'static,
{
    let handler: ResponseHandler = Arc::new(handler);
    SessionOption::new(move |config| config.response_handler = Some(handler))
}
