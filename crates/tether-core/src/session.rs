//! The session: shared configuration and outstanding-request tracking.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use slotmap::SlotMap;
use tokio::sync::Notify;

use crate::builder::{BuilderEntry, RequestBuilder};
use crate::error::{Result, UsageError};
use crate::logging::targets;
use crate::option::{Config, ResponseHandler, SessionOption};
use crate::request::RequestId;
use crate::transport::Transport;

/// Internal state for the session.
struct SessionInner {
    config: Config,
    default_headers: http::HeaderMap,
    transport: Arc<dyn Transport>,
    builders: Mutex<SlotMap<RequestId, BuilderEntry>>,
    settled: Notify,
}

/// Shared connection context for many requests.
///
/// A session is built once from [`SessionOption`]s and is immutable
/// afterwards, except for the set of outstanding requests it tracks. It is
/// cheaply cloneable; clones share configuration, transport, and the
/// outstanding set.
///
/// # Example
///
/// ```ignore
/// use tether_core::option::{with_header, with_host};
/// use tether_core::Session;
///
/// let session = Session::new(transport, [
///     with_host("api.example.com"),
///     with_header("Accept", "application/json"),
/// ])?;
///
/// session
///     .request("/users")
///     .with_arg("page", "2")?
///     .on_json_response(|users| {
///         println!("{}", users.json());
///         users.respond().ok();
///     })?
///     .get()?;
///
/// session.settled().await;
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Create a session by applying `options` in order.
    ///
    /// Fails if a default header has an invalid name or value.
    pub fn new<T: Transport>(
        transport: T,
        options: impl IntoIterator<Item = SessionOption>,
    ) -> Result<Self> {
        Self::from_config(transport, Config::from_options(options))
    }

    /// Create a session from an already merged configuration.
    pub fn from_config<T: Transport>(transport: T, config: Config) -> Result<Self> {
        let mut default_headers = http::HeaderMap::new();
        for (key, value) in &config.headers {
            let name = http::HeaderName::try_from(key.as_str())
                .map_err(|e| UsageError::invalid_header(key.as_str(), e))?;
            let value = http::HeaderValue::try_from(value.as_str())
                .map_err(|e| UsageError::invalid_header(key.as_str(), e))?;
            default_headers.append(name, value);
        }

        tracing::debug!(
            target: targets::SESSION,
            host = %config.host,
            port = %config.port,
            base_url = %config.base_url,
            headers = config.headers.len(),
            filters = config.request_filters.len(),
            "session created"
        );

        Ok(Self {
            inner: Arc::new(SessionInner {
                config,
                default_headers,
                transport: Arc::new(transport),
                builders: Mutex::new(SlotMap::with_key()),
                settled: Notify::new(),
            }),
        })
    }

    /// Start a new request for `url`.
    ///
    /// `url` may be absolute or a path relative to the session's base URL.
    /// The returned builder is tracked as outstanding until its request
    /// completes or the builder is dropped without dispatching.
    pub fn request(&self, url: impl Into<String>) -> RequestBuilder {
        let url = url.into();
        let id = self.inner.builders.lock().insert(BuilderEntry::new(url));
        tracing::trace!(target: targets::SESSION, ?id, "request builder created");
        RequestBuilder::new(self.clone(), id)
    }

    /// Get the merged configuration.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the host.
    pub fn host(&self) -> &str {
        &self.inner.config.host
    }

    /// Get the port.
    pub fn port(&self) -> &str {
        &self.inner.config.port
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.inner.config.base_url
    }

    /// Get the default headers in the order they were added.
    pub fn headers(&self) -> &[(String, String)] {
        &self.inner.config.headers
    }

    /// Get the request timeout forwarded to the transport.
    pub fn timeout(&self) -> Option<Duration> {
        self.inner.config.timeout
    }

    /// Check if a session-wide response handler is set.
    pub fn has_response_handler(&self) -> bool {
        self.inner.config.response_handler.is_some()
    }

    /// Get the session-wide response handler.
    pub fn response_handler(&self) -> Option<ResponseHandler> {
        self.inner.config.response_handler.clone()
    }

    /// Number of builders not yet settled.
    pub fn outstanding(&self) -> usize {
        self.inner.builders.lock().len()
    }

    /// Check if the request with `id` is still outstanding.
    pub fn is_outstanding(&self, id: RequestId) -> bool {
        self.inner.builders.lock().contains_key(id)
    }

    /// Check if no request is outstanding.
    pub fn is_settled(&self) -> bool {
        self.inner.builders.lock().is_empty()
    }

    /// Wait until no request is outstanding.
    ///
    /// Resolves immediately when the session is already settled.
    pub async fn settled(&self) {
        loop {
            let mut notified = std::pin::pin!(self.inner.settled.notified());
            notified.as_mut().enable();
            if self.is_settled() {
                return;
            }
            notified.await;
        }
    }

    /// Resolve a request URL against the session's host, port, and base URL.
    pub fn resolve_url(&self, url: &str) -> String {
        resolve_url(&self.inner.config, url)
    }

    pub(crate) fn default_headers(&self) -> &http::HeaderMap {
        &self.inner.default_headers
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    /// Run `f` on the builder entry for `id`.
    ///
    /// Fails with [`UsageError::Settled`] if the entry was already released.
    pub(crate) fn with_entry<R>(
        &self,
        id: RequestId,
        f: impl FnOnce(&mut BuilderEntry) -> Result<R>,
    ) -> Result<R> {
        let mut builders = self.inner.builders.lock();
        let entry = builders.get_mut(id).ok_or(UsageError::Settled)?;
        f(entry)
    }

    /// Release the entry for `id`, waking `settled()` waiters if it was the
    /// last one.
    pub(crate) fn release(&self, id: RequestId) -> Option<BuilderEntry> {
        let (entry, remaining) = {
            let mut builders = self.inner.builders.lock();
            let entry = builders.remove(id);
            (entry, builders.len())
        };
        if entry.is_some() {
            tracing::trace!(target: targets::SESSION, ?id, remaining, "request released");
            if remaining == 0 {
                self.inner.settled.notify_waiters();
            }
        }
        entry
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.inner.config)
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

/// Whether `url` is absolute with a host, as opposed to a path that merely
/// parses with a scheme-like prefix (`items:batchGet`, `localhost:8080/api`).
fn is_absolute(url: &str) -> bool {
    url::Url::parse(url).is_ok_and(|u| u.has_host())
}

fn resolve_url(config: &Config, url: &str) -> String {
    if is_absolute(url) {
        return url.to_string();
    }

    let path = if url.is_empty() || url.starts_with('/') {
        url.to_string()
    } else {
        format!("/{url}")
    };

    let base = config.base_url.trim_end_matches('/');
    if is_absolute(base) {
        return format!("{base}{path}");
    }

    let base = if base.is_empty() || base.starts_with('/') {
        base.to_string()
    } else {
        format!("/{base}")
    };
    if config.host.is_empty() {
        return format!("{base}{path}");
    }

    let (scheme, default_port) = if config.port == "80" {
        ("http", "80")
    } else {
        ("https", "443")
    };
    if config.port.is_empty() || config.port == default_port {
        format!("{scheme}://{}{base}{path}", config.host)
    } else {
        format!("{scheme}://{}:{}{base}{path}", config.host, config.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Completion;
    use crate::option::{with_base_url, with_header, with_host, with_port};
    use crate::request::Request;

    struct NullTransport;

    impl Transport for NullTransport {
        fn execute(&self, _request: Arc<Request>, completion: Completion) {
            drop(completion);
        }
    }

    fn config(host: &str, port: &str, base_url: &str) -> Config {
        Config::from_options([with_host(host), with_port(port), with_base_url(base_url)])
    }

    #[test]
    fn resolve_absolute_url_unchanged() {
        let config = config("api.example.com", "443", "/v1");
        assert_eq!(
            resolve_url(&config, "http://other.example.com/x?y=1"),
            "http://other.example.com/x?y=1"
        );
    }

    #[test]
    fn resolve_from_host_and_port() {
        assert_eq!(
            resolve_url(&config("api.example.com", "443", ""), "/users"),
            "https://api.example.com/users"
        );
        assert_eq!(
            resolve_url(&config("api.example.com", "80", ""), "users"),
            "http://api.example.com/users"
        );
        assert_eq!(
            resolve_url(&config("api.example.com", "8443", "v2/"), "/users"),
            "https://api.example.com:8443/v2/users"
        );
        assert_eq!(
            resolve_url(&config("api.example.com", "", "/v1"), "/users"),
            "https://api.example.com/v1/users"
        );
    }

    #[test]
    fn resolve_against_absolute_base() {
        assert_eq!(
            resolve_url(&config("ignored", "1", "http://127.0.0.1:9000/api/"), "items"),
            "http://127.0.0.1:9000/api/items"
        );
    }

    #[test]
    fn resolve_scheme_like_paths_against_host() {
        let config = config("api.example.com", "443", "/v1");
        assert_eq!(
            resolve_url(&config, "items:batchGet"),
            "https://api.example.com/v1/items:batchGet"
        );
        assert_eq!(
            resolve_url(&config, "/items:batchGet"),
            "https://api.example.com/v1/items:batchGet"
        );
        assert_eq!(
            resolve_url(&self::config("", "", "localhost:8080/api"), "/users"),
            "/localhost:8080/api/users"
        );
        assert_eq!(
            resolve_url(&self::config("api.example.com", "80", "localhost:8080/api"), "/users"),
            "http://api.example.com/localhost:8080/api/users"
        );
    }

    #[test]
    fn resolve_without_host_stays_relative() {
        assert_eq!(resolve_url(&config("", "", "/v1"), "/users"), "/v1/users");
    }

    #[test]
    fn invalid_default_header_is_rejected() {
        let err = Session::new(NullTransport, [with_header("bad header", "x")]).unwrap_err();
        assert!(matches!(err, UsageError::InvalidHeader { .. }));
    }

    #[test]
    fn builders_are_tracked_until_dropped() {
        let session = Session::new(NullTransport, [with_host("api.example.com")]).unwrap();
        assert!(session.is_settled());
        let builder = session.request("/users");
        assert_eq!(session.outstanding(), 1);
        assert!(session.is_outstanding(builder.id()));
        drop(builder);
        assert!(session.is_settled());
    }
}
