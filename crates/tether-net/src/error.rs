//! Error types for the transport.

use std::error::Error as _;
use std::fmt;

use tether_core::{FailureKind, TransportFailure};

/// Errors raised while building a transport.
///
/// Failures of individual requests are not `NetworkError`s: they are
/// reported to the request's `on_error` handler as a
/// [`TransportError`](tether_core::TransportError).
#[derive(Debug, Clone)]
pub enum NetworkError {
    /// The underlying HTTP client could not be created.
    Client(String),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client(msg) => write!(f, "HTTP client error: {msg}"),
        }
    }
}

impl std::error::Error for NetworkError {}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        Self::Client(describe(&err))
    }
}

/// A specialized Result type for transport construction.
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Map a failed exchange onto the failure categories handlers see.
pub(crate) fn classify(err: &reqwest::Error) -> TransportFailure {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_connect() {
        FailureKind::Connect
    } else if err.is_redirect() {
        FailureKind::Redirect
    } else if err.is_builder() {
        FailureKind::InvalidRequest
    } else {
        FailureKind::Other
    };
    TransportFailure::new(kind, describe(err))
}

/// A request URL that could not be parsed.
pub(crate) fn invalid_url(url: &str, err: url::ParseError) -> TransportFailure {
    TransportFailure::new(
        FailureKind::InvalidRequest,
        format!("invalid URL '{url}': {err}"),
    )
}

/// The error message followed by its source chain.
///
/// reqwest's top-level message ("error sending request for url ...") hides
/// the cause, such as a refused connection.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
