//! Error types for Tether.
//!
//! Three kinds of failure are kept apart:
//!
//! - [`UsageError`]: the caller broke a builder or response rule. Returned
//!   synchronously from the offending call.
//! - [`TransportError`]: no HTTP response could be obtained. Delivered only
//!   to a request's `on_error` handler.
//! - [`Unsupported`]: the operation exists in the API but has no backing
//!   behavior yet.
//!
//! A completed exchange with a 4xx or 5xx status is not an error at all; it
//! arrives as a [`Response`](crate::Response).

use std::fmt;
use std::sync::Arc;

use crate::request::{HttpMethod, Request};

/// Result type alias for synchronous Tether operations.
pub type Result<T> = std::result::Result<T, UsageError>;

/// A violated builder or response invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    /// A verb was already selected on this builder.
    #[error("request was already dispatched with {verb}")]
    AlreadyDispatched {
        /// The verb chosen by the first verb call.
        verb: HttpMethod,
    },

    /// The request completed and its builder was released by the session.
    #[error("request has completed and its builder can no longer be used")]
    Settled,

    /// A body was already set on this builder.
    #[error("request body already set as {existing}, cannot set {attempted} body")]
    BodyAlreadySet {
        /// Kind of body already present.
        existing: BodyKind,
        /// Kind of body the caller tried to set.
        attempted: BodyKind,
    },

    /// A JSON body could not be serialized.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// A header name or value is not valid HTTP.
    #[error("invalid header '{name}': {message}")]
    InvalidHeader {
        /// The offending header name.
        name: String,
        /// Why it was rejected.
        message: String,
    },

    /// `respond()` was already called on this response.
    #[error("response to {url} was already responded to")]
    AlreadyResponded {
        /// URL of the originating request.
        url: String,
    },
}

impl UsageError {
    /// Create an invalid header error.
    pub fn invalid_header(name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            message: message.to_string(),
        }
    }
}

/// The kind of a request body, used in [`UsageError::BodyAlreadySet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// A JSON document.
    Json,
    /// Raw bytes.
    Raw,
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "JSON"),
            Self::Raw => write!(f, "raw"),
        }
    }
}

/// An operation that is part of the API but not implemented.
///
/// Returned instead of an empty or default value so that "not supported"
/// can never be mistaken for a valid empty result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not supported: {feature}")]
pub struct Unsupported {
    feature: &'static str,
}

impl Unsupported {
    pub(crate) fn new(feature: &'static str) -> Self {
        Self { feature }
    }

    /// Name of the unsupported feature.
    pub fn feature(&self) -> &'static str {
        self.feature
    }
}

/// Why a transport could not complete an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection refused, reset, or the host could not be resolved.
    Connect,
    /// The request timed out.
    Timeout,
    /// The redirect policy was violated.
    Redirect,
    /// The request could not be built (bad URL, bad header).
    InvalidRequest,
    /// The transport dropped the request without completing it.
    Abandoned,
    /// Any other failure.
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connection error"),
            Self::Timeout => write!(f, "timed out"),
            Self::Redirect => write!(f, "redirect error"),
            Self::InvalidRequest => write!(f, "invalid request"),
            Self::Abandoned => write!(f, "abandoned"),
            Self::Other => write!(f, "transport error"),
        }
    }
}

/// A failure as reported by a [`Transport`](crate::Transport), before it
/// is tied to its request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    /// Failure category.
    pub kind: FailureKind,
    /// Human readable description.
    pub description: String,
}

impl TransportFailure {
    /// Create a failure of the given kind.
    pub fn new(kind: FailureKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    /// Failure used when a completion is dropped without being completed.
    pub(crate) fn abandoned() -> Self {
        Self::new(
            FailureKind::Abandoned,
            "transport dropped the request without completing it",
        )
    }
}

/// The exchange could not be completed: no response exists.
///
/// Delivered to the `on_error` handler of the originating request. Carries
/// no status code and no body.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {description}")]
pub struct TransportError {
    kind: FailureKind,
    description: String,
    request: Arc<Request>,
}

impl TransportError {
    pub(crate) fn new(failure: TransportFailure, request: Arc<Request>) -> Self {
        Self {
            kind: failure.kind,
            description: failure.description,
            request,
        }
    }

    /// Textual description of the failure.
    pub fn verbose(&self) -> &str {
        &self.description
    }

    /// The failure category.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// The request that failed.
    pub fn request(&self) -> &Request {
        &self.request
    }
}
