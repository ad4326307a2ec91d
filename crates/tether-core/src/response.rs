//! Response types.
//!
//! A completed exchange is stored once, in a shared [`ResponseData`], and
//! handed to handlers through views:
//!
//! - [`Response`]: the generic view, given to `on_response` handlers and to
//!   the session's default handler.
//! - [`EmptyResponse`]: given to `on_empty_response` when the body is empty.
//! - [`JsonResponse`]: given to `on_json_response` when the body is JSON.
//!
//! Which specialized view exists for a completion is decided by the body's
//! [`Classification`]. Every view handed to a handler must be concluded with
//! exactly one call to [`Response::respond`].

use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::{UsageError, Unsupported};
use crate::logging::targets;
use crate::request::Request;

/// A completed exchange as reported by a [`Transport`](crate::Transport).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Status text (reason phrase).
    pub status_text: String,
    /// Decoded body bytes.
    pub body: Bytes,
}

impl RawResponse {
    /// Create a raw response.
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }
}

/// What shape a response body has.
#[derive(Clone, Debug, PartialEq)]
pub enum Classification {
    /// The body is neither empty nor JSON.
    Unclassified,
    /// The body is empty.
    Empty,
    /// The body parsed as JSON.
    Json(Arc<serde_json::Value>),
}

impl Classification {
    /// Classify a response body.
    pub fn of(body: &[u8]) -> Self {
        if body.is_empty() {
            return Self::Empty;
        }
        match serde_json::from_slice(body) {
            Ok(value) => Self::Json(Arc::new(value)),
            Err(_) => Self::Unclassified,
        }
    }
}

/// The data of one completed exchange, shared by all of its views.
#[derive(Debug)]
pub(crate) struct ResponseData {
    status: u16,
    status_text: String,
    body: Bytes,
    text: String,
    request: Arc<Request>,
    classification: Classification,
}

impl ResponseData {
    pub(crate) fn new(raw: RawResponse, request: Arc<Request>) -> Self {
        let classification = Classification::of(&raw.body);
        let text = String::from_utf8_lossy(&raw.body).into_owned();
        Self {
            status: raw.status,
            status_text: raw.status_text,
            body: raw.body,
            text,
            request,
            classification,
        }
    }

    pub(crate) fn classification(&self) -> &Classification {
        &self.classification
    }

    pub(crate) fn request(&self) -> &Arc<Request> {
        &self.request
    }
}

/// Tracks whether a view was concluded with `respond()`.
#[derive(Debug)]
struct RespondGuard {
    responded: AtomicBool,
    view: &'static str,
    url: String,
}

impl Drop for RespondGuard {
    fn drop(&mut self) {
        if !self.responded.load(Ordering::Acquire) {
            tracing::warn!(
                target: targets::RESPONSE,
                view = self.view,
                url = %self.url,
                "response dropped without respond()"
            );
        }
    }
}

/// A completed HTTP exchange.
///
/// Any status code, including 4xx and 5xx, is a response: the exchange
/// itself succeeded. Clones share the same `respond()` guard.
#[derive(Clone)]
pub struct Response {
    data: Arc<ResponseData>,
    guard: Arc<RespondGuard>,
}

impl Response {
    pub(crate) fn deliver(data: Arc<ResponseData>, view: &'static str) -> Self {
        let guard = Arc::new(RespondGuard {
            responded: AtomicBool::new(false),
            view,
            url: data.request.url.clone(),
        });
        Self { data, guard }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.data.status
    }

    /// Get the status text.
    pub fn status_text(&self) -> &str {
        &self.data.status_text
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.data.status)
    }

    /// Check if the response is a client error (4xx status).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.data.status)
    }

    /// Check if the response is a server error (5xx status).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.data.status)
    }

    /// Get the response body as text.
    ///
    /// Invalid UTF-8 sequences are replaced.
    pub fn body(&self) -> &str {
        &self.data.text
    }

    /// Get the response body as raw bytes.
    pub fn body_bytes(&self) -> &Bytes {
        &self.data.body
    }

    /// Get the response headers.
    ///
    /// Response headers are not carried by the transport contract, so this
    /// always fails.
    pub fn headers(&self) -> Result<&http::HeaderMap, Unsupported> {
        Err(Unsupported::new("response headers"))
    }

    /// The request that produced this response.
    pub fn request(&self) -> &Request {
        &self.data.request
    }

    /// How the body was classified.
    pub fn classification(&self) -> &Classification {
        &self.data.classification
    }

    /// Check if the body is empty.
    pub fn is_empty(&self) -> bool {
        matches!(self.data.classification, Classification::Empty)
    }

    /// Get the parsed JSON body, if the body is JSON.
    pub fn json(&self) -> Option<&serde_json::Value> {
        match &self.data.classification {
            Classification::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Signal that processing of this response has concluded.
    ///
    /// Must be called exactly once per delivered response. The second call
    /// returns [`UsageError::AlreadyResponded`].
    pub fn respond(&self) -> Result<(), UsageError> {
        if self.guard.responded.swap(true, Ordering::AcqRel) {
            return Err(UsageError::AlreadyResponded {
                url: self.data.request.url.clone(),
            });
        }
        tracing::trace!(
            target: targets::RESPONSE,
            view = self.guard.view,
            status = self.data.status,
            url = %self.data.request.url,
            "responded"
        );
        Ok(())
    }

    /// Check if `respond()` was already called.
    pub fn is_responded(&self) -> bool {
        self.guard.responded.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.data.status)
            .field("url", &self.data.request.url)
            .field("classification", &self.data.classification)
            .field("responded", &self.is_responded())
            .finish()
    }
}

/// A response whose body is empty.
#[derive(Clone, Debug)]
pub struct EmptyResponse {
    response: Response,
}

impl EmptyResponse {
    pub(crate) fn deliver(data: Arc<ResponseData>) -> Self {
        Self {
            response: Response::deliver(data, "empty"),
        }
    }

    /// Unwrap into the generic view.
    pub fn into_response(self) -> Response {
        self.response
    }
}

impl Deref for EmptyResponse {
    type Target = Response;

    fn deref(&self) -> &Response {
        &self.response
    }
}

/// A response whose body parsed as JSON.
#[derive(Clone, Debug)]
pub struct JsonResponse {
    response: Response,
    json: Arc<serde_json::Value>,
}

impl JsonResponse {
    pub(crate) fn deliver(data: Arc<ResponseData>, json: Arc<serde_json::Value>) -> Self {
        Self {
            response: Response::deliver(data, "json"),
            json,
        }
    }

    /// Get the parsed JSON body.
    pub fn json(&self) -> &serde_json::Value {
        &self.json
    }

    /// Deserialize the JSON body into a typed value.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(self.json.as_ref())
    }

    /// Unwrap into the generic view.
    pub fn into_response(self) -> Response {
        self.response
    }
}

impl Deref for JsonResponse {
    type Target = Response;

    fn deref(&self) -> &Response {
        &self.response
    }
}
