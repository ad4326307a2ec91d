//! Completion routing.
//!
//! A transport finishes every request by consuming its [`Completion`]. The
//! completion then runs the routing rules:
//!
//! - failure: the request's error handler, if any; otherwise the failure is
//!   dropped.
//! - success: the generic response handler first, then the specialized
//!   handler matching the body's classification. If the request registered
//!   no response handler at all, the session's default handler receives the
//!   response instead.
//!
//! Once the handlers ran, the request's builder is released from the
//! session's outstanding set.

use std::sync::Arc;

use crate::error::{TransportError, TransportFailure};
use crate::logging::targets;
use crate::option::ResponseHandler;
use crate::request::Request;
use crate::response::{
    Classification, EmptyResponse, JsonResponse, RawResponse, Response, ResponseData,
};

pub(crate) type ErrorCallback = Box<dyn FnOnce(TransportError) + Send>;
pub(crate) type ResponseCallback = Box<dyn FnOnce(Response) + Send>;
pub(crate) type EmptyResponseCallback = Box<dyn FnOnce(EmptyResponse) + Send>;
pub(crate) type JsonResponseCallback = Box<dyn FnOnce(JsonResponse) + Send>;

/// Per-request handlers, moved out of the builder at dispatch.
#[derive(Default)]
pub(crate) struct Handlers {
    pub(crate) error: Option<ErrorCallback>,
    pub(crate) response: Option<ResponseCallback>,
    pub(crate) empty: Option<EmptyResponseCallback>,
    pub(crate) json: Option<JsonResponseCallback>,
}

impl Handlers {
    fn has_response_handler(&self) -> bool {
        self.response.is_some() || self.empty.is_some() || self.json.is_some()
    }

    pub(crate) fn route_failure(self, error: TransportError) {
        match self.error {
            Some(handler) => handler(error),
            None => {
                tracing::debug!(
                    target: targets::DISPATCH,
                    url = %error.request().url,
                    error = %error,
                    "transport failure dropped: no error handler"
                );
            }
        }
    }

    pub(crate) fn route_response(self, data: ResponseData, fallback: Option<ResponseHandler>) {
        let data = Arc::new(data);

        if !self.has_response_handler() {
            match fallback {
                Some(handler) => handler(Response::deliver(data, "default")),
                None => {
                    tracing::debug!(
                        target: targets::DISPATCH,
                        url = %data_url(&data),
                        "response discarded: no handler"
                    );
                }
            }
            return;
        }

        if let Some(handler) = self.response {
            handler(Response::deliver(data.clone(), "generic"));
        }

        match data.classification() {
            Classification::Empty => {
                if let Some(handler) = self.empty {
                    handler(EmptyResponse::deliver(data.clone()));
                } else if self.json.is_some() {
                    classification_miss(&data, "json");
                }
            }
            Classification::Json(value) => {
                if let Some(handler) = self.json {
                    handler(JsonResponse::deliver(data.clone(), value.clone()));
                } else if self.empty.is_some() {
                    classification_miss(&data, "empty");
                }
            }
            Classification::Unclassified => {
                if self.empty.is_some() || self.json.is_some() {
                    classification_miss(&data, "specialized");
                }
            }
        }
    }
}

fn data_url(data: &ResponseData) -> &str {
    &data.request().url
}

fn classification_miss(data: &ResponseData, expected: &'static str) {
    tracing::trace!(
        target: targets::DISPATCH,
        url = %data_url(data),
        expected,
        "body does not match the registered handler"
    );
}

type Finish = Box<dyn FnOnce(Result<RawResponse, TransportFailure>) + Send>;

/// The continuation a transport must consume to finish a request.
///
/// Call exactly one of [`succeed`](Self::succeed), [`fail`](Self::fail), or
/// [`complete`](Self::complete). Handlers run inside that call, on whatever
/// thread the transport uses. A completion dropped without being completed
/// finishes its request with a [`FailureKind::Abandoned`] error.
///
/// [`FailureKind::Abandoned`]: crate::FailureKind::Abandoned
pub struct Completion {
    request: Arc<Request>,
    finish: Option<Finish>,
}

impl Completion {
    /// Create a completion for `request` that calls `finish` with the outcome.
    ///
    /// Sessions create completions for their own requests; this constructor
    /// exists for transports that wrap or forward completions.
    pub fn new<F>(request: Arc<Request>, finish: F) -> Self
    where
        F: FnOnce(Result<RawResponse, TransportFailure>) + Send + 'static,
    {
        Self {
            request,
            finish: Some(Box::new(finish)),
        }
    }

    /// The request this completion belongs to.
    pub fn request(&self) -> &Arc<Request> {
        &self.request
    }

    /// Finish with a response.
    pub fn succeed(self, response: RawResponse) {
        self.complete(Ok(response));
    }

    /// Finish with a transport failure.
    pub fn fail(self, failure: TransportFailure) {
        self.complete(Err(failure));
    }

    /// Finish with either outcome.
    pub fn complete(mut self, outcome: Result<RawResponse, TransportFailure>) {
        if let Some(finish) = self.finish.take() {
            finish(outcome);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(finish) = self.finish.take() {
            tracing::warn!(
                target: targets::DISPATCH,
                url = %self.request.url,
                "completion dropped without an outcome"
            );
            finish(Err(TransportFailure::abandoned()));
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("request", &self.request.url)
            .field("pending", &self.finish.is_some())
            .finish()
    }
}
