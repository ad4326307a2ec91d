//! The transport seam.

use std::sync::Arc;

use crate::dispatch::Completion;
use crate::request::Request;

/// Performs the network exchange for assembled requests.
///
/// `execute` must return without waiting for the exchange. The transport
/// later consumes `completion` exactly once: [`Completion::succeed`] with
/// the status, status text, and body, or [`Completion::fail`] when no
/// response could be obtained. Redirects, TLS, connection reuse, and timeout
/// enforcement are the transport's business.
pub trait Transport: Send + Sync + 'static {
    /// Start the exchange for `request`.
    fn execute(&self, request: Arc<Request>, completion: Completion);
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: Arc<Request>, completion: Completion) {
        (**self).execute(request, completion)
    }
}
