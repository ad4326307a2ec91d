//! Shared helpers for tether-core integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tether_core::{Completion, RawResponse, Request, Transport, TransportFailure};

/// A transport that parks every request until the test completes it.
#[derive(Default)]
pub struct ScriptedTransport {
    pending: Mutex<VecDeque<(Arc<Request>, Completion)>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of requests waiting for an outcome.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Take the oldest parked request.
    pub fn next(&self) -> (Arc<Request>, Completion) {
        self.pending
            .lock()
            .pop_front()
            .expect("no request was dispatched")
    }

    /// Complete the oldest parked request with a response.
    pub fn respond(&self, status: u16, status_text: &str, body: &'static str) -> Arc<Request> {
        let (request, completion) = self.next();
        completion.succeed(RawResponse::new(status, status_text, body));
        request
    }

    /// Complete the oldest parked request with a failure.
    pub fn fail(&self, failure: TransportFailure) -> Arc<Request> {
        let (request, completion) = self.next();
        completion.fail(failure);
        request
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: Arc<Request>, completion: Completion) {
        self.pending.lock().push_back((request, completion));
    }
}
