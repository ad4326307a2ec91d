//! Serial completion delivery.
//!
//! Exchanges run concurrently, but their completions are funneled through
//! one queue and finished by a single task. Handlers of different requests
//! therefore never run at the same time, even on a multi-threaded runtime.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tether_core::{Completion, RawResponse, TransportFailure};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// A finished exchange waiting for its handlers.
struct Finished {
    completion: Completion,
    outcome: Result<RawResponse, TransportFailure>,
}

impl Finished {
    fn run(self) {
        let url = self.completion.request().url.clone();
        let Self {
            completion,
            outcome,
        } = self;
        if catch_unwind(AssertUnwindSafe(|| completion.complete(outcome))).is_err() {
            tracing::error!(target: "tether_net::delivery", %url, "handler panicked");
        }
    }
}

/// Sender side of the delivery queue.
#[derive(Clone, Debug)]
pub(crate) struct Delivery {
    tx: mpsc::UnboundedSender<Finished>,
}

impl Delivery {
    /// Start the consumer task on `handle`.
    pub(crate) fn start(handle: &Handle) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Finished>();
        handle.spawn(async move {
            while let Some(finished) = rx.recv().await {
                finished.run();
            }
            tracing::trace!(target: "tether_net::delivery", "delivery queue closed");
        });
        Self { tx }
    }

    /// Queue a finished exchange.
    ///
    /// If the consumer task is gone (its runtime shut down), the completion
    /// is finished on the calling thread instead.
    pub(crate) fn deliver(
        &self,
        completion: Completion,
        outcome: Result<RawResponse, TransportFailure>,
    ) {
        if let Err(mpsc::error::SendError(finished)) = self.tx.send(Finished {
            completion,
            outcome,
        }) {
            tracing::warn!(
                target: "tether_net::delivery",
                url = %finished.completion.request().url,
                "delivery task stopped, completing inline"
            );
            finished.run();
        }
    }
}

impl std::fmt::Debug for Finished {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Finished")
            .field("completion", &self.completion)
            .field("ok", &self.outcome.is_ok())
            .finish()
    }
}
