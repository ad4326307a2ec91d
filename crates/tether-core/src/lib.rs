//! Core of Tether: a callback-driven HTTP request layer.
//!
//! This crate holds everything except the network itself:
//!
//! - **Session**: shared host, port, base URL, default headers, request
//!   filters, and a fallback response handler, built from option functions
//! - **Request Builder**: a single-use fluent builder for one request
//! - **Dispatch**: routing of completed exchanges to `on_response`,
//!   `on_empty_response`, `on_json_response`, and `on_error` handlers
//! - **Transport**: the trait a network backend implements
//!
//! The reqwest backend lives in `tether-net`.
//!
//! # Example
//!
//! ```ignore
//! use tether_core::option::{with_header, with_host, with_port};
//! use tether_core::Session;
//!
//! let session = Session::new(transport, [
//!     with_host("api.example.com"),
//!     with_port("443"),
//!     with_header("Accept", "application/json"),
//! ])?;
//!
//! session
//!     .request("/users")
//!     .with_json_body(&serde_json::json!({"name": "a"}))?
//!     .on_json_response(|created| {
//!         println!("created: {}", created.json());
//!         created.respond().ok();
//!     })?
//!     .on_error(|err| eprintln!("request failed: {}", err.verbose()))?
//!     .post()?;
//!
//! session.settled().await;
//! ```
//!
//! # Handler Rules
//!
//! - `on_response` runs first, for every response, whatever its status.
//! - `on_empty_response` runs when the body is empty; `on_json_response`
//!   when it parses as JSON.
//! - With no response handler registered, the session's default handler
//!   (see [`option::with_response_handler`]) gets the response.
//! - `on_error` runs only when no response could be obtained at all.
//!
//! Every response view handed to a handler must be concluded with one call
//! to [`Response::respond`].

mod builder;
mod dispatch;
mod error;
pub mod logging;
pub mod option;
mod request;
mod response;
mod session;
mod transport;

pub use builder::RequestBuilder;
pub use dispatch::Completion;
pub use error::{
    BodyKind, FailureKind, Result, TransportError, TransportFailure, Unsupported, UsageError,
};
pub use option::{Config, RequestFilter, ResponseHandler, SessionOption};
pub use request::{HttpMethod, Request, RequestBody, RequestId};
pub use response::{Classification, EmptyResponse, JsonResponse, RawResponse, Response};
pub use session::Session;
pub use transport::Transport;
