//! Networking backend for Tether.
//!
//! This crate provides [`ReqwestTransport`], the [`Transport`] that carries
//! Tether requests over the network with reqwest:
//!
//! - **Exchanges**: each dispatched request runs as its own tokio task
//! - **Delivery**: completions are finished one at a time by a single task,
//!   so handlers never run concurrently
//! - **Runtime**: the ambient tokio runtime when there is one, otherwise a
//!   global runtime (see [`runtime`])
//!
//! # Example
//!
//! ```ignore
//! use tether_core::option::{with_header, with_host};
//! use tether_core::Session;
//! use tether_net::ReqwestTransport;
//!
//! let session = Session::new(ReqwestTransport::new(), [
//!     with_host("api.example.com"),
//!     with_header("Accept", "application/json"),
//! ])?;
//!
//! session
//!     .request("/users")
//!     .on_json_response(|users| {
//!         println!("{}", users.json());
//!         users.respond().ok();
//!     })?
//!     .on_error(|err| eprintln!("{}", err.verbose()))?
//!     .get()?;
//!
//! session.settled().await;
//! ```
//!
//! ## Configuration
//!
//! ```ignore
//! let transport = ReqwestTransport::builder()
//!     .timeout(Duration::from_secs(60))
//!     .user_agent("MyApp/1.0")
//!     .no_cookies()
//!     .build()?;
//! ```
//!
//! ## Failures
//!
//! When no response can be obtained the request's `on_error` handler gets a
//! [`TransportError`](tether_core::TransportError) whose
//! [`kind`](tether_core::TransportError::kind) tells timeouts, refused
//! connections, redirect loops, and malformed requests apart.

mod delivery;
mod error;
pub mod runtime;
mod transport;

pub use error::{NetworkError, Result};
pub use tether_core::Transport;
pub use transport::{ReqwestTransport, TransportBuilder, TransportConfig};
