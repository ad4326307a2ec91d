//! Tether - callback-driven HTTP requests.
//!
//! This is the umbrella crate that re-exports all public APIs.
//!
//! # Example
//!
//! ```no_run
//! use tether::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::new(ReqwestTransport::new(), [
//!         with_host("api.example.com"),
//!         with_header("Accept", "application/json"),
//!     ])?;
//!
//!     session
//!         .request("/users")
//!         .with_arg("page", "1")?
//!         .on_json_response(|users| {
//!             println!("{}", users.json());
//!             users.respond().ok();
//!         })?
//!         .on_error(|err| eprintln!("request failed: {}", err.verbose()))?
//!         .get()?;
//!
//!     tether::net::runtime::block_on(session.settled());
//!     Ok(())
//! }
//! ```

pub use tether_core::*;

pub mod prelude;

/// Reqwest transport.
#[cfg(feature = "networking")]
pub mod net {
    pub use tether_net::*;
}
