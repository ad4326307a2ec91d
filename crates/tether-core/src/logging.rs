//! Logging facilities for Tether.
//!
//! Tether uses the `tracing` crate for instrumentation and never installs a
//! subscriber itself. To see logs, install one in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("tether_core=debug,tether_net=debug")
//!         .init();
//!
//!     // Your application code...
//! }
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Session construction and outstanding-request tracking.
    pub const SESSION: &str = "tether_core::session";
    /// Request assembly and verb selection.
    pub const BUILDER: &str = "tether_core::builder";
    /// Completion routing to handlers.
    pub const DISPATCH: &str = "tether_core::dispatch";
    /// Response lifecycle (`respond()` bookkeeping).
    pub const RESPONSE: &str = "tether_core::response";
}
