//! Prelude module for Tether.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```ignore
//! use tether::prelude::*;
//! ```
//!
//! This provides access to:
//! - Session setup (`Session`, option functions)
//! - Request building (`RequestBuilder`, `HttpMethod`)
//! - Response views (`Response`, `EmptyResponse`, `JsonResponse`)
//! - Errors (`UsageError`, `TransportError`, `Unsupported`)

// ============================================================================
// Session
// ============================================================================

pub use crate::Session;
pub use crate::option::{
    with_base_url, with_header, with_host, with_port, with_request_filter, with_response_handler,
    with_timeout,
};

// ============================================================================
// Requests
// ============================================================================

pub use crate::{HttpMethod, Request, RequestBuilder};

// ============================================================================
// Responses
// ============================================================================

pub use crate::{EmptyResponse, JsonResponse, Response};

// ============================================================================
// Errors
// ============================================================================

pub use crate::{FailureKind, TransportError, Unsupported, UsageError};

// ============================================================================
// Transport
// ============================================================================

#[cfg(feature = "networking")]
pub use crate::net::ReqwestTransport;
