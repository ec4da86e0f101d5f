//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers.
//! They can:
//! - Throttle clients
//! - Authenticate requests
//! - Short-circuit requests (reject unauthorized)

/// Token authentication middleware
pub mod auth;
/// Per-client fixed-window rate limiting
pub mod rate_limit;
