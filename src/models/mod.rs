//! Data models representing database entities and API bodies.

/// Audit trail entries
pub mod audit;
/// Item entity and request/response bodies
pub mod item;
