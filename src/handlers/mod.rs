//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Validates it and calls the item repository
//! 3. Returns HTTP response (JSON, status code)

use crate::services::{audit_service::AuditLog, item_repository::ItemRepository};
use std::sync::Arc;

/// Item CRUD endpoints
pub mod items;

/// State shared with every handler.
#[derive(Clone)]
pub struct AppState {
    pub items: Arc<dyn ItemRepository>,
    pub audit: AuditLog,
}
