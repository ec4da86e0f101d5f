//! Item Service - authenticated, rate limited CRUD over a single `items` table.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: HS256 JWT in the Authorization header
//! - **Throttling**: Fixed-window per-IP request quota
//! - **Audit**: JSON array on disk, appended by a single writer task
//!
//! # Request Flow
//!
//! rate limit → authentication → router → handler → repository → audit log

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::{
    handlers::AppState,
    middleware::{auth::TokenVerifier, rate_limit::RateLimiter},
};

/// Build the HTTP router with every route and middleware applied.
///
/// Layers wrap in reverse order of the `.layer` calls, so a request passes
/// tracing, then the rate limiter, then authentication, then routing.
pub fn router(
    state: AppState,
    limiter: Arc<RateLimiter>,
    verifier: Arc<dyn TokenVerifier>,
) -> Router {
    Router::new()
        .route("/api/items", post(handlers::items::create_item))
        .route("/api/items", get(handlers::items::list_items))
        .route("/api/items/{id}", get(handlers::items::get_item))
        .route("/api/items/{id}", put(handlers::items::update_item))
        .route("/api/items/{id}", delete(handlers::items::delete_item))
        .layer(axum_middleware::from_fn_with_state(
            verifier,
            middleware::auth::auth_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit::rate_limit_middleware,
        ))
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
