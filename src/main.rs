//! Item Service - Main Application Entry Point
//!
//! # Startup Flow
//!
//! 1. Load and validate configuration from environment variables
//! 2. Create database connection pool
//! 3. Make sure the `items` table exists
//! 4. Start the audit writer and the rate limit sweeper
//! 5. Build HTTP router with routes and middleware
//! 6. Serve on the configured port until Ctrl-C

use std::{net::SocketAddr, sync::Arc};

use item_service::{
    config::Config,
    db,
    handlers::AppState,
    middleware::{
        auth::{JwtVerifier, TokenVerifier},
        rate_limit::RateLimiter,
    },
    services::{audit_service::AuditLog, item_repository::PgItemRepository},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(?config, "Configuration loaded");

    let pool = db::create_pool(
        &config.database_url,
        config.db_max_connections,
        config.db_timeout(),
    )
    .await?;
    tracing::info!("Database pool created");

    db::ensure_schema(&pool).await?;
    tracing::info!("Items table ready");

    let audit = AuditLog::spawn(&config.audit_log_path);
    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit_points,
        config.rate_limit_window(),
    ));
    let sweeper = limiter.spawn_sweeper();
    let verifier: Arc<dyn TokenVerifier> = Arc::new(JwtVerifier::new(&config.jwt_secret));

    let state = AppState {
        items: Arc::new(PgItemRepository::new(pool)),
        audit: audit.clone(),
    };
    let app = item_service::router(state, limiter, verifier);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Connection info feeds the per-IP rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    audit.flush().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
