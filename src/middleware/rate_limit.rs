//! Per-client rate limiting middleware.
//!
//! Implements fixed-window counting keyed by client IP address. Each client
//! gets `quota` requests per window; the window starts at the client's first
//! request and the count resets once it has elapsed. Bursts straddling a
//! window boundary are allowed.
//!
//! Counters live in process memory only and are lost on restart.

use crate::error::AppError;
use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::{
    net::SocketAddr,
    sync::{Arc, Weak},
    time::Duration,
};
use tokio::time::Instant;

/// Key used for requests that carry no connection info.
const UNKNOWN_CLIENT: &str = "unknown";

/// Outcome of [`RateLimiter::consume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied { retry_after: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    used: u32,
}

/// Rate limiter state shared across requests.
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    quota: u32,
    window: Duration,
}

impl RateLimiter {
    /// Creates a new rate limiter.
    ///
    /// # Arguments
    /// * `quota` - Number of requests allowed per window
    /// * `window` - Length of one window
    pub fn new(quota: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            quota,
            window,
        }
    }

    /// Consume one unit of `key`'s quota.
    pub fn consume(&self, key: &str) -> Decision {
        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            used: 0,
        });

        let elapsed = now.duration_since(entry.started);
        if elapsed >= self.window {
            *entry = Window {
                started: now,
                used: 0,
            };
        }

        if entry.used < self.quota {
            entry.used += 1;
            Decision::Allowed
        } else {
            Decision::Denied {
                retry_after: self.window.saturating_sub(now.duration_since(entry.started)),
            }
        }
    }

    /// Drop windows that have fully elapsed.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, w| now.duration_since(w.started) < self.window);
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Spawn a task that sweeps expired windows once per window length.
    ///
    /// The task holds a weak reference and exits once the limiter is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.window;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(limiter) = weak.upgrade() else { break };
                limiter.sweep();
                tracing::debug!(clients = limiter.tracked_clients(), "rate limit windows swept");
            }
        })
    }
}

/// Rate limiting middleware.
///
/// Keyed by the peer IP from `ConnectInfo<SocketAddr>`. Requests without
/// connection info share one bucket.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = request.into_parts();
    let key = ConnectInfo::<SocketAddr>::from_request_parts(&mut parts, &())
        .await
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|_| UNKNOWN_CLIENT.to_string());
    let request = Request::from_parts(parts, body);

    match limiter.consume(&key) {
        Decision::Allowed => Ok(next.run(request).await),
        Decision::Denied { retry_after } => {
            tracing::warn!(client = %key, "rate limit exceeded");
            Err(AppError::RateLimited {
                // Round up so clients never retry early.
                retry_after_secs: retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0),
            })
        }
    }
}
