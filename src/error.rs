//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from database operations
/// - **Authentication Errors**: Missing or unverifiable tokens
/// - **Throttling Errors**: Client exhausted its request quota
/// - **Resource Errors**: Requested item not found
/// - **Validation Errors**: Invalid request data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error, timeout).
    ///
    /// This wraps any sqlx::Error using the `#[from]` attribute, which
    /// automatically implements `From<sqlx::Error> for AppError`.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No token was presented in the Authorization header.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Access denied")]
    MissingToken,

    /// A token was presented but did not verify.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Invalid token")]
    InvalidToken,

    /// Requested item does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Item not found")]
    ItemNotFound,

    /// Client used up its quota for the current window.
    ///
    /// Returns HTTP 429 Too Many Requests. Carries the seconds left
    /// until the window resets.
    #[error("Rate limit exceeded, try again later")]
    RateLimited { retry_after_secs: u64 },

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Rate limited responses additionally carry `retry_after_seconds` in the
/// body and a `Retry-After` header.
///
/// # Status Code Mapping
///
/// - `MissingToken` → 401 Unauthorized
/// - `InvalidToken` → 403 Forbidden
/// - `ItemNotFound` → 404 Not Found
/// - `RateLimited` → 429 Too Many Requests
/// - `InvalidRequest` → 400 Bad Request
/// - `Database` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map each error variant to (HTTP status, error code, message)
        let (status, code, message) = match self {
            AppError::MissingToken => {
                (StatusCode::UNAUTHORIZED, "missing_token", self.to_string())
            }
            AppError::InvalidToken => (StatusCode::FORBIDDEN, "invalid_token", self.to_string()),
            AppError::ItemNotFound => (StatusCode::NOT_FOUND, "item_not_found", self.to_string()),
            AppError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                self.to_string(),
            ),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Database(ref err) => {
                tracing::error!(error = %err, "database operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let mut body = json!({
            "error": {
                "code": code,
                "message": message
            }
        });

        if let AppError::RateLimited { retry_after_secs } = self {
            body["retry_after_seconds"] = json!(retry_after_secs);
            let mut response = (status, Json(body)).into_response();
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
            return response;
        }

        (status, Json(body)).into_response()
    }
}
