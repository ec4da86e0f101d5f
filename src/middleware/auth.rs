//! Token authentication middleware.
//!
//! This middleware intercepts every request to:
//! 1. Extract the token from the Authorization header
//! 2. Verify it with the configured [`TokenVerifier`]
//! 3. Reject missing tokens with HTTP 401 and unverifiable ones with HTTP 403
//!
//! No claims are attached to the request; a verified request is forwarded
//! unchanged.

use crate::error::AppError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use std::sync::Arc;

/// Decides whether a presented token is acceptable.
pub trait TokenVerifier: Send + Sync + 'static {
    fn verify(&self, token: &str) -> bool;
}

/// HMAC JWT verification (HS256, HS384, HS512) against a shared secret.
///
/// `exp` and `nbf`, when present, must hold for the current time. No claim
/// is required and `aud` is not checked.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.required_spec_claims.clear();
        validation.validate_nbf = true;
        validation.validate_aud = false;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> bool {
        match decode::<serde_json::Value>(token, &self.key, &self.validation) {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(error = %err, "token verification failed");
                false
            }
        }
    }
}

/// Extracts the token from the Authorization header value.
/// Expected format: "Bearer <token>" or just "<token>"
fn extract_token(header: Option<&str>) -> Option<&str> {
    let header = header?.trim();
    let token = match header.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("Bearer") => rest.trim(),
        // Hyper trims header values, so an empty bearer arrives as just the scheme.
        None if header.eq_ignore_ascii_case("Bearer") => "",
        _ => header,
    };
    (!token.is_empty()).then_some(token)
}

/// Authentication middleware function.
///
/// # Returns
///
/// - `Ok(Response)` if the token verified (calls next handler)
/// - `Err(AppError::MissingToken)` if no token was sent (401)
/// - `Err(AppError::InvalidToken)` if verification failed (403)
pub async fn auth_middleware(
    State(verifier): State<Arc<dyn TokenVerifier>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request.headers().get(AUTHORIZATION);

    // A header that is not valid UTF-8 was sent, so it counts as invalid, not missing.
    let token = match header {
        None => return Err(AppError::MissingToken),
        Some(value) => {
            let value = value.to_str().map_err(|_| AppError::InvalidToken)?;
            extract_token(Some(value)).ok_or(AppError::MissingToken)?
        }
    };

    if !verifier.verify(token) {
        return Err(AppError::InvalidToken);
    }

    Ok(next.run(request).await)
}
