//! API Middleware
//!
//! API key authentication and request logging.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::OperationContext;
use crate::error::AppError;
use crate::repository::UserRepository;

/// Header carrying the raw API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Header carrying an optional caller-supplied correlation ID
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-Id";

fn correlation_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
}

// =========================================================================
// API Key Authentication Middleware
// =========================================================================

/// Resolve the X-API-Key header to its owner and attach an operation context
pub async fn auth_middleware(
    State(pool): State<PgPool>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = match headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        Some(key) if !key.trim().is_empty() => key.trim(),
        _ => return Err(AppError::MissingApiKey),
    };

    let record = UserRepository::new(pool)
        .find_api_key(api_key)
        .await?
        .ok_or(AppError::InvalidApiKey)?;

    if !record.is_active {
        tracing::warn!(api_key_id = %record.id, "Disabled API key used");
        return Err(AppError::ApiKeyDisabled);
    }

    let correlation_id = correlation_id(&headers).unwrap_or_else(Uuid::new_v4);

    tracing::debug!(
        user_id = %record.user_id,
        api_key_id = %record.id,
        key_name = %record.name,
        correlation_id = %correlation_id,
        "Request authenticated"
    );

    request
        .extensions_mut()
        .insert(OperationContext::new(record.user_id).with_correlation_id(correlation_id));

    Ok(next.run(request).await)
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["x-api-key", "authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();

    let headers = mask_headers_for_logging(request.headers());

    // Runs ahead of auth, so only a caller-supplied ID is known here
    let correlation_id = correlation_id(request.headers());

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        version = ?version,
        correlation_id = ?correlation_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        correlation_id = ?correlation_id,
        "Request completed"
    );

    response
}
