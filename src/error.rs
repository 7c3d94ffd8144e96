//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::{DomainError, FieldError};

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Missing X-API-Key header")]
    MissingApiKey,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("API key is disabled")]
    ApiKeyDisabled,

    #[error("Budget not found")]
    BudgetNotFound,

    #[error("Expense not found")]
    ExpenseNotFound,

    #[error("Borrowing not found")]
    BorrowingNotFound,

    #[error("Lending not found")]
    LendingNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Route not found")]
    RouteNotFound,

    #[error("Record was modified concurrently, please retry")]
    ConcurrentModification,

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// Map a unique-key violation on budgets to `BudgetExists`
    pub fn from_budget_insert(err: sqlx::Error, year: i32, month: u32) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Domain(DomainError::BudgetExists { year, month })
            }
            _ => AppError::Database(err),
        }
    }
}

// =========================================================================
// Extractor rejections
// =========================================================================

/// Field named by a deserializer message.
///
/// Handles `missing field `x`` and path-prefixed errors (`amount: invalid type ...`).
fn rejected_field(detail: &str) -> Option<&str> {
    const MISSING: &str = "missing field `";
    if let Some(start) = detail.find(MISSING) {
        return detail[start + MISSING.len()..].split('`').next();
    }
    let (_, inner) = detail.split_once(": ")?;
    let (path, _) = inner.split_once(": ")?;
    (!path.is_empty() && !path.contains(char::is_whitespace)).then_some(path)
}

/// A malformed body, path or query becomes a single-field validation failure
fn rejection(default_field: &str, detail: String) -> AppError {
    let field = rejected_field(&detail).unwrap_or(default_field).to_string();
    tracing::debug!(field = %field, detail = %detail, "Request rejected");
    AppError::Domain(DomainError::field(&field, detail))
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        rejection("body", err.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(err: PathRejection) -> Self {
        rejection("id", err.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(err: QueryRejection) -> Self {
        rejection("query", err.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    /// Mirrors `error` under the key the SPA reads
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut field_errors = None;

        let (status, error_code, details) = match &self {
            // 401 Unauthorized
            AppError::MissingApiKey => (StatusCode::UNAUTHORIZED, "missing_api_key", None),
            AppError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "invalid_api_key", None),
            AppError::ApiKeyDisabled => (StatusCode::UNAUTHORIZED, "api_key_disabled", None),

            // 404 Not Found
            AppError::BudgetNotFound => (StatusCode::NOT_FOUND, "budget_not_found", None),
            AppError::ExpenseNotFound => (StatusCode::NOT_FOUND, "expense_not_found", None),
            AppError::BorrowingNotFound => (StatusCode::NOT_FOUND, "borrowing_not_found", None),
            AppError::LendingNotFound => (StatusCode::NOT_FOUND, "lending_not_found", None),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found", None),
            AppError::RouteNotFound => (StatusCode::NOT_FOUND, "route_not_found", None),

            // 409 Conflict
            AppError::ConcurrentModification => {
                (StatusCode::CONFLICT, "concurrent_modification", None)
            }

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(domain_err) => match domain_err {
                DomainError::Validation(errors) => {
                    field_errors = Some(errors.clone());
                    (StatusCode::BAD_REQUEST, "validation_failed", None)
                }
                DomainError::BudgetExists { year, month } => (
                    StatusCode::BAD_REQUEST,
                    "budget_exists",
                    Some(format!("{}-{:02}", year, month)),
                ),
                // A stored amount failing the rules is corrupt data, not a bad request
                DomainError::InvalidAmount(e) => {
                    tracing::error!("Stored amount rejected: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "invalid_amount", None)
                }
            },

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
        };

        // Never echo driver messages back to the client
        let error = match &self {
            AppError::Database(_) => "Database error".to_string(),
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            message: error.clone(),
            error,
            error_code: error_code.to_string(),
            details,
            errors: field_errors,
        };

        (status, Json(body)).into_response()
    }
}
