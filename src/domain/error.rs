//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

use super::validation::FieldError;
use super::AmountError;

/// Domain-specific errors
///
/// These errors represent validation failures and business rule violations.
/// They are independent of the web/infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// One or more request fields failed validation
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// A stored money value no longer satisfies the amount rules
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// A budget for this owner and period already exists
    #[error("Budget already exists for this month and year")]
    BudgetExists { year: i32, month: u32 },
}

impl DomainError {
    /// Validation failure on a single field
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError {
            field: field.to_string(),
            message: message.into(),
        }])
    }
}
