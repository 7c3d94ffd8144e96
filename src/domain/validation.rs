//! Field-level request validation
//!
//! Collects every failing field instead of stopping at the first one, so a
//! form can highlight all problems in a single round trip.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{parse_date, Amount, BudgetPeriod, DomainError, ExpenseCategory, Income};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_NOTES_LEN: usize = 500;

/// A single failing field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Accumulates field errors while parsing a request
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// Trimmed name of 1..=100 characters
    pub fn name(&mut self, field: &str, value: &str, label: &str) -> Option<String> {
        let trimmed = value.trim();
        let len = trimmed.chars().count();
        if len == 0 || len > MAX_NAME_LEN {
            self.push(
                field,
                format!("{} must be between 1 and {} characters", label, MAX_NAME_LEN),
            );
            return None;
        }
        Some(trimmed.to_string())
    }

    /// Optional notes, trimmed, at most 500 characters. Blank notes become None.
    pub fn notes(&mut self, field: &str, value: Option<&str>) -> Option<Option<String>> {
        let Some(value) = value else {
            return Some(None);
        };
        let trimmed = value.trim();
        if trimmed.chars().count() > MAX_NOTES_LEN {
            self.push(
                field,
                format!("Notes cannot exceed {} characters", MAX_NOTES_LEN),
            );
            return None;
        }
        Some((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }

    pub fn amount(&mut self, field: &str, value: Decimal) -> Option<Amount> {
        match Amount::new(value) {
            Ok(amount) => Some(amount),
            Err(e) => {
                self.push(field, e.to_string());
                None
            }
        }
    }

    pub fn income(&mut self, field: &str, value: Decimal) -> Option<Income> {
        match Income::new(value) {
            Ok(income) => Some(income),
            Err(e) => {
                self.push(field, e.to_string());
                None
            }
        }
    }

    pub fn category(&mut self, field: &str, value: &str) -> Option<ExpenseCategory> {
        match value.parse() {
            Ok(category) => Some(category),
            Err(_) => {
                self.push(field, "Please select a valid category");
                None
            }
        }
    }

    pub fn date(&mut self, field: &str, value: &str) -> Option<DateTime<Utc>> {
        match parse_date(value) {
            Ok(date) => Some(date),
            Err(_) => {
                self.push(field, "Please provide a valid date");
                None
            }
        }
    }

    /// Year and month are checked independently so both can be reported
    pub fn period(&mut self, year: i32, month: i32) -> Option<BudgetPeriod> {
        let year = match BudgetPeriod::check_year(year) {
            Ok(()) => Some(year),
            Err(e) => {
                self.push("year", e.to_string());
                None
            }
        };
        // Negative months map to 0, which is out of range
        let month = u32::try_from(month).unwrap_or(0);
        let month = match BudgetPeriod::check_month(month) {
            Ok(()) => Some(month),
            Err(e) => {
                self.push("monthNumber", e.to_string());
                None
            }
        };
        BudgetPeriod::new(year?, month?).ok()
    }

    /// Validate a field only when it is present.
    ///
    /// `Some(None)` means absent, `None` means present and invalid.
    pub fn optional<I, T>(
        &mut self,
        value: Option<I>,
        check: impl FnOnce(&mut Self, I) -> Option<T>,
    ) -> Option<Option<T>> {
        match value {
            None => Some(None),
            Some(value) => check(self, value).map(Some),
        }
    }

    /// Finish validation and assemble the checked values.
    ///
    /// Every check that yields None records a field error, so `build`
    /// returns Some exactly when no error was collected.
    pub fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, DomainError> {
        match build() {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(DomainError::Validation(self.errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(result: Result<impl std::fmt::Debug, DomainError>) -> Vec<String> {
        match result {
            Err(DomainError::Validation(errors)) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_collects_multiple_errors() {
        let mut v = Validator::new();
        let name = v.name("name", "   ", "Expense name");
        let amount = v.amount("amount", Decimal::ZERO);
        let category = v.category("category", "Nope");

        let result = v.finish(|| Some((name?, amount?, category?)));
        assert_eq!(fields(result), vec!["name", "amount", "category"]);
    }

    #[test]
    fn test_finish_returns_checked_values() {
        let mut v = Validator::new();
        let name = v.name("name", "  Rent  ", "Name");
        let amount = v.amount("amount", Decimal::new(1200, 0));

        let (name, amount) = v.finish(|| Some((name?, amount?))).unwrap();
        assert_eq!(name, "Rent");
        assert_eq!(amount.value(), Decimal::new(1200, 0));
    }

    #[test]
    fn test_name_too_long() {
        let mut v = Validator::new();
        let long = "x".repeat(MAX_NAME_LEN + 1);
        let name = v.name("lenderName", &long, "Lender name");
        assert_eq!(fields(v.finish(|| name)), vec!["lenderName"]);
    }

    #[test]
    fn test_blank_notes_become_none() {
        let mut v = Validator::new();
        assert_eq!(v.notes("notes", Some("   ")), Some(None));
        assert_eq!(v.notes("notes", None), Some(None));
        assert_eq!(
            v.notes("notes", Some(" paid back ")),
            Some(Some("paid back".to_string()))
        );
        assert!(v.finish(|| Some(())).is_ok());
    }

    #[test]
    fn test_notes_too_long() {
        let mut v = Validator::new();
        let long = "n".repeat(MAX_NOTES_LEN + 1);
        let notes = v.notes("notes", Some(&long));
        assert_eq!(fields(v.finish(|| notes)), vec!["notes"]);
    }

    #[test]
    fn test_optional_skips_absent_fields() {
        let mut v = Validator::new();
        let absent = v.optional(None::<&str>, |v, d| v.date("date", d));
        let present = v.optional(Some("2024-05-02"), |v, d| v.date("date", d));
        assert_eq!(absent, Some(None));
        assert!(matches!(present, Some(Some(_))));

        let invalid = v.optional(Some("soon"), |v, d| v.date("endDate", d));
        assert_eq!(invalid, None);
        assert_eq!(fields(v.finish(|| invalid)), vec!["endDate"]);
    }

    #[test]
    fn test_period_reports_year_and_month_together() {
        let mut v = Validator::new();
        let period = v.period(1999, 13);
        assert_eq!(fields(v.finish(|| period)), vec!["year", "monthNumber"]);
    }

    #[test]
    fn test_period_negative_month() {
        let mut v = Validator::new();
        let period = v.period(2024, -1);
        assert_eq!(fields(v.finish(|| period)), vec!["monthNumber"]);
    }

    #[test]
    fn test_period_valid() {
        let mut v = Validator::new();
        let period = v.period(2024, 6);
        let period = v.finish(|| period).unwrap();
        assert_eq!(period.month_name(), "June");
    }
}
