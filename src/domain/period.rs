//! Budget periods and date handling

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_YEAR: i32 = 2020;
pub const MAX_YEAR: i32 = 2050;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A (year, month) bucket. One budget exists per owner per period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BudgetPeriod {
    year: i32,
    month: u32,
}

/// Out-of-range period component
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    #[error("Year must be between {} and {}", MIN_YEAR, MAX_YEAR)]
    Year,

    #[error("Month must be between 1 and 12")]
    Month,
}

/// Input that is neither an RFC 3339 timestamp nor a `YYYY-MM-DD` date
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid date: {0}")]
pub struct InvalidDate(pub String);

impl BudgetPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        Self::check_year(year)?;
        Self::check_month(month)?;
        Ok(Self { year, month })
    }

    pub fn check_year(year: i32) -> Result<(), PeriodError> {
        if (MIN_YEAR..=MAX_YEAR).contains(&year) {
            Ok(())
        } else {
            Err(PeriodError::Year)
        }
    }

    pub fn check_month(month: u32) -> Result<(), PeriodError> {
        if (1..=12).contains(&month) {
            Ok(())
        } else {
            Err(PeriodError::Month)
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn month_name(&self) -> &'static str {
        month_name(self.month)
    }
}

/// English month name for a 1-based month number. Out-of-range months yield "".
pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
        .unwrap_or("")
}

/// Parse an ISO 8601 date.
///
/// Accepts a full RFC 3339 timestamp or a bare `YYYY-MM-DD`, which is
/// taken as midnight UTC.
pub fn parse_date(input: &str) -> Result<DateTime<Utc>, InvalidDate> {
    let input = input.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| InvalidDate(input.to_string()))
}
