//! Domain module
//!
//! Core domain types and business rules. Nothing here touches the database.

pub mod amount;
pub mod category;
pub mod context;
pub mod error;
pub mod loan;
pub mod paired;
pub mod period;
pub mod summary;
pub mod validation;

pub use amount::{Amount, AmountError, Income, SignedAmount};
pub use category::ExpenseCategory;
pub use context::OperationContext;
pub use error::DomainError;
pub use loan::LoanKind;
pub use paired::{PairedExpense, PairedKind, PairedLookup, RepaidTransition};
pub use period::{month_name, parse_date, BudgetPeriod, InvalidDate, PeriodError};
pub use summary::{BudgetSummary, LoanLine};
pub use validation::{FieldError, Validator};
