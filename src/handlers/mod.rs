//! Command Handlers module
//!
//! Handlers validate commands, scope every access to the caller and run the
//! side effects that loans produce.

mod budget_handler;
mod commands;
mod expense_handler;
mod loan_handler;
mod user_handler;


pub use budget_handler::{summarize, BudgetHandler};
pub use commands::*;
pub use expense_handler::ExpenseHandler;
pub use loan_handler::LoanHandler;
pub use user_handler::ProfileHandler;
