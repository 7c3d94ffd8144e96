//! Repository layer
//!
//! Owner-scoped queries over the budget, expense, loan and user tables.

pub mod budgets;
pub mod expenses;
pub mod loans;
pub mod users;

pub use budgets::{Budget, BudgetRepository};
pub use expenses::{Expense, ExpenseChanges, ExpenseFilter, ExpenseRepository, NewExpense};
pub use loans::{Loan, LoanFilter, LoanRepository, LoanUpdate, NewLoan};
pub use users::{hash_api_key, ApiKeyRecord, SyncOutcome, User, UserRepository};
