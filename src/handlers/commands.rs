//! Command definitions
//!
//! Commands carry request input as received. Handlers validate them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::LoanKind;
use crate::repository::{Budget, Expense, Loan, User};

// =========================================================================
// Auth
// =========================================================================

/// Command to sync the caller's profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncProfileCommand {
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl SyncProfileCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_picture(mut self, picture: String) -> Self {
        self.picture = Some(picture);
        self
    }
}

/// Result of a profile sync
#[derive(Debug, Clone)]
pub struct SyncProfileResult {
    pub user: User,
    /// True on the first sync of this profile
    pub created: bool,
}

// =========================================================================
// Budgets
// =========================================================================

/// Command to open a budget period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBudgetCommand {
    pub year: i32,
    pub month_number: i32,
    pub income: Decimal,
}

impl CreateBudgetCommand {
    pub fn new(year: i32, month_number: i32) -> Self {
        Self {
            year,
            month_number,
            income: Decimal::ZERO,
        }
    }

    pub fn with_income(mut self, income: Decimal) -> Self {
        self.income = income;
        self
    }
}

/// Command to change a budget's income
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBudgetCommand {
    pub budget_id: Uuid,
    pub income: Decimal,
}

impl UpdateBudgetCommand {
    pub fn new(budget_id: Uuid, income: Decimal) -> Self {
        Self { budget_id, income }
    }
}

/// A budget with everything recorded against it
#[derive(Debug, Clone)]
pub struct BudgetDetail {
    pub budget: Budget,
    pub expenses: Vec<Expense>,
    pub borrowings: Vec<Loan>,
    pub lendings: Vec<Loan>,
}

/// A record together with the budget it belongs to
#[derive(Debug, Clone)]
pub struct WithBudget<T> {
    pub record: T,
    pub budget: Option<Budget>,
}

// =========================================================================
// Expenses
// =========================================================================

/// Command to record an expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExpenseCommand {
    pub budget_id: Uuid,
    pub name: String,
    pub category: String,
    pub amount: Decimal,
    pub date: String,
    pub notes: Option<String>,
}

impl CreateExpenseCommand {
    pub fn new(
        budget_id: Uuid,
        name: String,
        category: String,
        amount: Decimal,
        date: String,
    ) -> Self {
        Self {
            budget_id,
            name,
            category,
            amount,
            date,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: String) -> Self {
        self.notes = Some(notes);
        self
    }
}

/// Command to edit an expense. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateExpenseCommand {
    pub expense_id: Uuid,
    pub name: Option<String>,
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

impl UpdateExpenseCommand {
    pub fn new(expense_id: Uuid) -> Self {
        Self {
            expense_id,
            ..Default::default()
        }
    }
}

/// Expense list filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseQuery {
    pub budget_id: Option<Uuid>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// =========================================================================
// Borrowings and lendings
// =========================================================================

/// Command to record a borrowing or a lending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLoanCommand {
    pub budget_id: Uuid,
    /// Lender for a borrowing, borrower for a lending
    pub counterparty: String,
    pub amount: Decimal,
    pub date: String,
    pub notes: Option<String>,
}

impl CreateLoanCommand {
    pub fn new(budget_id: Uuid, counterparty: String, amount: Decimal, date: String) -> Self {
        Self {
            budget_id,
            counterparty,
            amount,
            date,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: String) -> Self {
        self.notes = Some(notes);
        self
    }
}

/// Command to edit a loan, including its repaid flag
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLoanCommand {
    pub loan_id: Uuid,
    pub counterparty: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<String>,
    pub notes: Option<String>,
    pub is_repaid: Option<bool>,
    pub repaid_date: Option<String>,
}

impl UpdateLoanCommand {
    pub fn new(loan_id: Uuid) -> Self {
        Self {
            loan_id,
            ..Default::default()
        }
    }
}

/// Loan list filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoanQuery {
    pub budget_id: Option<Uuid>,
    pub is_repaid: Option<bool>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Result of recording a loan
#[derive(Debug, Clone)]
pub struct CreateLoanResult {
    pub kind: LoanKind,
    pub loan: Loan,
    /// Expense written alongside the loan, if the kind writes one
    pub paired: Option<Expense>,
    /// The kind writes an expense on creation but the write failed
    pub paired_failed: bool,
}

/// Result of marking a loan repaid
#[derive(Debug, Clone)]
pub struct RepayLoanResult {
    pub loan: Loan,
    /// Repayment expense written by this call
    pub paired: Option<Expense>,
    /// False when the loan was already repaid and nothing changed
    pub transitioned: bool,
}
