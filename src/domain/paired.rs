//! Paired transactions
//!
//! Loans write offsetting rows into the expense collection:
//!
//! | trigger                | name                           | category          | amount |
//! |------------------------|--------------------------------|-------------------|--------|
//! | borrowing marked repaid| `Loan Repayment to {lender}`   | Bills & Utilities | +a     |
//! | lending created        | `Money lent to {borrower}`     | Other             | +a     |
//! | lending marked repaid  | `Loan Repayment from {borrower}` | Other           | -a     |
//!
//! Each generated expense records the kind and id of the loan that produced
//! it. Removal looks the row up by that link, and falls back to matching on
//! budget, name and amount for rows written without one.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{Amount, ExpenseCategory, SignedAmount};

/// Which loan event produced an expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairedKind {
    BorrowingRepayment,
    LendingOutflow,
    LendingRepayment,
}

impl PairedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PairedKind::BorrowingRepayment => "borrowing_repayment",
            PairedKind::LendingOutflow => "lending_outflow",
            PairedKind::LendingRepayment => "lending_repayment",
        }
    }

    pub fn category(&self) -> ExpenseCategory {
        match self {
            PairedKind::BorrowingRepayment => ExpenseCategory::BillsAndUtilities,
            PairedKind::LendingOutflow | PairedKind::LendingRepayment => ExpenseCategory::Other,
        }
    }

    /// Expense name for a given counterparty
    pub fn expense_name(&self, counterparty: &str) -> String {
        match self {
            PairedKind::BorrowingRepayment => format!("Loan Repayment to {}", counterparty),
            PairedKind::LendingOutflow => format!("Money lent to {}", counterparty),
            PairedKind::LendingRepayment => format!("Loan Repayment from {}", counterparty),
        }
    }

    /// Signed expense amount for a loan principal
    pub fn signed_amount(&self, principal: Amount) -> SignedAmount {
        match self {
            PairedKind::BorrowingRepayment | PairedKind::LendingOutflow => principal.into(),
            PairedKind::LendingRepayment => -principal,
        }
    }
}

/// A fully specified auto-generated expense, ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct PairedExpense {
    pub kind: PairedKind,
    pub source_id: Uuid,
    pub budget_id: Uuid,
    pub name: String,
    pub category: ExpenseCategory,
    pub amount: SignedAmount,
    pub date: DateTime<Utc>,
    pub notes: String,
}

impl PairedExpense {
    /// Expense recorded when a borrowing is paid back
    pub fn borrowing_repayment(
        borrowing_id: Uuid,
        budget_id: Uuid,
        lender_name: &str,
        principal: Amount,
        repaid_at: DateTime<Utc>,
    ) -> Self {
        let kind = PairedKind::BorrowingRepayment;
        Self {
            kind,
            source_id: borrowing_id,
            budget_id,
            name: kind.expense_name(lender_name),
            category: kind.category(),
            amount: kind.signed_amount(principal),
            date: repaid_at,
            notes: format!("Automatic expense for repaying loan to {}", lender_name),
        }
    }

    /// Expense recorded when money is lent out
    pub fn lending_outflow(
        lending_id: Uuid,
        budget_id: Uuid,
        borrower_name: &str,
        principal: Amount,
        lent_at: DateTime<Utc>,
        lending_notes: Option<&str>,
    ) -> Self {
        let kind = PairedKind::LendingOutflow;
        Self {
            kind,
            source_id: lending_id,
            budget_id,
            name: kind.expense_name(borrower_name),
            category: kind.category(),
            amount: kind.signed_amount(principal),
            date: lent_at,
            notes: format!(
                "Automatic expense for lending: {}",
                lending_notes.unwrap_or("Money lent out")
            ),
        }
    }

    /// Negative expense (income) recorded when a lending is paid back
    pub fn lending_repayment(
        lending_id: Uuid,
        budget_id: Uuid,
        borrower_name: &str,
        principal: Amount,
        repaid_at: DateTime<Utc>,
    ) -> Self {
        let kind = PairedKind::LendingRepayment;
        Self {
            kind,
            source_id: lending_id,
            budget_id,
            name: kind.expense_name(borrower_name),
            category: kind.category(),
            amount: kind.signed_amount(principal),
            date: repaid_at,
            notes: format!(
                "Automatic income for loan repayment from {}",
                borrower_name
            ),
        }
    }
}

/// How to find a previously generated expense for removal
#[derive(Debug, Clone, PartialEq)]
pub struct PairedLookup {
    pub kind: PairedKind,
    pub source_id: Uuid,
    pub budget_id: Uuid,
    /// Name used by the unlinked fallback match
    pub name: String,
    /// Amount used by the unlinked fallback match
    pub amount: Decimal,
}

impl PairedLookup {
    pub fn new(
        kind: PairedKind,
        source_id: Uuid,
        budget_id: Uuid,
        counterparty: &str,
        principal: Amount,
    ) -> Self {
        Self {
            kind,
            source_id,
            budget_id,
            name: kind.expense_name(counterparty),
            amount: kind.signed_amount(principal).value(),
        }
    }
}

/// Change of a loan's repaid flag between two states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepaidTransition {
    /// false -> true: write the repayment expense
    MarkedRepaid,
    /// true -> false: remove the repayment expense
    Unmarked,
    Unchanged,
}

impl RepaidTransition {
    pub fn between(was_repaid: bool, is_repaid: bool) -> Self {
        match (was_repaid, is_repaid) {
            (false, true) => RepaidTransition::MarkedRepaid,
            (true, false) => RepaidTransition::Unmarked,
            _ => RepaidTransition::Unchanged,
        }
    }
}
