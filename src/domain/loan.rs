//! Loan kinds
//!
//! Borrowings (money owed to a lender) and lendings (money owed by a
//! borrower) share one shape and differ only in naming and in which paired
//! expenses they produce.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Amount, PairedExpense, PairedKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoanKind {
    Borrowing,
    Lending,
}

impl LoanKind {
    /// Resource name used in messages ("Borrowing not found")
    pub fn resource(&self) -> &'static str {
        match self {
            LoanKind::Borrowing => "Borrowing",
            LoanKind::Lending => "Lending",
        }
    }

    /// Request field holding the other party's name
    pub fn counterparty_field(&self) -> &'static str {
        match self {
            LoanKind::Borrowing => "lenderName",
            LoanKind::Lending => "borrowerName",
        }
    }

    /// Human label for the counterparty field
    pub fn counterparty_label(&self) -> &'static str {
        match self {
            LoanKind::Borrowing => "Lender name",
            LoanKind::Lending => "Borrower name",
        }
    }

    /// Expense written when the loan is recorded, if any
    pub fn created_pair(&self) -> Option<PairedKind> {
        match self {
            LoanKind::Borrowing => None,
            LoanKind::Lending => Some(PairedKind::LendingOutflow),
        }
    }

    /// Expense written when the loan is marked repaid
    pub fn repaid_pair(&self) -> PairedKind {
        match self {
            LoanKind::Borrowing => PairedKind::BorrowingRepayment,
            LoanKind::Lending => PairedKind::LendingRepayment,
        }
    }

    /// Every paired kind a loan of this kind can own
    pub fn owned_pairs(&self) -> Vec<PairedKind> {
        self.created_pair()
            .into_iter()
            .chain(std::iter::once(self.repaid_pair()))
            .collect()
    }

    /// Build the repayment expense for a loan
    pub fn repayment_expense(
        &self,
        loan_id: Uuid,
        budget_id: Uuid,
        counterparty: &str,
        principal: Amount,
        repaid_at: DateTime<Utc>,
    ) -> PairedExpense {
        match self {
            LoanKind::Borrowing => PairedExpense::borrowing_repayment(
                loan_id,
                budget_id,
                counterparty,
                principal,
                repaid_at,
            ),
            LoanKind::Lending => PairedExpense::lending_repayment(
                loan_id,
                budget_id,
                counterparty,
                principal,
                repaid_at,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_borrowing_pairs() {
        assert_eq!(LoanKind::Borrowing.created_pair(), None);
        assert_eq!(LoanKind::Borrowing.repaid_pair(), PairedKind::BorrowingRepayment);
        assert_eq!(
            LoanKind::Borrowing.owned_pairs(),
            vec![PairedKind::BorrowingRepayment]
        );
    }

    #[test]
    fn test_lending_pairs() {
        assert_eq!(LoanKind::Lending.created_pair(), Some(PairedKind::LendingOutflow));
        assert_eq!(
            LoanKind::Lending.owned_pairs(),
            vec![PairedKind::LendingOutflow, PairedKind::LendingRepayment]
        );
    }

    #[test]
    fn test_repayment_expense_sign_follows_kind() {
        let principal = Amount::new(Decimal::from(300)).unwrap();
        let now = Utc::now();

        let spend = LoanKind::Borrowing.repayment_expense(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Bank",
            principal,
            now,
        );
        assert!(!spend.amount.value().is_sign_negative());

        let income = LoanKind::Lending.repayment_expense(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Sam",
            principal,
            now,
        );
        assert!(income.amount.value().is_sign_negative());
    }
}
