//! Response bodies shared across resources
//!
//! Wire names are camelCase and money is serialized as a JSON number.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::handlers::{BudgetDetail, WithBudget};
use crate::repository::{Budget, Expense, Loan, User};

/// `{message}`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Budget reference embedded in expenses and loans
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRef {
    pub id: Uuid,
    pub year: i32,
    pub month_number: i32,
    pub month_name: &'static str,
}

impl From<&Budget> for BudgetRef {
    fn from(budget: &Budget) -> Self {
        Self {
            id: budget.id,
            year: budget.year,
            month_number: budget.month_number,
            month_name: budget.month_name(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetResponse {
    pub id: Uuid,
    pub year: i32,
    pub month_number: i32,
    pub month_name: &'static str,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub income: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Budget> for BudgetResponse {
    fn from(budget: &Budget) -> Self {
        Self {
            id: budget.id,
            year: budget.year,
            month_number: budget.month_number,
            month_name: budget.month_name(),
            income: budget.income,
            created_at: budget.created_at,
            updated_at: budget.updated_at,
        }
    }
}

/// Budget with its expenses, borrowings and lendings
#[derive(Debug, Serialize)]
pub struct BudgetDetailResponse {
    #[serde(flatten)]
    pub budget: BudgetResponse,
    pub expenses: Vec<ExpenseResponse>,
    pub borrowings: Vec<LoanResponse>,
    pub lendings: Vec<LoanResponse>,
}

impl From<&BudgetDetail> for BudgetDetailResponse {
    fn from(detail: &BudgetDetail) -> Self {
        Self {
            budget: BudgetResponse::from(&detail.budget),
            expenses: detail
                .expenses
                .iter()
                .map(|e| ExpenseResponse::new(e, None))
                .collect(),
            borrowings: detail
                .borrowings
                .iter()
                .map(|l| LoanResponse::borrowing(l, None))
                .collect(),
            lendings: detail
                .lendings
                .iter()
                .map(|l| LoanResponse::lending(l, None))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    pub id: Uuid,
    pub budget_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetRef>,
    pub name: String,
    pub category: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExpenseResponse {
    pub fn new(expense: &Expense, budget: Option<&Budget>) -> Self {
        Self {
            id: expense.id,
            budget_id: expense.budget_id,
            budget: budget.map(BudgetRef::from),
            name: expense.name.clone(),
            category: expense.category.clone(),
            amount: expense.amount,
            date: expense.date,
            notes: expense.notes.clone(),
            source_kind: expense.source_kind.clone(),
            source_id: expense.source_id,
            created_at: expense.created_at,
            updated_at: expense.updated_at,
        }
    }
}

impl From<&WithBudget<Expense>> for ExpenseResponse {
    fn from(value: &WithBudget<Expense>) -> Self {
        Self::new(&value.record, value.budget.as_ref())
    }
}

/// Counterparty under its kind-specific key
#[derive(Debug, Serialize)]
pub enum Counterparty {
    #[serde(rename = "lenderName")]
    Lender(String),
    #[serde(rename = "borrowerName")]
    Borrower(String),
}

/// A borrowing or a lending
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanResponse {
    pub id: Uuid,
    pub budget_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetRef>,
    #[serde(flatten)]
    pub counterparty: Counterparty,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub is_repaid: bool,
    pub repaid_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoanResponse {
    fn new(loan: &Loan, budget: Option<&Budget>, counterparty: Counterparty) -> Self {
        Self {
            id: loan.id,
            budget_id: loan.budget_id,
            budget: budget.map(BudgetRef::from),
            counterparty,
            amount: loan.amount,
            date: loan.date,
            notes: loan.notes.clone(),
            is_repaid: loan.is_repaid,
            repaid_date: loan.repaid_date,
            created_at: loan.created_at,
            updated_at: loan.updated_at,
        }
    }

    pub fn borrowing(loan: &Loan, budget: Option<&Budget>) -> Self {
        Self::new(loan, budget, Counterparty::Lender(loan.counterparty.clone()))
    }

    pub fn lending(loan: &Loan, budget: Option<&Budget>) -> Self {
        Self::new(loan, budget, Counterparty::Borrower(loan.counterparty.clone()))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            picture: user.picture,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
