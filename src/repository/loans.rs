//! Borrowing and lending repository
//!
//! Both tables share one layout apart from the counterparty column, which is
//! read back under the alias `counterparty`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::{Amount, LoanKind};

/// Borrowing or lending record from database
#[derive(Debug, Clone, FromRow)]
pub struct Loan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub budget_id: Uuid,
    pub counterparty: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub is_repaid: bool,
    pub repaid_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// Stored principal as a validated amount
    pub fn principal(&self) -> Result<Amount, crate::domain::AmountError> {
        Amount::new(self.amount)
    }
}

/// A new borrowing or lending
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub budget_id: Uuid,
    pub counterparty: String,
    pub amount: Amount,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Resolved state written by a loan update.
///
/// Field edits are partial; the repaid pair is always written as given.
#[derive(Debug, Clone)]
pub struct LoanUpdate {
    pub counterparty: Option<String>,
    pub amount: Option<Amount>,
    pub date: Option<DateTime<Utc>>,
    /// `Some(None)` clears the notes
    pub notes: Option<Option<String>>,
    pub is_repaid: bool,
    pub repaid_date: Option<DateTime<Utc>>,
}

/// List filters
#[derive(Debug, Clone, Default)]
pub struct LoanFilter {
    pub budget_id: Option<Uuid>,
    pub is_repaid: Option<bool>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

fn table(kind: LoanKind) -> &'static str {
    match kind {
        LoanKind::Borrowing => "borrowings",
        LoanKind::Lending => "lendings",
    }
}

fn counterparty_column(kind: LoanKind) -> &'static str {
    match kind {
        LoanKind::Borrowing => "lender_name",
        LoanKind::Lending => "borrower_name",
    }
}

fn columns(kind: LoanKind) -> String {
    format!(
        "id, user_id, budget_id, {} AS counterparty, amount, date, notes, \
         is_repaid, repaid_date, created_at, updated_at",
        counterparty_column(kind)
    )
}

/// Repository over one loan table
#[derive(Debug, Clone)]
pub struct LoanRepository {
    pool: PgPool,
    kind: LoanKind,
}

impl LoanRepository {
    pub fn new(pool: PgPool, kind: LoanKind) -> Self {
        Self { pool, kind }
    }

    pub fn borrowings(pool: PgPool) -> Self {
        Self::new(pool, LoanKind::Borrowing)
    }

    pub fn lendings(pool: PgPool) -> Self {
        Self::new(pool, LoanKind::Lending)
    }

    pub async fn insert(&self, user_id: Uuid, loan: &NewLoan) -> Result<Loan, sqlx::Error> {
        sqlx::query_as::<_, Loan>(&format!(
            r#"
            INSERT INTO {table} (id, user_id, budget_id, {counterparty}, amount, date, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {columns}
            "#,
            table = table(self.kind),
            counterparty = counterparty_column(self.kind),
            columns = columns(self.kind),
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(loan.budget_id)
        .bind(&loan.counterparty)
        .bind(loan.amount.value())
        .bind(loan.date)
        .bind(&loan.notes)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find(&self, user_id: Uuid, loan_id: Uuid) -> Result<Option<Loan>, sqlx::Error> {
        sqlx::query_as::<_, Loan>(&format!(
            "SELECT {} FROM {} WHERE id = $1 AND user_id = $2",
            columns(self.kind),
            table(self.kind),
        ))
        .bind(loan_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Filtered list, newest date first
    pub async fn list(&self, user_id: Uuid, filter: &LoanFilter) -> Result<Vec<Loan>, sqlx::Error> {
        sqlx::query_as::<_, Loan>(&format!(
            r#"
            SELECT {columns} FROM {table}
            WHERE user_id = $1
              AND ($2::uuid IS NULL OR budget_id = $2)
              AND ($3::boolean IS NULL OR is_repaid = $3)
              AND ($4::timestamptz IS NULL OR date >= $4)
              AND ($5::timestamptz IS NULL OR date <= $5)
            ORDER BY date DESC, created_at DESC
            "#,
            columns = columns(self.kind),
            table = table(self.kind),
        ))
        .bind(user_id)
        .bind(filter.budget_id)
        .bind(filter.is_repaid)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.pool)
        .await
    }

    /// Loans of several budgets, newest date first
    pub async fn list_for_budgets(&self, budget_ids: &[Uuid]) -> Result<Vec<Loan>, sqlx::Error> {
        if budget_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Loan>(&format!(
            r#"
            SELECT {columns} FROM {table}
            WHERE budget_id = ANY($1)
            ORDER BY date DESC, created_at DESC
            "#,
            columns = columns(self.kind),
            table = table(self.kind),
        ))
        .bind(budget_ids)
        .fetch_all(&self.pool)
        .await
    }

    /// Apply an update only if the repaid flag still equals `expected_repaid`.
    ///
    /// Returns None when the row is missing or its flag changed underneath.
    pub async fn update_if_repaid(
        &self,
        user_id: Uuid,
        loan_id: Uuid,
        expected_repaid: bool,
        update: &LoanUpdate,
    ) -> Result<Option<Loan>, sqlx::Error> {
        let (notes_set, notes) = match &update.notes {
            Some(notes) => (true, notes.clone()),
            None => (false, None),
        };

        sqlx::query_as::<_, Loan>(&format!(
            r#"
            UPDATE {table}
            SET {counterparty} = COALESCE($4, {counterparty}),
                amount = COALESCE($5, amount),
                date = COALESCE($6, date),
                notes = CASE WHEN $7 THEN $8 ELSE notes END,
                is_repaid = $9,
                repaid_date = $10,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND is_repaid = $3
            RETURNING {columns}
            "#,
            table = table(self.kind),
            counterparty = counterparty_column(self.kind),
            columns = columns(self.kind),
        ))
        .bind(loan_id)
        .bind(user_id)
        .bind(expected_repaid)
        .bind(&update.counterparty)
        .bind(update.amount.map(|a| a.value()))
        .bind(update.date)
        .bind(notes_set)
        .bind(notes)
        .bind(update.is_repaid)
        .bind(update.repaid_date)
        .fetch_optional(&self.pool)
        .await
    }

    /// Flip an unrepaid loan to repaid. None if missing or already repaid.
    pub async fn mark_repaid(
        &self,
        user_id: Uuid,
        loan_id: Uuid,
        repaid_at: DateTime<Utc>,
    ) -> Result<Option<Loan>, sqlx::Error> {
        sqlx::query_as::<_, Loan>(&format!(
            r#"
            UPDATE {table}
            SET is_repaid = TRUE, repaid_date = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND is_repaid = FALSE
            RETURNING {columns}
            "#,
            table = table(self.kind),
            columns = columns(self.kind),
        ))
        .bind(loan_id)
        .bind(user_id)
        .bind(repaid_at)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete(&self, user_id: Uuid, loan_id: Uuid) -> Result<Option<Loan>, sqlx::Error> {
        sqlx::query_as::<_, Loan>(&format!(
            "DELETE FROM {} WHERE id = $1 AND user_id = $2 RETURNING {}",
            table(self.kind),
            columns(self.kind),
        ))
        .bind(loan_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_alias_counterparty() {
        assert!(columns(LoanKind::Borrowing).contains("lender_name AS counterparty"));
        assert!(columns(LoanKind::Lending).contains("borrower_name AS counterparty"));
    }

    #[test]
    fn test_tables() {
        assert_eq!(table(LoanKind::Borrowing), "borrowings");
        assert_eq!(table(LoanKind::Lending), "lendings");
    }
}
