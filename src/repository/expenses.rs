//! Expense repository
//!
//! Also owns the storage side of paired transactions: inserting generated
//! expenses with their source link and removing them again.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::{Amount, ExpenseCategory, PairedExpense, PairedLookup, SignedAmount};

/// Expense record from database
#[derive(Debug, Clone, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub budget_id: Uuid,
    pub name: String,
    pub category: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub source_kind: Option<String>,
    pub source_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user-entered expense
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub budget_id: Uuid,
    pub name: String,
    pub category: ExpenseCategory,
    pub amount: SignedAmount,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Partial update; `None` leaves a column unchanged
#[derive(Debug, Clone, Default)]
pub struct ExpenseChanges {
    pub name: Option<String>,
    pub category: Option<ExpenseCategory>,
    pub amount: Option<Amount>,
    pub date: Option<DateTime<Utc>>,
    /// `Some(None)` clears the notes
    pub notes: Option<Option<String>>,
}

impl ExpenseChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.amount.is_none()
            && self.date.is_none()
            && self.notes.is_none()
    }
}

/// List filters
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub budget_id: Option<Uuid>,
    pub category: Option<ExpenseCategory>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

const EXPENSE_COLUMNS: &str = "id, user_id, budget_id, name, category, amount, date, notes, \
                               source_kind, source_id, created_at, updated_at";

/// Expense repository
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: PgPool,
}

impl ExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, user_id: Uuid, expense: &NewExpense) -> Result<Expense, sqlx::Error> {
        sqlx::query_as::<_, Expense>(&format!(
            r#"
            INSERT INTO expenses (id, user_id, budget_id, name, category, amount, date, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(expense.budget_id)
        .bind(&expense.name)
        .bind(expense.category.as_str())
        .bind(expense.amount.value())
        .bind(expense.date)
        .bind(&expense.notes)
        .fetch_one(&self.pool)
        .await
    }

    /// Insert an expense generated by a loan, linked back to it
    pub async fn insert_paired(
        &self,
        user_id: Uuid,
        paired: &PairedExpense,
    ) -> Result<Expense, sqlx::Error> {
        sqlx::query_as::<_, Expense>(&format!(
            r#"
            INSERT INTO expenses (
                id, user_id, budget_id, name, category, amount, date, notes,
                source_kind, source_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(paired.budget_id)
        .bind(&paired.name)
        .bind(paired.category.as_str())
        .bind(paired.amount.value())
        .bind(paired.date)
        .bind(&paired.notes)
        .bind(paired.kind.as_str())
        .bind(paired.source_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Remove one generated expense.
    ///
    /// Prefers a row linked to the source loan; otherwise takes the newest
    /// unlinked row in the same budget with the expected name and amount.
    /// Returns the id of the removed row.
    pub async fn delete_paired(
        &self,
        user_id: Uuid,
        lookup: &PairedLookup,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            DELETE FROM expenses
            WHERE id = (
                SELECT id FROM expenses
                WHERE user_id = $1
                  AND (
                        (source_kind = $2 AND source_id = $3)
                     OR (source_kind IS NULL AND budget_id = $4 AND name = $5 AND amount = $6)
                  )
                ORDER BY (source_kind IS NOT NULL) DESC, created_at DESC
                LIMIT 1
            )
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(lookup.kind.as_str())
        .bind(lookup.source_id)
        .bind(lookup.budget_id)
        .bind(&lookup.name)
        .bind(lookup.amount)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find(&self, user_id: Uuid, expense_id: Uuid) -> Result<Option<Expense>, sqlx::Error> {
        sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1 AND user_id = $2"
        ))
        .bind(expense_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Filtered list, newest date first
    pub async fn list(&self, user_id: Uuid, filter: &ExpenseFilter) -> Result<Vec<Expense>, sqlx::Error> {
        sqlx::query_as::<_, Expense>(&format!(
            r#"
            SELECT {EXPENSE_COLUMNS} FROM expenses
            WHERE user_id = $1
              AND ($2::uuid IS NULL OR budget_id = $2)
              AND ($3::text IS NULL OR category = $3)
              AND ($4::timestamptz IS NULL OR date >= $4)
              AND ($5::timestamptz IS NULL OR date <= $5)
            ORDER BY date DESC, created_at DESC
            "#
        ))
        .bind(user_id)
        .bind(filter.budget_id)
        .bind(filter.category.map(|c| c.as_str()))
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.pool)
        .await
    }

    /// Expenses of several budgets, newest date first
    pub async fn list_for_budgets(&self, budget_ids: &[Uuid]) -> Result<Vec<Expense>, sqlx::Error> {
        if budget_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Expense>(&format!(
            r#"
            SELECT {EXPENSE_COLUMNS} FROM expenses
            WHERE budget_id = ANY($1)
            ORDER BY date DESC, created_at DESC
            "#
        ))
        .bind(budget_ids)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
        changes: &ExpenseChanges,
    ) -> Result<Option<Expense>, sqlx::Error> {
        if changes.is_empty() {
            return self.find(user_id, expense_id).await;
        }

        let (notes_set, notes) = match &changes.notes {
            Some(notes) => (true, notes.clone()),
            None => (false, None),
        };

        sqlx::query_as::<_, Expense>(&format!(
            r#"
            UPDATE expenses
            SET name = COALESCE($3, name),
                category = COALESCE($4, category),
                amount = COALESCE($5, amount),
                date = COALESCE($6, date),
                notes = CASE WHEN $7 THEN $8 ELSE notes END,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(expense_id)
        .bind(user_id)
        .bind(&changes.name)
        .bind(changes.category.map(|c| c.as_str()))
        .bind(changes.amount.map(|a| a.value()))
        .bind(changes.date)
        .bind(notes_set)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete(&self, user_id: Uuid, expense_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND user_id = $2")
            .bind(expense_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
