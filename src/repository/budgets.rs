//! Budget repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::{month_name, BudgetPeriod, Income};

/// Budget record from database
#[derive(Debug, Clone, FromRow)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub year: i32,
    pub month_number: i32,
    pub income: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    pub fn month_name(&self) -> &'static str {
        u32::try_from(self.month_number).map(month_name).unwrap_or("")
    }
}

const BUDGET_COLUMNS: &str = "id, user_id, year, month_number, income, created_at, updated_at";

/// Budget repository
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    pool: PgPool,
}

impl BudgetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a budget. A duplicate period surfaces as a unique violation.
    pub async fn insert(
        &self,
        user_id: Uuid,
        period: BudgetPeriod,
        income: Income,
    ) -> Result<Budget, sqlx::Error> {
        sqlx::query_as::<_, Budget>(&format!(
            r#"
            INSERT INTO budgets (id, user_id, year, month_number, income)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {BUDGET_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(period.year())
        .bind(period.month() as i32)
        .bind(income.value())
        .fetch_one(&self.pool)
        .await
    }

    pub async fn exists_for_period(
        &self,
        user_id: Uuid,
        period: BudgetPeriod,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM budgets
                WHERE user_id = $1 AND year = $2 AND month_number = $3
            )
            "#,
        )
        .bind(user_id)
        .bind(period.year())
        .bind(period.month() as i32)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find(&self, user_id: Uuid, budget_id: Uuid) -> Result<Option<Budget>, sqlx::Error> {
        sqlx::query_as::<_, Budget>(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budgets WHERE id = $1 AND user_id = $2"
        ))
        .bind(budget_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Fetch several budgets by id, scoped to the owner
    pub async fn find_many(&self, user_id: Uuid, ids: &[Uuid]) -> Result<Vec<Budget>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Budget>(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budgets WHERE user_id = $1 AND id = ANY($2)"
        ))
        .bind(user_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await
    }

    /// All budgets of a user, newest period first
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Budget>, sqlx::Error> {
        sqlx::query_as::<_, Budget>(&format!(
            r#"
            SELECT {BUDGET_COLUMNS} FROM budgets
            WHERE user_id = $1
            ORDER BY year DESC, month_number DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn update_income(
        &self,
        user_id: Uuid,
        budget_id: Uuid,
        income: Income,
    ) -> Result<Option<Budget>, sqlx::Error> {
        sqlx::query_as::<_, Budget>(&format!(
            r#"
            UPDATE budgets SET income = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {BUDGET_COLUMNS}
            "#
        ))
        .bind(budget_id)
        .bind(user_id)
        .bind(income.value())
        .fetch_optional(&self.pool)
        .await
    }

    /// Delete a budget together with its expenses, borrowings and lendings.
    ///
    /// Runs in one transaction. Returns false if the budget does not exist.
    pub async fn delete_with_children(
        &self,
        user_id: Uuid,
        budget_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM budgets WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(budget_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if owned.is_none() {
            tx.rollback().await?;
            return Ok(false);
        }

        for table in ["expenses", "borrowings", "lendings"] {
            let result = sqlx::query(&format!("DELETE FROM {table} WHERE budget_id = $1"))
                .bind(budget_id)
                .execute(&mut *tx)
                .await?;
            tracing::debug!(
                budget_id = %budget_id,
                table = table,
                rows_deleted = result.rows_affected(),
                "Deleted budget children"
            );
        }

        sqlx::query("DELETE FROM budgets WHERE id = $1")
            .bind(budget_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(month_number: i32) -> Budget {
        Budget {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            year: 2024,
            month_number,
            income: Decimal::from(50000),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_month_name() {
        assert_eq!(budget(2).month_name(), "February");
        assert_eq!(budget(-1).month_name(), "");
    }
}
