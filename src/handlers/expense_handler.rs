//! Expense Handler

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{OperationContext, Validator};
use crate::error::AppError;
use crate::repository::{
    BudgetRepository, Expense, ExpenseChanges, ExpenseFilter, ExpenseRepository, NewExpense,
};

use super::{CreateExpenseCommand, ExpenseQuery, UpdateExpenseCommand, WithBudget};

/// Handler for user-entered expenses
pub struct ExpenseHandler {
    budgets: BudgetRepository,
    expenses: ExpenseRepository,
}

impl ExpenseHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            budgets: BudgetRepository::new(pool.clone()),
            expenses: ExpenseRepository::new(pool),
        }
    }

    pub async fn create(
        &self,
        command: CreateExpenseCommand,
        context: &OperationContext,
    ) -> Result<WithBudget<Expense>, AppError> {
        let mut v = Validator::new();
        let name = v.name("name", &command.name, "Expense name");
        let category = v.category("category", &command.category);
        let amount = v.amount("amount", command.amount);
        let date = v.date("date", &command.date);
        let notes = v.notes("notes", command.notes.as_deref());
        let (name, category, amount, date, notes) =
            v.finish(|| Some((name?, category?, amount?, date?, notes?)))?;

        let budget = self
            .budgets
            .find(context.user_id, command.budget_id)
            .await?
            .ok_or(AppError::BudgetNotFound)?;

        let expense = self
            .expenses
            .insert(
                context.user_id,
                &NewExpense {
                    budget_id: budget.id,
                    name,
                    category,
                    amount: amount.into(),
                    date,
                    notes,
                },
            )
            .await?;

        tracing::info!(
            correlation_id = ?context.correlation_id,
            expense_id = %expense.id,
            budget_id = %budget.id,
            amount = %expense.amount,
            "Expense created"
        );

        Ok(WithBudget {
            record: expense,
            budget: Some(budget),
        })
    }

    pub async fn list(
        &self,
        query: ExpenseQuery,
        context: &OperationContext,
    ) -> Result<Vec<WithBudget<Expense>>, AppError> {
        let mut v = Validator::new();
        let category = v.optional(query.category.as_deref(), |v, c| v.category("category", c));
        let start_date = v.optional(query.start_date.as_deref(), |v, d| v.date("startDate", d));
        let end_date = v.optional(query.end_date.as_deref(), |v, d| v.date("endDate", d));
        let (category, start_date, end_date) =
            v.finish(|| Some((category?, start_date?, end_date?)))?;

        if let Some(budget_id) = query.budget_id {
            self.budgets
                .find(context.user_id, budget_id)
                .await?
                .ok_or(AppError::BudgetNotFound)?;
        }

        let filter = ExpenseFilter {
            budget_id: query.budget_id,
            category,
            start_date,
            end_date,
        };
        let expenses = self.expenses.list(context.user_id, &filter).await?;

        let mut budget_ids: Vec<Uuid> = expenses.iter().map(|e| e.budget_id).collect();
        budget_ids.sort_unstable();
        budget_ids.dedup();
        let budgets: HashMap<Uuid, _> = self
            .budgets
            .find_many(context.user_id, &budget_ids)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        Ok(expenses
            .into_iter()
            .map(|expense| WithBudget {
                budget: budgets.get(&expense.budget_id).cloned(),
                record: expense,
            })
            .collect())
    }

    pub async fn get(
        &self,
        expense_id: Uuid,
        context: &OperationContext,
    ) -> Result<WithBudget<Expense>, AppError> {
        let expense = self
            .expenses
            .find(context.user_id, expense_id)
            .await?
            .ok_or(AppError::ExpenseNotFound)?;
        self.with_budget(expense, context).await
    }

    pub async fn update(
        &self,
        command: UpdateExpenseCommand,
        context: &OperationContext,
    ) -> Result<WithBudget<Expense>, AppError> {
        let mut v = Validator::new();
        let name = v.optional(command.name.as_deref(), |v, n| {
            v.name("name", n, "Expense name")
        });
        let category = v.optional(command.category.as_deref(), |v, c| {
            v.category("category", c)
        });
        let amount = v.optional(command.amount, |v, a| v.amount("amount", a));
        let date = v.optional(command.date.as_deref(), |v, d| v.date("date", d));
        let notes = v.optional(command.notes.as_deref(), |v, n| v.notes("notes", Some(n)));
        let changes = v.finish(|| {
            Some(ExpenseChanges {
                name: name?,
                category: category?,
                amount: amount?,
                date: date?,
                notes: notes?,
            })
        })?;

        let expense = self
            .expenses
            .update(context.user_id, command.expense_id, &changes)
            .await?
            .ok_or(AppError::ExpenseNotFound)?;

        tracing::debug!(
            correlation_id = ?context.correlation_id,
            expense_id = %expense.id,
            "Expense updated"
        );
        self.with_budget(expense, context).await
    }

    pub async fn delete(&self, expense_id: Uuid, context: &OperationContext) -> Result<(), AppError> {
        if !self.expenses.delete(context.user_id, expense_id).await? {
            return Err(AppError::ExpenseNotFound);
        }
        tracing::debug!(
            correlation_id = ?context.correlation_id,
            expense_id = %expense_id,
            "Expense deleted"
        );
        Ok(())
    }

    async fn with_budget(
        &self,
        expense: Expense,
        context: &OperationContext,
    ) -> Result<WithBudget<Expense>, AppError> {
        let budget = self.budgets.find(context.user_id, expense.budget_id).await?;
        Ok(WithBudget {
            record: expense,
            budget,
        })
    }
}
