//! Budget Handler
//!
//! Budget periods and the views that gather a period's records.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{BudgetSummary, DomainError, LoanLine, OperationContext, Validator};
use crate::error::AppError;
use crate::repository::{Budget, BudgetRepository, ExpenseRepository, Loan, LoanRepository};

use super::{BudgetDetail, CreateBudgetCommand, UpdateBudgetCommand};

/// Handler for budget commands and queries
pub struct BudgetHandler {
    budgets: BudgetRepository,
    expenses: ExpenseRepository,
    borrowings: LoanRepository,
    lendings: LoanRepository,
}

impl BudgetHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            budgets: BudgetRepository::new(pool.clone()),
            expenses: ExpenseRepository::new(pool.clone()),
            borrowings: LoanRepository::borrowings(pool.clone()),
            lendings: LoanRepository::lendings(pool),
        }
    }

    /// Open a budget for a (year, month) the caller has not used yet
    pub async fn create(
        &self,
        command: CreateBudgetCommand,
        context: &OperationContext,
    ) -> Result<Budget, AppError> {
        let mut v = Validator::new();
        let period = v.period(command.year, command.month_number);
        let income = v.income("income", command.income);
        let (period, income) = v.finish(|| Some((period?, income?)))?;

        if self.budgets.exists_for_period(context.user_id, period).await? {
            return Err(DomainError::BudgetExists {
                year: period.year(),
                month: period.month(),
            }
            .into());
        }

        // The unique key still guards against a concurrent create
        let budget = self
            .budgets
            .insert(context.user_id, period, income)
            .await
            .map_err(|e| AppError::from_budget_insert(e, period.year(), period.month()))?;

        tracing::info!(
            correlation_id = ?context.correlation_id,
            budget_id = %budget.id,
            year = budget.year,
            month = budget.month_number,
            "Budget created"
        );
        Ok(budget)
    }

    /// Every budget of the caller, newest first, with its records
    pub async fn list(&self, context: &OperationContext) -> Result<Vec<BudgetDetail>, AppError> {
        let budgets = self.budgets.list(context.user_id).await?;
        self.populate(budgets).await
    }

    pub async fn get(
        &self,
        budget_id: Uuid,
        context: &OperationContext,
    ) -> Result<BudgetDetail, AppError> {
        let budget = self.find(budget_id, context).await?;
        self.populate(vec![budget])
            .await?
            .pop()
            .ok_or(AppError::BudgetNotFound)
    }

    /// Owned budget or `BudgetNotFound`
    pub async fn find(
        &self,
        budget_id: Uuid,
        context: &OperationContext,
    ) -> Result<Budget, AppError> {
        self.budgets
            .find(context.user_id, budget_id)
            .await?
            .ok_or(AppError::BudgetNotFound)
    }

    pub async fn update(
        &self,
        command: UpdateBudgetCommand,
        context: &OperationContext,
    ) -> Result<Budget, AppError> {
        let mut v = Validator::new();
        let income = v.income("income", command.income);
        let income = v.finish(|| income)?;

        self.budgets
            .update_income(context.user_id, command.budget_id, income)
            .await?
            .ok_or(AppError::BudgetNotFound)
    }

    /// Delete a budget and everything recorded against it
    pub async fn delete(&self, budget_id: Uuid, context: &OperationContext) -> Result<(), AppError> {
        if !self
            .budgets
            .delete_with_children(context.user_id, budget_id)
            .await?
        {
            return Err(AppError::BudgetNotFound);
        }

        tracing::info!(
            correlation_id = ?context.correlation_id,
            budget_id = %budget_id,
            "Budget deleted with its records"
        );
        Ok(())
    }

    pub async fn summary(
        &self,
        budget_id: Uuid,
        context: &OperationContext,
    ) -> Result<BudgetSummary, AppError> {
        let detail = self.get(budget_id, context).await?;
        Ok(summarize(&detail))
    }

    async fn populate(&self, budgets: Vec<Budget>) -> Result<Vec<BudgetDetail>, AppError> {
        let ids: Vec<Uuid> = budgets.iter().map(|b| b.id).collect();

        let (expenses, borrowings, lendings) = tokio::try_join!(
            self.expenses.list_for_budgets(&ids),
            self.borrowings.list_for_budgets(&ids),
            self.lendings.list_for_budgets(&ids),
        )?;

        Ok(budgets
            .into_iter()
            .map(|budget| {
                let id = budget.id;
                BudgetDetail {
                    budget,
                    expenses: expenses.iter().filter(|e| e.budget_id == id).cloned().collect(),
                    borrowings: borrowings.iter().filter(|l| l.budget_id == id).cloned().collect(),
                    lendings: lendings.iter().filter(|l| l.budget_id == id).cloned().collect(),
                }
            })
            .collect())
    }
}

fn loan_lines(loans: &[Loan]) -> Vec<LoanLine> {
    loans
        .iter()
        .map(|l| LoanLine {
            amount: l.amount,
            is_repaid: l.is_repaid,
        })
        .collect()
}

/// Aggregate a populated budget
pub fn summarize(detail: &BudgetDetail) -> BudgetSummary {
    BudgetSummary::compute(
        detail.budget.income,
        detail
            .expenses
            .iter()
            .map(|e| (e.category.as_str(), e.amount)),
        &loan_lines(&detail.borrowings),
        &loan_lines(&detail.lendings),
    )
}
