//! Loan Handler
//!
//! Borrowings and lendings, with the expenses they write as side effects.
//!
//! Side effects run after the loan write and are not part of its
//! transaction. A failed side effect is logged and the loan write stands.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    Amount, DomainError, LoanKind, OperationContext, PairedExpense, PairedKind, PairedLookup,
    RepaidTransition, Validator,
};
use crate::error::AppError;
use crate::repository::{
    BudgetRepository, Expense, ExpenseRepository, Loan, LoanFilter, LoanRepository, LoanUpdate,
    NewLoan,
};

use super::{
    CreateLoanCommand, CreateLoanResult, LoanQuery, RepayLoanResult, UpdateLoanCommand,
    WithBudget,
};

/// Attempts for an update whose repaid flag keeps changing underneath
const MAX_RETRIES: u32 = 3;

/// Handler for one loan kind
pub struct LoanHandler {
    kind: LoanKind,
    budgets: BudgetRepository,
    loans: LoanRepository,
    expenses: ExpenseRepository,
}

impl LoanHandler {
    pub fn new(pool: PgPool, kind: LoanKind) -> Self {
        Self {
            kind,
            budgets: BudgetRepository::new(pool.clone()),
            loans: LoanRepository::new(pool.clone(), kind),
            expenses: ExpenseRepository::new(pool),
        }
    }

    pub fn borrowings(pool: PgPool) -> Self {
        Self::new(pool, LoanKind::Borrowing)
    }

    pub fn lendings(pool: PgPool) -> Self {
        Self::new(pool, LoanKind::Lending)
    }

    fn not_found(&self) -> AppError {
        match self.kind {
            LoanKind::Borrowing => AppError::BorrowingNotFound,
            LoanKind::Lending => AppError::LendingNotFound,
        }
    }

    /// Record a loan, then write the expense its kind produces on creation
    pub async fn create(
        &self,
        command: CreateLoanCommand,
        context: &OperationContext,
    ) -> Result<CreateLoanResult, AppError> {
        let mut v = Validator::new();
        let counterparty = v.name(
            self.kind.counterparty_field(),
            &command.counterparty,
            self.kind.counterparty_label(),
        );
        let amount = v.amount("amount", command.amount);
        let date = v.date("date", &command.date);
        let notes = v.notes("notes", command.notes.as_deref());
        let (counterparty, amount, date, notes) =
            v.finish(|| Some((counterparty?, amount?, date?, notes?)))?;

        let budget = self
            .budgets
            .find(context.user_id, command.budget_id)
            .await?
            .ok_or(AppError::BudgetNotFound)?;

        let loan = self
            .loans
            .insert(
                context.user_id,
                &NewLoan {
                    budget_id: budget.id,
                    counterparty,
                    amount,
                    date,
                    notes,
                },
            )
            .await?;

        tracing::info!(
            correlation_id = ?context.correlation_id,
            kind = self.kind.resource(),
            loan_id = %loan.id,
            budget_id = %budget.id,
            amount = %loan.amount,
            "Loan created"
        );

        let (paired, paired_failed) = match self.kind.created_pair() {
            Some(PairedKind::LendingOutflow) => {
                let outflow = PairedExpense::lending_outflow(
                    loan.id,
                    loan.budget_id,
                    &loan.counterparty,
                    amount,
                    loan.date,
                    loan.notes.as_deref(),
                );
                let written = self.write_pair(&outflow, context).await;
                let failed = written.is_none();
                (written, failed)
            }
            _ => (None, false),
        };

        Ok(CreateLoanResult {
            kind: self.kind,
            loan,
            paired,
            paired_failed,
        })
    }

    pub async fn list(
        &self,
        query: LoanQuery,
        context: &OperationContext,
    ) -> Result<Vec<WithBudget<Loan>>, AppError> {
        let mut v = Validator::new();
        let start_date = v.optional(query.start_date.as_deref(), |v, d| v.date("startDate", d));
        let end_date = v.optional(query.end_date.as_deref(), |v, d| v.date("endDate", d));
        let (start_date, end_date) = v.finish(|| Some((start_date?, end_date?)))?;

        if let Some(budget_id) = query.budget_id {
            self.budgets
                .find(context.user_id, budget_id)
                .await?
                .ok_or(AppError::BudgetNotFound)?;
        }

        let filter = LoanFilter {
            budget_id: query.budget_id,
            is_repaid: query.is_repaid,
            start_date,
            end_date,
        };
        let loans = self.loans.list(context.user_id, &filter).await?;

        let mut budget_ids: Vec<Uuid> = loans.iter().map(|l| l.budget_id).collect();
        budget_ids.sort_unstable();
        budget_ids.dedup();
        let budgets: HashMap<Uuid, _> = self
            .budgets
            .find_many(context.user_id, &budget_ids)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        Ok(loans
            .into_iter()
            .map(|loan| WithBudget {
                budget: budgets.get(&loan.budget_id).cloned(),
                record: loan,
            })
            .collect())
    }

    pub async fn get(
        &self,
        loan_id: Uuid,
        context: &OperationContext,
    ) -> Result<WithBudget<Loan>, AppError> {
        let loan = self
            .loans
            .find(context.user_id, loan_id)
            .await?
            .ok_or_else(|| self.not_found())?;
        self.with_budget(loan, context).await
    }

    /// Mark a loan repaid now.
    ///
    /// Only the unrepaid -> repaid flip writes the repayment expense; a loan
    /// that is already repaid is returned unchanged.
    pub async fn repay(
        &self,
        loan_id: Uuid,
        context: &OperationContext,
    ) -> Result<WithBudget<RepayLoanResult>, AppError> {
        let now = Utc::now();

        let Some(loan) = self.loans.mark_repaid(context.user_id, loan_id, now).await? else {
            let loan = self
                .loans
                .find(context.user_id, loan_id)
                .await?
                .ok_or_else(|| self.not_found())?;

            tracing::debug!(
                correlation_id = ?context.correlation_id,
                kind = self.kind.resource(),
                loan_id = %loan.id,
                "Loan already repaid, nothing to record"
            );
            let budget = self.budgets.find(context.user_id, loan.budget_id).await?;
            return Ok(WithBudget {
                record: RepayLoanResult {
                    loan,
                    paired: None,
                    transitioned: false,
                },
                budget,
            });
        };

        let paired = self.record_repayment(&loan, now, context).await?;
        let budget = self.budgets.find(context.user_id, loan.budget_id).await?;

        Ok(WithBudget {
            record: RepayLoanResult {
                loan,
                paired,
                transitioned: true,
            },
            budget,
        })
    }

    /// Partial update. Repaid flips run the same side effects as `repay`
    /// and its reversal.
    pub async fn update(
        &self,
        command: UpdateLoanCommand,
        context: &OperationContext,
    ) -> Result<WithBudget<Loan>, AppError> {
        let mut v = Validator::new();
        let counterparty = v.optional(command.counterparty.as_deref(), |v, c| {
            v.name(
                self.kind.counterparty_field(),
                c,
                self.kind.counterparty_label(),
            )
        });
        let amount = v.optional(command.amount, |v, a| v.amount("amount", a));
        let date = v.optional(command.date.as_deref(), |v, d| v.date("date", d));
        let notes = v.optional(command.notes.as_deref(), |v, n| v.notes("notes", Some(n)));
        let repaid_date = v.optional(command.repaid_date.as_deref(), |v, d| {
            v.date("repaidDate", d)
        });
        let (counterparty, amount, date, notes, repaid_date) =
            v.finish(|| Some((counterparty?, amount?, date?, notes?, repaid_date?)))?;

        for attempt in 0..MAX_RETRIES {
            let existing = self
                .loans
                .find(context.user_id, command.loan_id)
                .await?
                .ok_or_else(|| self.not_found())?;

            let (is_repaid, resolved_date) =
                resolve_repaid(&existing, command.is_repaid, repaid_date, Utc::now());

            let update = LoanUpdate {
                counterparty: counterparty.clone(),
                amount,
                date,
                notes: notes.clone(),
                is_repaid,
                repaid_date: resolved_date,
            };

            let Some(updated) = self
                .loans
                .update_if_repaid(context.user_id, existing.id, existing.is_repaid, &update)
                .await?
            else {
                tracing::warn!(
                    correlation_id = ?context.correlation_id,
                    kind = self.kind.resource(),
                    loan_id = %existing.id,
                    "Repaid flag changed during update, retrying (attempt {}/{})",
                    attempt + 1,
                    MAX_RETRIES
                );
                continue;
            };

            match RepaidTransition::between(existing.is_repaid, updated.is_repaid) {
                RepaidTransition::MarkedRepaid => {
                    let at = updated.repaid_date.unwrap_or_else(Utc::now);
                    self.record_repayment(&updated, at, context).await?;
                }
                RepaidTransition::Unmarked => {
                    // The repayment row was written from the pre-update values
                    self.remove_pair(self.kind.repaid_pair(), &existing, context)
                        .await?;
                }
                RepaidTransition::Unchanged => {}
            }

            tracing::debug!(
                correlation_id = ?context.correlation_id,
                kind = self.kind.resource(),
                loan_id = %updated.id,
                "Loan updated"
            );
            return self.with_budget(updated, context).await;
        }

        Err(AppError::ConcurrentModification)
    }

    /// Delete a loan and, best-effort, the expenses it produced
    pub async fn delete(&self, loan_id: Uuid, context: &OperationContext) -> Result<(), AppError> {
        let loan = self
            .loans
            .delete(context.user_id, loan_id)
            .await?
            .ok_or_else(|| self.not_found())?;

        tracing::info!(
            correlation_id = ?context.correlation_id,
            kind = self.kind.resource(),
            loan_id = %loan.id,
            "Loan deleted"
        );

        for kind in self.kind.owned_pairs() {
            if kind == self.kind.repaid_pair() && !loan.is_repaid {
                continue;
            }
            self.remove_pair(kind, &loan, context).await?;
        }

        Ok(())
    }

    async fn record_repayment(
        &self,
        loan: &Loan,
        repaid_at: DateTime<Utc>,
        context: &OperationContext,
    ) -> Result<Option<Expense>, AppError> {
        let principal = principal(loan)?;
        let repayment = self.kind.repayment_expense(
            loan.id,
            loan.budget_id,
            &loan.counterparty,
            principal,
            repaid_at,
        );
        Ok(self.write_pair(&repayment, context).await)
    }

    /// Insert a generated expense. Failures are logged, not returned.
    async fn write_pair(
        &self,
        paired: &PairedExpense,
        context: &OperationContext,
    ) -> Option<Expense> {
        match self.expenses.insert_paired(context.user_id, paired).await {
            Ok(expense) => {
                tracing::info!(
                    correlation_id = ?context.correlation_id,
                    source_kind = paired.kind.as_str(),
                    source_id = %paired.source_id,
                    expense_id = %expense.id,
                    amount = %expense.amount,
                    "Paired expense recorded"
                );
                Some(expense)
            }
            Err(e) => {
                tracing::error!(
                    correlation_id = ?context.correlation_id,
                    source_kind = paired.kind.as_str(),
                    source_id = %paired.source_id,
                    error = %e,
                    "Failed to record paired expense"
                );
                None
            }
        }
    }

    /// Remove one generated expense. Failures are logged, not returned.
    async fn remove_pair(
        &self,
        kind: PairedKind,
        loan: &Loan,
        context: &OperationContext,
    ) -> Result<(), AppError> {
        let lookup = PairedLookup::new(
            kind,
            loan.id,
            loan.budget_id,
            &loan.counterparty,
            principal(loan)?,
        );

        match self.expenses.delete_paired(context.user_id, &lookup).await {
            Ok(Some(expense_id)) => {
                tracing::info!(
                    correlation_id = ?context.correlation_id,
                    source_kind = kind.as_str(),
                    source_id = %loan.id,
                    expense_id = %expense_id,
                    "Paired expense removed"
                );
            }
            Ok(None) => {
                tracing::warn!(
                    correlation_id = ?context.correlation_id,
                    source_kind = kind.as_str(),
                    source_id = %loan.id,
                    "No paired expense found to remove"
                );
            }
            Err(e) => {
                tracing::error!(
                    correlation_id = ?context.correlation_id,
                    source_kind = kind.as_str(),
                    source_id = %loan.id,
                    error = %e,
                    "Failed to remove paired expense"
                );
            }
        }
        Ok(())
    }

    async fn with_budget(
        &self,
        loan: Loan,
        context: &OperationContext,
    ) -> Result<WithBudget<Loan>, AppError> {
        let budget = self.budgets.find(context.user_id, loan.budget_id).await?;
        Ok(WithBudget {
            record: loan,
            budget,
        })
    }
}

fn principal(loan: &Loan) -> Result<Amount, AppError> {
    Ok(loan.principal().map_err(DomainError::from)?)
}

/// Final `(is_repaid, repaid_date)` for an update.
///
/// `isRepaid: true` keeps a given date, else an existing one, else now.
/// `isRepaid: false` clears the date. A bare `repaidDate` only applies to a
/// loan that is already repaid.
pub(crate) fn resolve_repaid(
    existing: &Loan,
    requested: Option<bool>,
    repaid_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (bool, Option<DateTime<Utc>>) {
    match requested {
        Some(true) => {
            let kept = existing.is_repaid.then_some(existing.repaid_date).flatten();
            (true, repaid_date.or(kept).or(Some(now)))
        }
        Some(false) => (false, None),
        None if existing.is_repaid => (true, repaid_date.or(existing.repaid_date)),
        None => (false, existing.repaid_date),
    }
}
