//! Budget summary aggregation

use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Totals for one budget period.
///
/// `total_expenses` is the signed sum of all expenses, so repaid lendings
/// (negative rows) reduce it. Loan totals only count records that are
/// still outstanding; the counts include repaid ones.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSummary {
    pub income: Decimal,
    pub total_expenses: Decimal,
    pub remaining: Decimal,
    pub total_borrowings: Decimal,
    pub total_lendings: Decimal,
    pub by_category: BTreeMap<String, Decimal>,
    pub expense_count: usize,
    pub borrowing_count: usize,
    pub lending_count: usize,
}

/// Loan fields the summary needs
#[derive(Debug, Clone, Copy)]
pub struct LoanLine {
    pub amount: Decimal,
    pub is_repaid: bool,
}

fn outstanding(loans: &[LoanLine]) -> Decimal {
    loans
        .iter()
        .filter(|l| !l.is_repaid)
        .map(|l| l.amount)
        .sum()
}

impl BudgetSummary {
    /// Aggregate a budget from its expense `(category, amount)` pairs and loans
    pub fn compute<'a, I>(
        income: Decimal,
        expenses: I,
        borrowings: &[LoanLine],
        lendings: &[LoanLine],
    ) -> Self
    where
        I: IntoIterator<Item = (&'a str, Decimal)>,
    {
        let mut by_category: BTreeMap<String, Decimal> = BTreeMap::new();
        let mut total_expenses = Decimal::ZERO;
        let mut expense_count = 0;

        for (category, amount) in expenses {
            *by_category.entry(category.to_string()).or_default() += amount;
            total_expenses += amount;
            expense_count += 1;
        }

        Self {
            income,
            total_expenses,
            remaining: income - total_expenses,
            total_borrowings: outstanding(borrowings),
            total_lendings: outstanding(lendings),
            by_category,
            expense_count,
            borrowing_count: borrowings.len(),
            lending_count: lendings.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_budget() {
        let summary = BudgetSummary::compute(dec!(50000), Vec::<(&str, Decimal)>::new(), &[], &[]);
        assert_eq!(summary.total_expenses, Decimal::ZERO);
        assert_eq!(summary.remaining, dec!(50000));
        assert!(summary.by_category.is_empty());
        assert_eq!(summary.expense_count, 0);
    }

    #[test]
    fn test_groups_by_category() {
        let expenses = vec![
            ("Food & Dining", dec!(250.50)),
            ("Transportation", dec!(100)),
            ("Food & Dining", dec!(49.50)),
        ];
        let summary = BudgetSummary::compute(dec!(1000), expenses, &[], &[]);

        assert_eq!(summary.total_expenses, dec!(400));
        assert_eq!(summary.remaining, dec!(600));
        assert_eq!(summary.by_category["Food & Dining"], dec!(300));
        assert_eq!(summary.by_category["Transportation"], dec!(100));
        assert_eq!(summary.expense_count, 3);
    }

    #[test]
    fn test_negative_expense_offsets_spend() {
        // Money lent out, then repaid: outflow and income cancel
        let expenses = vec![("Other", dec!(500)), ("Other", dec!(-500)), ("Shopping", dec!(200))];
        let summary = BudgetSummary::compute(dec!(1000), expenses, &[], &[]);

        assert_eq!(summary.total_expenses, dec!(200));
        assert_eq!(summary.remaining, dec!(800));
        assert_eq!(summary.by_category["Other"], Decimal::ZERO);
    }

    #[test]
    fn test_only_outstanding_loans_counted() {
        let borrowings = [
            LoanLine { amount: dec!(1000), is_repaid: false },
            LoanLine { amount: dec!(300), is_repaid: true },
        ];
        let lendings = [
            LoanLine { amount: dec!(50), is_repaid: true },
            LoanLine { amount: dec!(75), is_repaid: false },
            LoanLine { amount: dec!(25), is_repaid: false },
        ];
        let summary =
            BudgetSummary::compute(dec!(0), Vec::<(&str, Decimal)>::new(), &borrowings, &lendings);

        assert_eq!(summary.total_borrowings, dec!(1000));
        assert_eq!(summary.total_lendings, dec!(100));
        assert_eq!(summary.borrowing_count, 2);
        assert_eq!(summary.lending_count, 3);
    }

    #[test]
    fn test_overspend_goes_negative() {
        let summary = BudgetSummary::compute(dec!(100), vec![("Travel", dec!(150))], &[], &[]);
        assert_eq!(summary.remaining, dec!(-50));
    }
}
