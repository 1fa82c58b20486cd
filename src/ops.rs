use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;

use crate::{
    errors::Error,
    types::{
        Budget, BudgetRecord, BudgetStore, CategoryTotal, Expense, ExpenseLedger, LedgerContents,
        LoadMode, MemoryBudgetStore, MemoryExpenseLedger, Summary,
    },
};

/// Computes the spend-versus-budget report for `expenses` as of `as_of`.
///
/// Category buckets keep the order in which each category first appears. When the reference
/// date is the last day of its month there are no remaining days and the daily allowance is zero.
#[must_use]
pub fn summarize(expenses: &[Expense], budget: Budget, as_of: NaiveDate) -> Summary {
    let mut per_category: Vec<CategoryTotal> = Vec::new();
    for expense in expenses {
        match per_category
            .iter_mut()
            .find(|bucket| bucket.category == expense.category)
        {
            Some(bucket) => bucket.total += expense.amount,
            None => per_category.push(CategoryTotal {
                category: expense.category.clone(),
                total: expense.amount,
            }),
        }
    }

    let total_spent: Decimal = expenses.iter().map(|expense| expense.amount).sum();
    let remaining_budget = budget.amount() - total_spent;
    let days_in_month = days_in_month(as_of.year(), as_of.month());
    let remaining_days = days_in_month.saturating_sub(as_of.day());
    let daily_allowance = if remaining_days > 0 {
        remaining_budget / Decimal::from(remaining_days)
    } else {
        Decimal::ZERO
    };

    Summary {
        budget,
        per_category,
        total_spent,
        remaining_budget,
        days_in_month,
        remaining_days,
        daily_allowance,
    }
}

/// Number of calendar days in `month` (1-12) of `year`, leap-year aware.
#[must_use]
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .map(|first_of_next| (first_of_next - Duration::days(1)).day())
        // Only reachable for out-of-range input; every month has at least 28 days
        .unwrap_or(28)
}

/// Locks a store guard, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl BudgetStore for MemoryBudgetStore {
    fn read(&self) -> Result<BudgetRecord, Error> {
        Ok(match *lock(&self.budget) {
            Some(budget) => BudgetRecord::Present(budget),
            None => BudgetRecord::Absent,
        })
    }

    fn write(&self, budget: Budget) -> Result<(), Error> {
        *lock(&self.budget) = Some(budget);
        Ok(())
    }
}

impl ExpenseLedger for MemoryExpenseLedger {
    fn append(&self, expense: &Expense) -> Result<(), Error> {
        lock(&self.expenses)
            .get_or_insert_with(Vec::new)
            .push(expense.clone());
        Ok(())
    }

    fn load_all(&self, _mode: LoadMode) -> Result<LedgerContents, Error> {
        Ok(match &*lock(&self.expenses) {
            Some(expenses) => LedgerContents::Records(expenses.clone()),
            None => LedgerContents::EmptyLedger,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::types::Category;

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn budget(amount: Decimal) -> Budget {
        Budget::new(amount).unwrap()
    }

    fn sample_expenses() -> Vec<Expense> {
        vec![
            Expense::new("Coffee", dec!(4.50), Category::Food).unwrap(),
            Expense::new("Train", dec!(30.00), Category::Transport).unwrap(),
            Expense::new("Coffee2", dec!(5.50), Category::Food).unwrap(),
        ]
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
        assert_eq!(days_in_month(2025, 1), 31);
    }

    #[test]
    fn test_category_totals_in_first_appearance_order() {
        let summary = summarize(&sample_expenses(), budget(dec!(500.00)), date(2024, 3, 10));
        assert_eq!(
            summary.per_category(),
            &[
                CategoryTotal {
                    category: Category::Food,
                    total: dec!(10.00)
                },
                CategoryTotal {
                    category: Category::Transport,
                    total: dec!(30.00)
                },
            ]
        );
        assert_eq!(summary.per_category()[0].category.label(), "Food 🍔");
        assert_eq!(summary.total_spent(), dec!(40.00));
        assert_eq!(summary.remaining_budget(), dec!(460.00));
        assert!(!summary.is_over_budget());
    }

    #[test]
    fn test_category_totals_add_up_to_total() {
        let mut expenses = sample_expenses();
        expenses.push(
            Expense::new("Bank fee", dec!(2.25), Category::Other("Fees".to_string())).unwrap(),
        );
        expenses.push(Expense::new("Refund", dec!(-4.50), Category::Food).unwrap());
        let summary = summarize(&expenses, budget(dec!(100)), date(2024, 3, 10));
        let bucket_sum: Decimal = summary.per_category().iter().map(|b| b.total).sum();
        assert_eq!(bucket_sum, summary.total_spent());
        assert_eq!(summary.total_spent(), dec!(37.75));
        assert_eq!(summary.per_category().len(), 3);
        assert_eq!(
            summary.per_category()[2].category,
            Category::Other("Fees".to_string())
        );
    }

    #[test]
    fn test_unknown_category_is_its_own_bucket() {
        let expenses = vec![
            Expense::new("Lunch", dec!(8), Category::Other("Food".to_string())).unwrap(),
            Expense::new("Dinner", dec!(12), Category::Food).unwrap(),
        ];
        let summary = summarize(&expenses, budget(dec!(100)), date(2024, 3, 10));
        assert_eq!(summary.per_category().len(), 2);
    }

    #[test]
    fn test_over_budget() {
        let expenses = vec![Expense::new("Rent", dec!(150.00), Category::Home).unwrap()];
        let summary = summarize(&expenses, budget(dec!(100.00)), date(2024, 3, 10));
        assert_eq!(summary.remaining_budget(), dec!(-50.00));
        assert!(summary.is_over_budget());
        assert_eq!(summary.remaining_days(), 21);
        assert!(summary.daily_allowance() < Decimal::ZERO);
    }

    #[test]
    fn test_exactly_on_budget_is_not_over() {
        let expenses = vec![Expense::new("Rent", dec!(100), Category::Home).unwrap()];
        let summary = summarize(&expenses, budget(dec!(100)), date(2024, 3, 10));
        assert_eq!(summary.remaining_budget(), dec!(0));
        assert!(!summary.is_over_budget());
    }

    #[test]
    fn test_last_day_of_leap_february() {
        let summary = summarize(&sample_expenses(), budget(dec!(500)), date(2024, 2, 29));
        assert_eq!(summary.days_in_month(), 29);
        assert_eq!(summary.remaining_days(), 0);
        assert_eq!(summary.daily_allowance(), Decimal::ZERO);
    }

    #[test]
    fn test_last_day_of_month_has_no_allowance() {
        let summary = summarize(&[], budget(dec!(300)), date(2023, 4, 30));
        assert_eq!(summary.days_in_month(), 30);
        assert_eq!(summary.remaining_days(), 0);
        assert_eq!(summary.daily_allowance(), Decimal::ZERO);
    }

    #[test]
    fn test_daily_allowance() {
        // 460 left, 31 - 8 = 23 days to go
        let summary = summarize(&sample_expenses(), budget(dec!(500.00)), date(2024, 1, 8));
        assert_eq!(summary.remaining_days(), 23);
        assert_eq!(summary.daily_allowance(), dec!(20));
    }

    #[test]
    fn test_empty_ledger_summary() {
        let summary = summarize(&[], budget(dec!(250.00)), date(2024, 6, 1));
        assert_eq!(summary.total_spent(), dec!(0.00));
        assert_eq!(summary.remaining_budget(), dec!(250.00));
        assert!(summary.per_category().is_empty());
        assert_eq!(summary.remaining_days(), 29);
    }

    #[test]
    fn test_summarize_is_deterministic() {
        let expenses = sample_expenses();
        let first = summarize(&expenses, budget(dec!(500)), date(2024, 5, 17));
        let second = summarize(&expenses, budget(dec!(500)), date(2024, 5, 17));
        assert_eq!(first, second);
    }

    #[test]
    fn test_memory_budget_store() {
        let store = MemoryBudgetStore::new();
        assert_eq!(store.read().unwrap(), BudgetRecord::Absent);
        store.write(budget(dec!(250))).unwrap();
        assert_eq!(store.read().unwrap(), BudgetRecord::Present(budget(dec!(250))));
        store.write(budget(dec!(75.5))).unwrap();
        assert_eq!(store.read().unwrap().budget().unwrap().amount(), dec!(75.50));
    }

    #[test]
    fn test_read_or_init_only_initializes_once() {
        let store = MemoryBudgetStore::new();
        let first = store.read_or_init(|| budget(dec!(120))).unwrap();
        assert_eq!(first.amount(), dec!(120));
        let second = store
            .read_or_init(|| panic!("Budget was already stored"))
            .unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn test_memory_ledger_preserves_order() {
        let ledger = MemoryExpenseLedger::new();
        assert_eq!(
            ledger.load_all(LoadMode::Strict).unwrap(),
            LedgerContents::EmptyLedger
        );
        for expense in sample_expenses() {
            ledger.append(&expense).unwrap();
        }
        assert_eq!(
            ledger.load_all(LoadMode::Strict).unwrap().into_expenses(),
            sample_expenses()
        );
        let summary = ledger.summarize(budget(dec!(500)), date(2024, 3, 10)).unwrap();
        assert_eq!(summary.total_spent(), dec!(40));
    }
}
