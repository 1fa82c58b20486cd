//! Common datatypes and store interfaces shared by every front end

use std::{fmt::Display, sync::Mutex};

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{errors::Error, ops};

/// The number of decimals a [`Budget`] is kept and persisted at
pub const BUDGET_SCALE: u32 = 2;

/// The monthly spending ceiling.
///
/// Always non-negative, always held at [`BUDGET_SCALE`] fraction digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Budget(Decimal);

impl Budget {
    /// Creates a budget, rounding half away from zero to [`BUDGET_SCALE`] digits.
    /// # Errors
    /// [`Error::NegativeBudget`] if `amount` is below zero
    pub fn new(amount: Decimal) -> Result<Self, Error> {
        if amount < Decimal::ZERO {
            return Err(Error::NegativeBudget(amount));
        }
        let mut amount =
            amount.round_dp_with_strategy(BUDGET_SCALE, RoundingStrategy::MidpointAwayFromZero);
        amount.rescale(BUDGET_SCALE);
        Ok(Self(amount))
    }

    /// Returns the budget amount
    #[must_use]
    #[inline]
    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl Display for Budget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an expense was spent on.
///
/// The seven fixed categories are offered by interactive front ends. Feeds that do not
/// constrain categories produce [`Category::Other`], which forms its own summary bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    /// Groceries, eating out
    Food,
    /// Rent, utilities, household
    Home,
    /// Fares, fuel, parking
    Transport,
    /// Going out, games, subscriptions
    Entertainment,
    /// Medical, pharmacy, fitness
    Health,
    /// Courses, books
    Education,
    /// Anything else picked from the menu
    Miscellaneous,
    /// A category string outside the fixed set, kept verbatim
    Other(String),
}

/// The fixed categories, in menu order
pub static FIXED_CATEGORIES: [Category; 7] = [
    Category::Food,
    Category::Home,
    Category::Transport,
    Category::Entertainment,
    Category::Health,
    Category::Education,
    Category::Miscellaneous,
];

impl Category {
    /// Returns the bare name, e.g. `Food`
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Category::Food => "Food",
            Category::Home => "Home",
            Category::Transport => "Transport",
            Category::Entertainment => "Entertainment",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Miscellaneous => "Miscellaneous",
            Category::Other(label) => label,
        }
    }

    /// Returns the label written to the ledger, e.g. `Food 🍔`
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Category::Food => "Food 🍔",
            Category::Home => "Home 🏠",
            Category::Transport => "Transport 🚗",
            Category::Entertainment => "Entertainment 🎮",
            Category::Health => "Health 🏥",
            Category::Education => "Education 📚",
            Category::Miscellaneous => "Miscellaneous 🛒",
            Category::Other(label) => label,
        }
    }

    /// Maps a persisted label back to a category.
    ///
    /// Only an exact fixed label yields a fixed variant; anything else is kept as
    /// [`Category::Other`] so that it stays its own bucket.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        FIXED_CATEGORIES
            .iter()
            .find(|category| category.label() == label)
            .cloned()
            .unwrap_or_else(|| Category::Other(label.to_string()))
    }

    /// Resolves interactive input: a 1-based menu number, a bare name (any case) or a full label.
    /// Returns `None` if the input names none of the fixed categories.
    #[must_use]
    pub fn from_choice(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Ok(index) = input.parse::<usize>() {
            return index
                .checked_sub(1)
                .and_then(|index| FIXED_CATEGORIES.get(index))
                .cloned();
        }
        FIXED_CATEGORIES
            .iter()
            .find(|category| category.name().eq_ignore_ascii_case(input) || category.label() == input)
            .cloned()
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single immutable spending record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expense {
    /// Display label, never empty
    pub(crate) name: String,
    /// Amount spent. Not checked for sign: refund-like entries may be negative.
    pub(crate) amount: Decimal,
    /// What the money was spent on
    pub(crate) category: Category,
}

impl Expense {
    /// Creates an expense. Surrounding whitespace is stripped from the name.
    /// # Errors
    /// [`Error::EmptyName`] if the name is blank
    pub fn new(name: impl AsRef<str>, amount: Decimal, category: Category) -> Result<Self, Error> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        Ok(Self {
            name: name.to_string(),
            amount,
            category,
        })
    }

    /// Returns the display label
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the amount spent
    #[must_use]
    #[inline]
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the category
    #[must_use]
    #[inline]
    pub fn category(&self) -> &Category {
        &self.category
    }
}

impl Display for Expense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:.2} ({})", self.name, self.amount, self.category)
    }
}

/// Outcome of reading a [`BudgetStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetRecord {
    /// No budget has been stored yet, or the stored one was unreadable.
    /// The caller should ask for an initial value.
    Absent,
    /// The stored budget
    Present(Budget),
}

impl BudgetRecord {
    /// Returns the budget, if one is stored
    #[must_use]
    pub fn budget(self) -> Option<Budget> {
        match self {
            BudgetRecord::Absent => None,
            BudgetRecord::Present(budget) => Some(budget),
        }
    }
}

/// Outcome of loading an [`ExpenseLedger`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerContents {
    /// Nothing has ever been appended. Equivalent to an empty sequence.
    EmptyLedger,
    /// Every record, in append order
    Records(Vec<Expense>),
}

impl LedgerContents {
    /// Returns the records, treating [`LedgerContents::EmptyLedger`] as no records
    #[must_use]
    pub fn into_expenses(self) -> Vec<Expense> {
        match self {
            LedgerContents::EmptyLedger => Vec::new(),
            LedgerContents::Records(expenses) => expenses,
        }
    }
}

/// How [`ExpenseLedger::load_all`] reacts to a malformed line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Fail the whole load with [`Error::Parse`] on the first malformed line
    #[default]
    Strict,
    /// Skip malformed lines, logging each one
    SkipInvalid,
}

/// Total spent in one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    /// The bucket
    pub category: Category,
    /// Sum of the amounts in the bucket
    pub total: Decimal,
}

/// Spend-versus-budget report for a reference date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Budget the report was computed against
    pub(crate) budget: Budget,
    /// Category totals, ordered by first appearance in the ledger
    pub(crate) per_category: Vec<CategoryTotal>,
    /// Sum of all amounts
    pub(crate) total_spent: Decimal,
    /// Budget minus total spent; negative when over budget
    pub(crate) remaining_budget: Decimal,
    /// Calendar days in the reference month
    pub(crate) days_in_month: u32,
    /// Days left in the month after the reference date
    pub(crate) remaining_days: u32,
    /// Remaining budget spread over the remaining days, zero when no days remain
    pub(crate) daily_allowance: Decimal,
}

impl Summary {
    /// Returns the budget the report was computed against
    #[must_use]
    #[inline]
    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Returns the per-category totals, ordered by first appearance
    #[must_use]
    #[inline]
    pub fn per_category(&self) -> &[CategoryTotal] {
        &self.per_category
    }

    /// Returns the total amount spent
    #[must_use]
    #[inline]
    pub fn total_spent(&self) -> Decimal {
        self.total_spent
    }

    /// Returns budget minus total spent
    #[must_use]
    #[inline]
    pub fn remaining_budget(&self) -> Decimal {
        self.remaining_budget
    }

    /// Returns the number of days in the reference month
    #[must_use]
    #[inline]
    pub fn days_in_month(&self) -> u32 {
        self.days_in_month
    }

    /// Returns the number of days left after the reference date
    #[must_use]
    #[inline]
    pub fn remaining_days(&self) -> u32 {
        self.remaining_days
    }

    /// Returns how much can be spent per remaining day
    #[must_use]
    #[inline]
    pub fn daily_allowance(&self) -> Decimal {
        self.daily_allowance
    }

    /// Returns whether more was spent than budgeted
    #[must_use]
    #[inline]
    pub fn is_over_budget(&self) -> bool {
        self.total_spent > self.budget.amount()
    }
}

/// Owner of the single persisted budget value
pub trait BudgetStore {
    /// Reads the stored budget.
    ///
    /// Unparseable content is reported as [`BudgetRecord::Absent`], not as an error.
    fn read(&self) -> Result<BudgetRecord, Error>;

    /// Replaces the stored budget
    fn write(&self, budget: Budget) -> Result<(), Error>;

    /// Reads the stored budget, storing the value produced by `initial` if there is none
    fn read_or_init<F>(&self, initial: F) -> Result<Budget, Error>
    where
        F: FnOnce() -> Budget,
        Self: Sized,
    {
        match self.read()? {
            BudgetRecord::Present(budget) => Ok(budget),
            BudgetRecord::Absent => {
                let budget = initial();
                self.write(budget)?;
                Ok(budget)
            }
        }
    }
}

/// Owner of the append-only expense log
pub trait ExpenseLedger {
    /// Appends one record to the end of the log
    fn append(&self, expense: &Expense) -> Result<(), Error>;

    /// Loads every record in append order
    fn load_all(&self, mode: LoadMode) -> Result<LedgerContents, Error>;

    /// Loads the ledger strictly and summarizes it against `budget` as of `as_of`
    fn summarize(&self, budget: Budget, as_of: NaiveDate) -> Result<Summary, Error> {
        let expenses = self.load_all(LoadMode::Strict)?.into_expenses();
        Ok(ops::summarize(&expenses, budget, as_of))
    }
}

/// Holds the budget in memory.
///
/// # Limitations
/// No persistence.
#[derive(Default, Debug)]
pub struct MemoryBudgetStore {
    /// The current budget, if one was written
    pub(crate) budget: Mutex<Option<Budget>>,
}

impl MemoryBudgetStore {
    /// Creates a new store with no budget
    #[must_use]
    pub fn new() -> Self {
        MemoryBudgetStore::default()
    }
}

/// Holds expenses in memory.
///
/// # Limitations
/// No persistence. Records are always well-formed, so [`LoadMode`] has no effect.
#[derive(Default, Debug)]
pub struct MemoryExpenseLedger {
    /// `None` until the first append, mirroring a ledger file that does not exist yet
    pub(crate) expenses: Mutex<Option<Vec<Expense>>>,
}

impl MemoryExpenseLedger {
    /// Creates a new, empty ledger
    #[must_use]
    pub fn new() -> Self {
        MemoryExpenseLedger::default()
    }
}
