use std::path::PathBuf;

use rust_decimal::Decimal;

/// Error type that can be returned by fallible operations in this crate.
///
/// A missing budget or a missing ledger is not an error: those outcomes are reported through
/// [`BudgetRecord::Absent`](crate::types::BudgetRecord::Absent) and
/// [`LedgerContents::EmptyLedger`](crate::types::LedgerContents::EmptyLedger).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying file could not be read, created or written
    #[error("Storage error on {}: {source}", path.display())]
    Storage {
        /// File the failed operation was working on
        path: PathBuf,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },
    /// A persisted ledger line could not be parsed. Fatal for the load that hit it.
    #[error("Malformed ledger record on line {line}: {reason}")]
    Parse {
        /// 1-based line number in the ledger file
        line: u64,
        /// What was wrong with the line
        reason: String,
    },
    /// Budgets are spending ceilings and cannot go below zero
    #[error("Budget must not be negative (got {0})")]
    NegativeBudget(Decimal),
    /// Every [`Expense`](crate::types::Expense) needs a display name
    #[error("Expense name must not be empty")]
    EmptyName,
    /// The value cannot be written to the line-oriented ledger and read back unchanged
    #[error("Expense {field} {value:?} cannot be stored in the ledger (commas, line breaks and blank values are not allowed)")]
    Unencodable {
        /// Which expense field was rejected
        field: &'static str,
        /// The rejected value
        value: String,
    },
}

impl Error {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}
