//! Where the budget and ledger files live
//!
//! Resolution order for the data directory:
//!
//! 1. An explicit directory (the `--data-dir` flag or `SPENDWISE_DATA_DIR`)
//! 2. The platform data directory, e.g. `~/.local/share/spendwise` on Linux

use std::path::{Path, PathBuf};

use crate::io::{FileBudgetStore, FileExpenseLedger};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "SPENDWISE_DATA_DIR";
/// File name of the persisted budget
pub const BUDGET_FILE: &str = "budget.txt";
/// File name of the persisted expense log
pub const LEDGER_FILE: &str = "expenses.csv";

/// Paths of the two persisted files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    data_dir: PathBuf,
}

impl DataPaths {
    /// Uses `data_dir` if given, otherwise the platform data directory.
    /// Returns `None` if no home directory can be determined.
    #[must_use]
    pub fn resolve(data_dir: Option<PathBuf>) -> Option<Self> {
        match data_dir {
            Some(data_dir) => Some(Self::with_data_dir(data_dir)),
            None => directories::ProjectDirs::from("", "", "spendwise")
                .map(|dirs| Self::with_data_dir(dirs.data_dir())),
        }
    }

    /// Uses the given directory for both files
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Returns the data directory
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the path of the budget file
    #[must_use]
    pub fn budget_file(&self) -> PathBuf {
        self.data_dir.join(BUDGET_FILE)
    }

    /// Returns the path of the expense log
    #[must_use]
    pub fn ledger_file(&self) -> PathBuf {
        self.data_dir.join(LEDGER_FILE)
    }

    /// Opens the budget store under these paths
    #[must_use]
    pub fn budget_store(&self) -> FileBudgetStore {
        FileBudgetStore::new(self.budget_file())
    }

    /// Opens the expense ledger under these paths
    #[must_use]
    pub fn expense_ledger(&self) -> FileExpenseLedger {
        FileExpenseLedger::new(self.ledger_file())
    }
}
