//! File-backed budget and ledger stores

use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Read, Write},
    path::{Path, PathBuf},
    str::FromStr,
    sync::Mutex,
};

use csv::Trim;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    errors::Error,
    ops::lock,
    types::{
        Budget, BudgetRecord, BudgetStore, Category, Expense, ExpenseLedger, LedgerContents,
        LoadMode,
    },
};

/// Suffix of the scratch file a budget is written to before it replaces the real one
const TMP_SUFFIX: &str = "tmp";

/// Stores the budget as a single decimal in a text file, e.g. `250.00`.
#[derive(Debug)]
pub struct FileBudgetStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileBudgetStore {
    /// Creates a store backed by `path`. The file is not touched until the first read or write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Returns the path of the budget file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(TMP_SUFFIX);
        self.path.with_file_name(name)
    }
}

impl BudgetStore for FileBudgetStore {
    fn read(&self) -> Result<BudgetRecord, Error> {
        let _guard = lock(&self.guard);
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no budget stored yet");
                return Ok(BudgetRecord::Absent);
            }
            Err(err) => return Err(Error::storage(&self.path, err)),
        };
        match parse_budget(&contents) {
            Some(budget) => {
                tracing::debug!(%budget, "read budget");
                Ok(BudgetRecord::Present(budget))
            }
            None => {
                tracing::warn!(
                    path = %self.path.display(),
                    contents = contents.trim(),
                    "stored budget is invalid, treating it as absent"
                );
                Ok(BudgetRecord::Absent)
            }
        }
    }

    fn write(&self, budget: Budget) -> Result<(), Error> {
        let _guard = lock(&self.guard);
        ensure_parent(&self.path)?;
        let tmp = self.tmp_path();
        let mut file = File::create(&tmp).map_err(|err| Error::storage(&tmp, err))?;
        file.write_all(budget.to_string().as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|err| Error::storage(&tmp, err))?;
        drop(file);
        fs::rename(&tmp, &self.path).map_err(|err| Error::storage(&self.path, err))?;
        tracing::info!(%budget, path = %self.path.display(), "budget updated");
        Ok(())
    }
}

/// Parses stored budget text. Anything that is not a non-negative decimal is `None`.
fn parse_budget(text: &str) -> Option<Budget> {
    let amount = parse_decimal(text.trim())?;
    Budget::new(amount).ok()
}

/// Parses plain (`12.5`) or scientific (`1.25e1`) decimal text
pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Appends expenses to a text log, one `<name>, <amount>, <category>` line per record.
///
/// ```text
/// Coffee, 4.50, Food 🍔
/// Train, 30.00, Transport 🚗
/// Bank fee, 2.25, Fees
/// ```
#[derive(Debug)]
pub struct FileExpenseLedger {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileExpenseLedger {
    /// Creates a ledger backed by `path`. The file is created on the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Returns the path of the ledger file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExpenseLedger for FileExpenseLedger {
    fn append(&self, expense: &Expense) -> Result<(), Error> {
        let line = format_line(expense)?;
        let _guard = lock(&self.guard);
        ensure_parent(&self.path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| Error::storage(&self.path, err))?;
        file.write_all(line.as_bytes())
            .map_err(|err| Error::storage(&self.path, err))?;
        tracing::debug!(path = %self.path.display(), %expense, "appended expense");
        Ok(())
    }

    fn load_all(&self, mode: LoadMode) -> Result<LedgerContents, Error> {
        let _guard = lock(&self.guard);
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no expenses recorded yet");
                return Ok(LedgerContents::EmptyLedger);
            }
            Err(err) => return Err(Error::storage(&self.path, err)),
        };
        let expenses = read_expenses(&mut file, mode).map_err(|err| match err {
            Error::Storage { source, .. } => Error::storage(&self.path, source),
            other => other,
        })?;
        tracing::debug!(path = %self.path.display(), count = expenses.len(), "loaded expenses");
        Ok(LedgerContents::Records(expenses))
    }
}

/// Shape of one ledger line
#[derive(Debug, Deserialize)]
struct LedgerRow {
    name: String,
    #[serde(with = "rust_decimal::serde::str")]
    amount: Decimal,
    category: String,
}

const FIELDS_PER_LINE: usize = 3;

/// Reads ledger lines from a stream.
///
/// In [`LoadMode::Strict`] the first malformed line fails the whole read; in
/// [`LoadMode::SkipInvalid`] it is logged and skipped. Blank lines are ignored.
pub fn read_expenses<R: Read>(reader: R, mode: LoadMode) -> Result<Vec<Expense>, Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .quoting(false)
        .flexible(true)
        .from_reader(reader);
    let mut expenses = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let fallback_line = index as u64 + 1;
        let parsed = record.map_err(|err| csv_error(err, fallback_line)).and_then(|record| {
            let line = record.position().map_or(fallback_line, |pos| pos.line());
            parse_record(&record, line)
        });
        match (parsed, mode) {
            (Ok(expense), _) => expenses.push(expense),
            (Err(Error::Parse { line, reason }), LoadMode::SkipInvalid) => {
                tracing::warn!(line, %reason, "skipping malformed ledger line");
            }
            (Err(err), _) => return Err(err),
        }
    }
    Ok(expenses)
}

fn parse_record(record: &csv::StringRecord, line: u64) -> Result<Expense, Error> {
    if record.len() != FIELDS_PER_LINE {
        return Err(Error::Parse {
            line,
            reason: format!(
                "expected {FIELDS_PER_LINE} comma-separated fields, found {}",
                record.len()
            ),
        });
    }
    let row: LedgerRow = record.deserialize(None).map_err(|err| Error::Parse {
        line,
        reason: match err.kind() {
            csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
            _ => err.to_string(),
        },
    })?;
    Expense::new(&row.name, row.amount, Category::from_label(&row.category)).map_err(|err| {
        Error::Parse {
            line,
            reason: err.to_string(),
        }
    })
}

fn csv_error(err: csv::Error, line: u64) -> Error {
    let line = err.position().map_or(line, |pos| pos.line());
    match err.into_kind() {
        csv::ErrorKind::Io(source) => Error::Storage {
            path: PathBuf::new(),
            source,
        },
        csv::ErrorKind::Utf8 { err, .. } => Error::Parse {
            line,
            reason: err.to_string(),
        },
        other => Error::Parse {
            line,
            reason: format!("{other:?}"),
        },
    }
}

/// Renders an expense as one ledger line, refusing values the line format cannot carry
fn format_line(expense: &Expense) -> Result<String, Error> {
    check_encodable("name", expense.name())?;
    check_encodable("category", expense.category().label())?;
    Ok(format!(
        "{}, {}, {}\n",
        expense.name(),
        expense.amount(),
        expense.category().label()
    ))
}

fn check_encodable(field: &'static str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() || value.contains([',', '\n', '\r']) || value != value.trim() {
        return Err(Error::Unencodable {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), Error> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|err| Error::storage(parent, err))
        }
        _ => Ok(()),
    }
}
