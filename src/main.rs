use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use rust_decimal::Decimal;
use spendwise::{
    config::{DataPaths, DATA_DIR_ENV},
    dates,
    ops,
    types::{
        Budget, BudgetRecord, BudgetStore, Category, Expense, ExpenseLedger, LoadMode, Summary,
        FIXED_CATEGORIES,
    },
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "spendwise",
    version,
    about = "Track expenses against a monthly budget"
)]
struct Cli {
    /// Directory holding budget.txt and expenses.csv
    #[arg(long, env = DATA_DIR_ENV, global = true)]
    data_dir: Option<PathBuf>,

    /// Log more (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or change the monthly budget
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Record an expense
    Add {
        /// What the money was spent on
        name: String,
        /// Amount spent
        #[arg(allow_hyphen_values = true)]
        amount: Decimal,
        /// Category number, name or label (see `categories`)
        category: String,
        /// Record CATEGORY verbatim instead of picking a fixed category
        #[arg(long)]
        other: bool,
        /// Date of the expense (DD-MM-YYYY); checked and echoed, not stored
        #[arg(long)]
        date: Option<String>,
    },

    /// List every recorded expense
    List {
        /// Skip malformed ledger lines instead of failing
        #[arg(long)]
        lenient: bool,
    },

    /// List the fixed categories
    Categories,

    /// Summarize spending against the budget
    Summary {
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Skip malformed ledger lines instead of failing
        #[arg(long)]
        lenient: bool,
    },
}

#[derive(Subcommand)]
enum BudgetCommands {
    /// Show the current budget
    Show,
    /// Replace the budget
    Set {
        /// New monthly budget
        #[arg(allow_hyphen_values = true)]
        amount: Decimal,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let paths = DataPaths::resolve(cli.data_dir)
        .ok_or_else(|| anyhow!("Could not determine a data directory, pass --data-dir"))?;
    tracing::debug!(data_dir = %paths.data_dir().display(), "resolved data directory");
    let budget_store = paths.budget_store();
    let ledger = paths.expense_ledger();

    match cli.command {
        Commands::Budget(BudgetCommands::Show) => match budget_store.read()? {
            BudgetRecord::Present(budget) => println!("Your budget for the month is £{budget}"),
            BudgetRecord::Absent => {
                println!("No budget found. Set one with `spendwise budget set <AMOUNT>`.")
            }
        },
        Commands::Budget(BudgetCommands::Set { amount }) => {
            let budget = Budget::new(amount)?;
            budget_store
                .write(budget)
                .context("Failed to save the budget")?;
            println!("Your budget for the month is £{budget}");
        }
        Commands::Add {
            name,
            amount,
            category,
            other,
            date,
        } => {
            if let Some(date) = &date {
                if !dates::is_valid_date(date) {
                    bail!("Invalid date {date:?}, expected DD-MM-YYYY");
                }
            }
            let category = if other {
                Category::Other(category)
            } else {
                Category::from_choice(&category).ok_or_else(|| {
                    anyhow!("Unknown category {category:?}. Run `spendwise categories`, or pass --other to keep it as is")
                })?
            };
            let expense = Expense::new(name, amount, category)?;
            ledger
                .append(&expense)
                .context("Failed to save the expense")?;
            match date {
                Some(date) => println!("Saved expense: {expense} on {date}"),
                None => println!("Saved expense: {expense}"),
            }
        }
        Commands::List { lenient } => {
            let expenses = ledger.load_all(load_mode(lenient))?.into_expenses();
            if expenses.is_empty() {
                println!("No expenses recorded yet.");
            }
            for (index, expense) in expenses.iter().enumerate() {
                println!("{:>4}. {expense}", index + 1);
            }
        }
        Commands::Categories => {
            for (index, category) in FIXED_CATEGORIES.iter().enumerate() {
                println!("{}. {category}", index + 1);
            }
        }
        Commands::Summary { as_of, lenient } => {
            let Some(budget) = budget_store.read()?.budget() else {
                bail!("No budget found. Set one with `spendwise budget set <AMOUNT>`");
            };
            let expenses = ledger.load_all(load_mode(lenient))?.into_expenses();
            if expenses.is_empty() {
                println!("No expenses recorded yet.");
            }
            let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
            print_summary(&ops::summarize(&expenses, budget, as_of));
        }
    }
    Ok(())
}

fn load_mode(lenient: bool) -> LoadMode {
    if lenient {
        LoadMode::SkipInvalid
    } else {
        LoadMode::Strict
    }
}

fn print_summary(summary: &Summary) {
    println!("Summary of expenses:");
    for bucket in summary.per_category() {
        println!("  {}: £{:.2}", bucket.category, bucket.total);
    }
    println!("Total spent: £{:.2}", summary.total_spent());
    println!("Remaining budget: £{:.2}", summary.remaining_budget());
    if summary.is_over_budget() {
        println!("{}", "You have exceeded your budget!".red());
    } else {
        println!("{}", "You are within your budget!".green());
    }
    println!("Remaining days in the month: {}", summary.remaining_days());
    println!("Daily budget: £{:.2}", summary.daily_allowance());
}

fn init_tracing(verbose: u8) {
    let default_directive = match verbose {
        0 => "spendwise=warn",
        1 => "spendwise=info",
        _ => "spendwise=debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
