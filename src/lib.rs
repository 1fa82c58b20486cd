#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]
/// Data-directory resolution for the persisted files
pub mod config;
/// Date validation for front ends collecting optional expense dates
pub mod dates;
/// Error handling and custom [`Error`](std::error::Error) types
pub mod errors;
/// File-backed implementations of the budget and ledger stores
pub mod io;
/// Summary computation and in-memory stores
pub mod ops;
/// Data types used throughout Spendwise
pub mod types;
