//! Core error types for the Ledgerfolio engine.
//!
//! This module defines storage-agnostic error types. Collaborator-specific errors
//! (database drivers, HTTP price providers, etc.) are converted to these types by
//! the code that implements the collaborator traits.
//!
//! A ledger that would drive a position negative is *not* an error: it is reported
//! in-band through [`crate::transactions::LedgerValidation`].

use chrono::NaiveDate;
use thiserror::Error;

use crate::market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the portfolio engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Portfolio calculation failed: {0}")]
    Calculation(#[from] CalculatorError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Failed to load configuration: {0}")]
    ConfigIO(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Storage-agnostic error type for snapshot store operations.
///
/// Store implementations map their driver errors into these variants.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// A transaction (e.g. delete-then-write of a snapshot range) failed and was rolled back.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Internal/unexpected store error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Errors raised by the lot engine and the valuation builder.
#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("Trading calendar for exchange {exchange} did not advance past {date}")]
    CalendarStalled { exchange: String, date: NaiveDate },

    #[error("Decimal overflow while computing {0}")]
    Overflow(String),
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
}

// === From implementations for common error types ===

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigIO(err.to_string())
    }
}
