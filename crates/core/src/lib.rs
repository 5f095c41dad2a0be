//! Ledgerfolio Core - portfolio analytics engine.
//!
//! Turns an append-only BUY/SELL ledger into FIFO lots, realized gains and a daily
//! series of portfolio valuation snapshots. Storage, prices and the trading calendar
//! are injected through the traits in [`portfolio::snapshot`] and [`market_data`];
//! in-memory implementations of each are provided.

pub mod config;
pub mod constants;
pub mod errors;
pub mod market_data;
pub mod portfolio;
pub mod transactions;
pub mod utils;

// Re-export the engine surface
pub use config::EngineConfig;
pub use portfolio::*;
pub use transactions::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
