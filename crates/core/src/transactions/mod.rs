//! Transactions module - ledger rows, instruments and ledger consistency checks.

mod ledger_mutation;
mod transactions_model;
mod transactions_validation;

pub use ledger_mutation::*;
pub use transactions_model::*;
pub use transactions_validation::*;
