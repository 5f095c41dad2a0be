//! Position ledger - FIFO lots and realized trades.

mod lot_tracker;
mod lots_model;

pub use lot_tracker::*;
pub use lots_model::*;
