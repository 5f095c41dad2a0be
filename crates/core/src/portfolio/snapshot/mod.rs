//! Portfolio snapshot module - daily valuation state and its storage seam.

mod memory_snapshot_store;
mod snapshot_model;
mod snapshot_traits;

pub use memory_snapshot_store::*;
pub use snapshot_model::*;
pub use snapshot_traits::*;
