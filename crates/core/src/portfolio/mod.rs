//! Portfolio analytics - lots, snapshots, valuation series and window queries.

pub mod ledger;
pub mod snapshot;
pub mod valuation;
pub mod window;

pub use ledger::*;
pub use snapshot::*;
pub use valuation::*;
pub use window::*;
