//! Window queries - start/end/change metrics over a date range.

mod window_calculator;
mod window_model;

pub use window_calculator::*;
pub use window_model::*;
