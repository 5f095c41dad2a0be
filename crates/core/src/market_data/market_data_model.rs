//! Market data domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A daily close for one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBar {
    pub instrument_id: String,
    pub date: NaiveDate,
    pub close: Decimal,
}

/// The most recent close on or before a requested date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPrice {
    pub price: Decimal,
    /// Date of the bar the price came from.
    pub actual_date: NaiveDate,
    /// True when `actual_date` is earlier than the requested date.
    pub is_carry_forward: bool,
}

impl ResolvedPrice {
    pub fn new(price: Decimal, actual_date: NaiveDate, requested: NaiveDate) -> Self {
        Self {
            price,
            actual_date,
            is_carry_forward: actual_date < requested,
        }
    }
}
