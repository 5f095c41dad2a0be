use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::time_utils::end_of_day_utc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Only transactions with `trade_at <= as_of` are considered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
}

impl WindowQuery {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            as_of: None,
        }
    }

    /// Restricts the ledger to trades up to the end of `date` in `tz`.
    pub fn as_of_end_of_day(mut self, date: NaiveDate, tz: Tz) -> Self {
        self.as_of = Some(end_of_day_utc(date, tz));
        self
    }
}

/// A holding from the last snapshot of the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowHolding {
    pub instrument_id: String,
    pub symbol: String,
    pub quantity: Decimal,
    pub value: Decimal,
    pub cost_basis: Decimal,
    /// `None` when the holding has no price data.
    pub unrealized_pnl: Option<Decimal>,
    pub is_estimated: bool,
    pub cost_basis_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuePoint {
    pub date: NaiveDate,
    pub total_value: Decimal,
    pub total_cost_basis: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowResult {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_value: Decimal,
    pub end_value: Decimal,
    pub absolute_change: Decimal,
    /// `absolute_change / start_value`; zero when the window starts empty.
    pub percentage_change: Decimal,
    pub realized_pnl_in_window: Decimal,
    pub unrealized_pnl_at_end: Decimal,
    /// Sorted by value descending, then symbol.
    pub holdings: Vec<WindowHolding>,
    pub series: Vec<ValuePoint>,
}
