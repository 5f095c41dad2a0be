use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A FIFO slice of an open BUY.
///
/// `cost_basis_remaining == remaining_qty * cost_basis_per_share` holds after every mutation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    /// Id of the BUY that opened the lot.
    pub transaction_id: String,
    pub opened_at: DateTime<Utc>,
    pub original_qty: Decimal,
    pub remaining_qty: Decimal,
    pub cost_basis_per_share: Decimal,
    pub cost_basis_remaining: Decimal,
}

impl Lot {
    /// Removes `qty` from the lot and returns the cost basis relieved.
    pub(crate) fn consume(&mut self, qty: Decimal) -> Decimal {
        let relieved = qty * self.cost_basis_per_share;
        self.remaining_qty -= qty;
        self.cost_basis_remaining -= relieved;
        relieved
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_qty <= Decimal::ZERO
    }
}

/// One lot-consumption event produced by a SELL.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RealizedTrade {
    pub sell_transaction_id: String,
    pub sell_date: DateTime<Utc>,
    pub qty: Decimal,
    pub proceeds: Decimal,
    pub cost_basis: Decimal,
    pub fees: Decimal,
    /// `proceeds - cost_basis - fees`
    pub realized_pnl: Decimal,
}

/// Output of [`super::process_transactions`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerResult {
    /// Open lots, oldest first.
    pub lots: Vec<Lot>,
    /// Realized trades in SELL order, lot-consumption order within a SELL.
    pub realized_trades: Vec<RealizedTrade>,
}
