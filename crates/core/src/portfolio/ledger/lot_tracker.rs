use log::warn;
use rust_decimal::Decimal;
use std::collections::VecDeque;

use super::lots_model::{LedgerResult, Lot, RealizedTrade};
use crate::transactions::{Transaction, TransactionType};

/// Running FIFO state for one instrument.
///
/// Transactions must be applied in `trade_at` order. The tracker assumes a ledger that
/// already passed [`crate::transactions::validate_transaction_set`]: a SELL larger than
/// the open quantity consumes every lot and the remainder is dropped with a warning.
#[derive(Debug, Clone, Default)]
pub struct LotTracker {
    lots: VecDeque<Lot>,
}

impl LotTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one transaction and returns the realized trades it produced.
    pub fn apply(&mut self, tx: &Transaction) -> Vec<RealizedTrade> {
        match tx.transaction_type {
            TransactionType::Buy => {
                self.open_lot(tx);
                Vec::new()
            }
            TransactionType::Sell => self.relieve_fifo(tx),
        }
    }

    fn open_lot(&mut self, tx: &Transaction) {
        self.lots.push_back(Lot {
            transaction_id: tx.id.clone(),
            opened_at: tx.trade_at,
            original_qty: tx.quantity,
            remaining_qty: tx.quantity,
            cost_basis_per_share: tx.price,
            cost_basis_remaining: tx.quantity * tx.price,
        });
    }

    /// Consumes lots from the front. The SELL's fee is charged once, on the first
    /// realized trade it emits.
    fn relieve_fifo(&mut self, tx: &Transaction) -> Vec<RealizedTrade> {
        let mut trades = Vec::new();
        let mut to_sell = tx.quantity;
        let mut fees_pending = tx.fees;

        while to_sell > Decimal::ZERO {
            let Some(lot) = self.lots.front_mut() else {
                break;
            };
            let consumed = lot.remaining_qty.min(to_sell);
            let cost_basis = lot.consume(consumed);
            let proceeds = consumed * tx.price;
            let fees = std::mem::replace(&mut fees_pending, Decimal::ZERO);

            trades.push(RealizedTrade {
                sell_transaction_id: tx.id.clone(),
                sell_date: tx.trade_at,
                qty: consumed,
                proceeds,
                cost_basis,
                fees,
                realized_pnl: proceeds - cost_basis - fees,
            });

            to_sell -= consumed;
            if lot.is_exhausted() {
                self.lots.pop_front();
            }
        }

        if to_sell > Decimal::ZERO {
            warn!(
                "SELL {} of {} exceeds open lots by {}; ledger was not validated",
                tx.id, tx.instrument_id, to_sell
            );
        }
        trades
    }

    pub fn lots(&self) -> impl Iterator<Item = &Lot> {
        self.lots.iter()
    }

    pub fn total_quantity(&self) -> Decimal {
        self.lots.iter().map(|lot| lot.remaining_qty).sum()
    }

    pub fn total_cost_basis(&self) -> Decimal {
        self.lots.iter().map(|lot| lot.cost_basis_remaining).sum()
    }

    pub fn into_lots(self) -> Vec<Lot> {
        self.lots.into()
    }
}

/// Runs FIFO lot accounting over the transactions of one instrument.
///
/// Input may be in any order; it is sorted by `trade_at`, ties keeping input order.
pub fn process_transactions(transactions: &[Transaction]) -> LedgerResult {
    let mut ordered: Vec<&Transaction> = transactions.iter().collect();
    ordered.sort_by_key(|tx| tx.trade_at);

    let mut tracker = LotTracker::new();
    let mut realized_trades = Vec::new();
    for tx in ordered {
        realized_trades.extend(tracker.apply(tx));
    }

    LedgerResult {
        lots: tracker.into_lots(),
        realized_trades,
    }
}

/// Sum of `realized_pnl` across `trades`.
pub fn compute_realized_pnl<'a, I>(trades: I) -> Decimal
where
    I: IntoIterator<Item = &'a RealizedTrade>,
{
    trades.into_iter().map(|trade| trade.realized_pnl).sum()
}

/// Mark-to-market gain of open lots at `mark_price`.
pub fn compute_unrealized_pnl(lots: &[Lot], mark_price: Decimal) -> Decimal {
    lots.iter()
        .map(|lot| lot.remaining_qty * mark_price - lot.cost_basis_remaining)
        .sum()
}
