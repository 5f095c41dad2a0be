use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::window_model::{ValuePoint, WindowHolding, WindowResult};
use crate::config::EngineConfig;
use crate::errors::{CalculatorError, Result};
use crate::portfolio::ledger::{compute_realized_pnl, process_transactions};
use crate::portfolio::snapshot::PortfolioValueSnapshot;
use crate::transactions::{group_by_instrument, Instrument, Transaction};

/// Ledger as it stood at `as_of` (inclusive).
pub fn filter_as_of(
    transactions: &[Transaction],
    as_of: Option<DateTime<Utc>>,
) -> Vec<Transaction> {
    match as_of {
        Some(cutoff) => transactions
            .iter()
            .filter(|tx| tx.trade_at <= cutoff)
            .cloned()
            .collect(),
        None => transactions.to_vec(),
    }
}

/// Realized PnL of sells valued inside `[start_date, end_date]`, across all instruments.
///
/// Lots are matched over the full ledger so that sells in the window consume the
/// lots opened before it.
pub fn realized_pnl_in_window(
    transactions: &[Transaction],
    start_date: NaiveDate,
    end_date: NaiveDate,
    config: &EngineConfig,
) -> Decimal {
    group_by_instrument(transactions)
        .into_values()
        .map(|rows| {
            let owned: Vec<Transaction> = rows.into_iter().cloned().collect();
            let result = process_transactions(&owned);
            compute_realized_pnl(result.realized_trades.iter().filter(|trade| {
                let sold_on = config.valuation_date(trade.sell_date);
                sold_on >= start_date && sold_on <= end_date
            }))
        })
        .sum()
}

/// `absolute_change / start_value`, or zero when `start_value` is zero.
pub fn percentage_change(start_value: Decimal, absolute_change: Decimal) -> Result<Decimal> {
    if start_value.is_zero() {
        return Ok(Decimal::ZERO);
    }
    absolute_change
        .checked_div(start_value)
        .ok_or_else(|| CalculatorError::Overflow("window percentage change".to_string()).into())
}

fn window_holdings(
    snapshot: Option<&PortfolioValueSnapshot>,
    instruments: &[Instrument],
) -> Vec<WindowHolding> {
    let Some(snapshot) = snapshot else {
        return Vec::new();
    };
    let symbols_by_id: HashMap<&str, &str> = instruments
        .iter()
        .map(|i| (i.id.as_str(), i.symbol.as_str()))
        .collect();

    let mut holdings: Vec<WindowHolding> = snapshot
        .holdings
        .iter()
        .map(|(key, entry)| WindowHolding {
            instrument_id: entry.instrument_id().to_string(),
            symbol: symbols_by_id
                .get(entry.instrument_id())
                .map(|symbol| symbol.to_string())
                .unwrap_or_else(|| key.clone()),
            quantity: entry.quantity(),
            value: entry.value(),
            cost_basis: entry.cost_basis(),
            unrealized_pnl: entry.unrealized_pnl(),
            is_estimated: entry.is_estimated(),
            cost_basis_only: entry.is_cost_basis_only(),
        })
        .collect();

    holdings.sort_by(|a, b| {
        b.value
            .cmp(&a.value)
            .then_with(|| a.symbol.cmp(&b.symbol))
            .then_with(|| a.instrument_id.cmp(&b.instrument_id))
    });
    holdings
}

/// Derives window metrics from the snapshots of `[start_date, end_date]` (ascending).
pub fn summarize_window(
    start_date: NaiveDate,
    end_date: NaiveDate,
    snapshots: &[PortfolioValueSnapshot],
    realized_pnl_in_window: Decimal,
    instruments: &[Instrument],
) -> Result<WindowResult> {
    let first = snapshots.first();
    let last = snapshots.last();

    let start_value = first.map(|s| s.total_value).unwrap_or(Decimal::ZERO);
    let end_value = last.map(|s| s.total_value).unwrap_or(Decimal::ZERO);
    let absolute_change = end_value - start_value;

    Ok(WindowResult {
        start_date,
        end_date,
        start_value,
        end_value,
        absolute_change,
        percentage_change: percentage_change(start_value, absolute_change)?,
        realized_pnl_in_window,
        unrealized_pnl_at_end: last.map(|s| s.unrealized_pnl).unwrap_or(Decimal::ZERO),
        holdings: window_holdings(last, instruments),
        series: snapshots
            .iter()
            .map(|s| ValuePoint {
                date: s.date,
                total_value: s.total_value,
                total_cost_basis: s.total_cost_basis,
            })
            .collect(),
    })
}
