//! Day-by-day valuation of a transaction ledger.

use chrono::{NaiveDate, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::errors::{CalculatorError, Result};
use crate::market_data::{PriceLookupTrait, TradingCalendarTrait};
use crate::portfolio::ledger::{compute_realized_pnl, LotTracker};
use crate::portfolio::snapshot::{HoldingSnapshotEntry, PortfolioValueSnapshot};
use crate::transactions::{group_by_instrument, Instrument, Transaction};

/// Per-instrument state threaded through the day loop.
struct InstrumentCursor<'a> {
    instrument_id: String,
    symbol: String,
    transactions: Vec<&'a Transaction>,
    next: usize,
    tracker: LotTracker,
    /// Fetched on first use; `Some(None)` means the instrument has no bars at all.
    first_bar: Option<Option<NaiveDate>>,
}

impl<'a> InstrumentCursor<'a> {
    /// Applies every transaction valued on or before `date`, returning realized PnL.
    fn advance_to(&mut self, date: NaiveDate, config: &EngineConfig) -> Decimal {
        let mut realized = Decimal::ZERO;
        while let Some(tx) = self.transactions.get(self.next) {
            if config.valuation_date(tx.trade_at) > date {
                break;
            }
            realized += compute_realized_pnl(&self.tracker.apply(tx));
            self.next += 1;
        }
        realized
    }

    async fn first_bar_date(
        &mut self,
        price_lookup: &dyn PriceLookupTrait,
    ) -> Result<Option<NaiveDate>> {
        if let Some(cached) = self.first_bar {
            return Ok(cached);
        }
        let first = price_lookup.get_first_bar_date(&self.instrument_id).await?;
        self.first_bar = Some(first);
        Ok(first)
    }

    /// Values the open lots on `date`.
    async fn holding_entry(
        &mut self,
        date: NaiveDate,
        price_lookup: &dyn PriceLookupTrait,
    ) -> Result<HoldingSnapshotEntry> {
        let quantity = self.tracker.total_quantity();
        let cost_basis = self.tracker.total_cost_basis();

        let first_bar = self.first_bar_date(price_lookup).await?;
        let has_history = matches!(first_bar, Some(first) if first <= date);
        let resolved = if has_history {
            price_lookup
                .get_close_price_or_carry_forward(&self.instrument_id, date)
                .await?
        } else {
            None
        };

        Ok(match resolved {
            Some(price) if price.actual_date >= date => HoldingSnapshotEntry::Priced {
                instrument_id: self.instrument_id.clone(),
                quantity,
                value: quantity * price.price,
                cost_basis,
            },
            Some(price) => {
                debug!(
                    "{} on {}: carrying forward close {} from {}",
                    self.symbol, date, price.price, price.actual_date
                );
                HoldingSnapshotEntry::CarryForward {
                    instrument_id: self.instrument_id.clone(),
                    quantity,
                    value: quantity * price.price,
                    cost_basis,
                    price_date: price.actual_date,
                }
            }
            None => {
                debug!(
                    "{} on {}: no close on or before date, holding valued at cost basis only",
                    self.symbol, date
                );
                HoldingSnapshotEntry::CostBasisOnly {
                    instrument_id: self.instrument_id.clone(),
                    quantity,
                    cost_basis,
                }
            }
        })
    }
}

fn build_cursors<'a>(
    transactions: &'a [Transaction],
    instruments: &[Instrument],
) -> Vec<InstrumentCursor<'a>> {
    let symbols: HashMap<&str, &str> = instruments
        .iter()
        .map(|i| (i.id.as_str(), i.symbol.as_str()))
        .collect();

    group_by_instrument(transactions)
        .into_iter()
        .map(|(instrument_id, rows)| {
            let symbol = match symbols.get(instrument_id.as_str()) {
                Some(symbol) => symbol.to_string(),
                None => {
                    warn!(
                        "No instrument record for {}; using the id as its symbol",
                        instrument_id
                    );
                    instrument_id.clone()
                }
            };
            InstrumentCursor {
                instrument_id,
                symbol,
                transactions: rows,
                next: 0,
                tracker: LotTracker::new(),
                first_bar: None,
            }
        })
        .collect()
}

/// First trading day on or after `date`.
fn first_trading_day_from(
    date: NaiveDate,
    calendar: &dyn TradingCalendarTrait,
    exchange: &str,
) -> Result<NaiveDate> {
    if calendar.is_trading_day(date, exchange) {
        Ok(date)
    } else {
        next_trading_day_after(date, calendar, exchange)
    }
}

fn next_trading_day_after(
    date: NaiveDate,
    calendar: &dyn TradingCalendarTrait,
    exchange: &str,
) -> Result<NaiveDate> {
    let next = calendar.next_trading_day(date, exchange);
    if next <= date {
        return Err(CalculatorError::CalendarStalled {
            exchange: exchange.to_string(),
            date,
        }
        .into());
    }
    Ok(next)
}

/// Computes one snapshot per trading day in `[start_date, end_date]`.
///
/// Lot state is advanced incrementally: each instrument's transactions are applied once,
/// on the first trading day on or after their valuation date, and carried forward
/// unchanged on days without activity. Nothing is written; callers persist the result.
pub async fn calculate_value_series(
    transactions: &[Transaction],
    instruments: &[Instrument],
    price_lookup: &dyn PriceLookupTrait,
    calendar: &dyn TradingCalendarTrait,
    config: &EngineConfig,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<PortfolioValueSnapshot>> {
    if start_date > end_date {
        debug!(
            "Empty valuation range {}..={}; nothing to compute",
            start_date, end_date
        );
        return Ok(Vec::new());
    }

    let rebuilt_at = Utc::now();
    let exchange = config.exchange.as_str();
    let mut cursors = build_cursors(transactions, instruments);
    let mut cumulative_realized = Decimal::ZERO;
    let mut snapshots = Vec::new();

    let mut date = first_trading_day_from(start_date, calendar, exchange)?;
    while date <= end_date {
        let mut snapshot = PortfolioValueSnapshot::empty(date, Decimal::ZERO, rebuilt_at);

        for cursor in cursors.iter_mut() {
            cumulative_realized += cursor.advance_to(date, config);
            if !config.is_quantity_significant(&cursor.tracker.total_quantity()) {
                continue;
            }
            let entry = cursor.holding_entry(date, price_lookup).await?;
            let key = if snapshot.holdings.contains_key(&cursor.symbol) {
                warn!(
                    "Symbol {} is shared by several instruments; keying {} by id on {}",
                    cursor.symbol, cursor.instrument_id, date
                );
                cursor.instrument_id.clone()
            } else {
                cursor.symbol.clone()
            };
            snapshot.add_holding(key, entry);
        }

        snapshot.realized_pnl = cumulative_realized;
        snapshots.push(snapshot);
        date = next_trading_day_after(date, calendar, exchange)?;
    }

    Ok(snapshots)
}
