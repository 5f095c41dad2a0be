use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::market_data_model::ResolvedPrice;
use crate::errors::Result;

/// Read access to daily close prices.
///
/// Implementations own provider fallback, caching and rate limiting; the engine
/// calls these sequentially and never retries.
#[async_trait]
pub trait PriceLookupTrait: Send + Sync {
    /// Close price on exactly `date`, if a bar exists.
    async fn get_close_price(&self, instrument_id: &str, date: NaiveDate)
        -> Result<Option<Decimal>>;

    /// Most recent close on or before `date`.
    async fn get_close_price_or_carry_forward(
        &self,
        instrument_id: &str,
        date: NaiveDate,
    ) -> Result<Option<ResolvedPrice>>;

    /// Date of the earliest bar for the instrument.
    async fn get_first_bar_date(&self, instrument_id: &str) -> Result<Option<NaiveDate>>;
}

/// Exchange trading calendar.
pub trait TradingCalendarTrait: Send + Sync {
    fn is_trading_day(&self, date: NaiveDate, exchange: &str) -> bool;

    /// First trading day strictly after `date`.
    fn next_trading_day(&self, date: NaiveDate, exchange: &str) -> NaiveDate;
}
