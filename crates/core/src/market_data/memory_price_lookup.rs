//! In-memory price lookup backed by per-instrument ordered bar maps.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use super::market_data_errors::MarketDataError;
use super::market_data_model::{PriceBar, ResolvedPrice};
use super::market_data_traits::PriceLookupTrait;
use crate::errors::{Error, Result};

#[derive(Debug, Default)]
pub struct InMemoryPriceLookup {
    bars: RwLock<HashMap<String, BTreeMap<NaiveDate, Decimal>>>,
}

impl InMemoryPriceLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars<I>(bars: I) -> Self
    where
        I: IntoIterator<Item = PriceBar>,
    {
        let lookup = Self::new();
        {
            let mut guard = lookup
                .bars
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            for bar in bars {
                guard
                    .entry(bar.instrument_id)
                    .or_default()
                    .insert(bar.date, bar.close);
            }
        }
        lookup
    }

    /// Inserts or replaces the close for `instrument_id` on `date`.
    pub fn insert_bar(&self, instrument_id: &str, date: NaiveDate, close: Decimal) -> Result<()> {
        if close <= Decimal::ZERO {
            return Err(MarketDataError::InvalidData(format!(
                "close for {} on {} must be positive, got {}",
                instrument_id, date, close
            ))
            .into());
        }
        let mut guard = self
            .bars
            .write()
            .map_err(|e| Error::Unexpected(format!("price map lock poisoned: {}", e)))?;
        guard
            .entry(instrument_id.to_string())
            .or_default()
            .insert(date, close);
        Ok(())
    }

    fn read<T>(
        &self,
        f: impl FnOnce(&HashMap<String, BTreeMap<NaiveDate, Decimal>>) -> T,
    ) -> Result<T> {
        let guard = self
            .bars
            .read()
            .map_err(|e| Error::Unexpected(format!("price map lock poisoned: {}", e)))?;
        Ok(f(&guard))
    }
}

#[async_trait]
impl PriceLookupTrait for InMemoryPriceLookup {
    async fn get_close_price(
        &self,
        instrument_id: &str,
        date: NaiveDate,
    ) -> Result<Option<Decimal>> {
        self.read(|bars| {
            bars.get(instrument_id)
                .and_then(|series| series.get(&date))
                .copied()
        })
    }

    async fn get_close_price_or_carry_forward(
        &self,
        instrument_id: &str,
        date: NaiveDate,
    ) -> Result<Option<ResolvedPrice>> {
        self.read(|bars| {
            bars.get(instrument_id)
                .and_then(|series| series.range(..=date).next_back())
                .map(|(actual_date, close)| ResolvedPrice::new(*close, *actual_date, date))
        })
    }

    async fn get_first_bar_date(&self, instrument_id: &str) -> Result<Option<NaiveDate>> {
        self.read(|bars| {
            bars.get(instrument_id)
                .and_then(|series| series.keys().next())
                .copied()
        })
    }
}
