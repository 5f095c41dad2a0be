use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use std::sync::Arc;
use std::time::Instant;

use super::valuation_builder::calculate_value_series;
use super::valuation_model::{RebuildSummary, SeriesBuildSummary};
use crate::config::EngineConfig;
use crate::errors::{Result, ValidationError};
use crate::market_data::{PriceLookupTrait, TradingCalendarTrait};
use crate::portfolio::snapshot::SnapshotStoreTrait;
use crate::portfolio::window::{
    filter_as_of, realized_pnl_in_window, summarize_window, WindowQuery, WindowResult,
};
use crate::transactions::{Instrument, Transaction};

#[async_trait]
pub trait ValuationServiceTrait: Send + Sync {
    /// Replaces the stored snapshots in `[start_date, end_date]` with one freshly
    /// computed snapshot per trading day.
    ///
    /// The range is computed in full before the store is touched, then written with a
    /// single atomic `overwrite_range`.
    async fn build_portfolio_value_series(
        &self,
        transactions: &[Transaction],
        instruments: &[Instrument],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<SeriesBuildSummary>;

    /// Rebuilds snapshots from `affected_date` through `end_date`, leaving earlier
    /// snapshots untouched. A snapshot depends only on trades and prices on or
    /// before its own date, so nothing before `affected_date` can change.
    async fn rebuild_snapshots_from(
        &self,
        affected_date: NaiveDate,
        transactions: &[Transaction],
        instruments: &[Instrument],
        end_date: NaiveDate,
    ) -> Result<RebuildSummary>;

    /// Builds (write-through) and reads back the window, then derives change metrics.
    async fn query_portfolio_window(
        &self,
        query: &WindowQuery,
        transactions: &[Transaction],
        instruments: &[Instrument],
    ) -> Result<WindowResult>;
}

#[derive(Clone)]
pub struct ValuationService {
    price_lookup: Arc<dyn PriceLookupTrait>,
    snapshot_store: Arc<dyn SnapshotStoreTrait>,
    calendar: Arc<dyn TradingCalendarTrait>,
    config: EngineConfig,
}

impl ValuationService {
    pub fn new(
        price_lookup: Arc<dyn PriceLookupTrait>,
        snapshot_store: Arc<dyn SnapshotStoreTrait>,
        calendar: Arc<dyn TradingCalendarTrait>,
        config: EngineConfig,
    ) -> Self {
        Self {
            price_lookup,
            snapshot_store,
            calendar,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Valuation date from which a ledger change at `affected_at` must be rebuilt.
    pub fn affected_date(&self, affected_at: DateTime<Utc>) -> NaiveDate {
        self.config.valuation_date(affected_at)
    }

    fn ensure_range(start_date: NaiveDate, end_date: NaiveDate) -> Result<()> {
        if start_date > end_date {
            return Err(ValidationError::InvalidInput(format!(
                "start date {} is after end date {}",
                start_date, end_date
            ))
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl ValuationServiceTrait for ValuationService {
    async fn build_portfolio_value_series(
        &self,
        transactions: &[Transaction],
        instruments: &[Instrument],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<SeriesBuildSummary> {
        Self::ensure_range(start_date, end_date)?;
        let started = Instant::now();
        debug!(
            "Building valuation series {}..={} over {} transaction(s)",
            start_date,
            end_date,
            transactions.len()
        );

        let snapshots = calculate_value_series(
            transactions,
            instruments,
            self.price_lookup.as_ref(),
            self.calendar.as_ref(),
            &self.config,
            start_date,
            end_date,
        )
        .await?;

        let snapshots_written = self
            .snapshot_store
            .overwrite_range(start_date, end_date, &snapshots)
            .await?;

        debug!(
            "Wrote {} snapshot(s) for {}..={} in {:?}",
            snapshots_written,
            start_date,
            end_date,
            started.elapsed()
        );
        Ok(SeriesBuildSummary {
            start_date,
            end_date,
            snapshots_written,
        })
    }

    async fn rebuild_snapshots_from(
        &self,
        affected_date: NaiveDate,
        transactions: &[Transaction],
        instruments: &[Instrument],
        end_date: NaiveDate,
    ) -> Result<RebuildSummary> {
        if affected_date > end_date {
            debug!(
                "Affected date {} is after {}; no snapshots to rebuild",
                affected_date, end_date
            );
            return Ok(RebuildSummary {
                snapshots_rebuilt: 0,
            });
        }

        let summary = self
            .build_portfolio_value_series(transactions, instruments, affected_date, end_date)
            .await?;
        Ok(RebuildSummary {
            snapshots_rebuilt: summary.snapshots_written,
        })
    }

    async fn query_portfolio_window(
        &self,
        query: &WindowQuery,
        transactions: &[Transaction],
        instruments: &[Instrument],
    ) -> Result<WindowResult> {
        Self::ensure_range(query.start_date, query.end_date)?;
        let visible = filter_as_of(transactions, query.as_of);

        self.build_portfolio_value_series(&visible, instruments, query.start_date, query.end_date)
            .await?;
        let snapshots = self
            .snapshot_store
            .get_range(query.start_date, query.end_date)
            .await?;

        let realized =
            realized_pnl_in_window(&visible, query.start_date, query.end_date, &self.config);
        summarize_window(
            query.start_date,
            query.end_date,
            &snapshots,
            realized,
            instruments,
        )
    }
}
