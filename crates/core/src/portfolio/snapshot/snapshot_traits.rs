//! Storage trait for portfolio value snapshots.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::PortfolioValueSnapshot;
use crate::errors::Result;

/// Persistence seam for daily snapshots, keyed by date.
#[async_trait]
pub trait SnapshotStoreTrait: Send + Sync {
    /// Upserts snapshots by date.
    async fn write_batch(&self, snapshots: &[PortfolioValueSnapshot]) -> Result<()>;

    /// Snapshots with `start <= date <= end`, ascending by date.
    async fn get_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PortfolioValueSnapshot>>;

    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<PortfolioValueSnapshot>>;

    /// Deletes every snapshot dated `date` or later. Returns the number removed.
    async fn delete_from(&self, date: NaiveDate) -> Result<usize>;

    /// Deletes snapshots in `[start, end]`. Returns the number removed.
    async fn delete_range(&self, start: NaiveDate, end: NaiveDate) -> Result<usize>;

    /// Deletes snapshots in `[start, end]` and writes `snapshots` as one atomic unit.
    ///
    /// On failure the range must be left exactly as it was. Returns the number written.
    async fn overwrite_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        snapshots: &[PortfolioValueSnapshot],
    ) -> Result<usize>;
}
