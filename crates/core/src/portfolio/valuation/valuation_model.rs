//! Portfolio valuation result models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Outcome of writing a valuation series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesBuildSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub snapshots_written: usize,
}

/// Outcome of an incremental rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildSummary {
    /// Trading-day snapshots written from the affected date onward.
    pub snapshots_rebuilt: usize,
}
