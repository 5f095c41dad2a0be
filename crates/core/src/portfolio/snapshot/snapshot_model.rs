//! Portfolio snapshot domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Valuation of one holding on a snapshot date.
///
/// Serialized through [`HoldingEntryRecord`], the flat shape stored in `holdingsJson`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "HoldingEntryRecord", try_from = "HoldingEntryRecord")]
pub enum HoldingSnapshotEntry {
    /// Valued at a close on the snapshot date.
    Priced {
        instrument_id: String,
        quantity: Decimal,
        value: Decimal,
        cost_basis: Decimal,
    },
    /// Valued at the most recent earlier close.
    CarryForward {
        instrument_id: String,
        quantity: Decimal,
        value: Decimal,
        cost_basis: Decimal,
        price_date: NaiveDate,
    },
    /// No close on or before the snapshot date; value is zero and excluded from totals.
    CostBasisOnly {
        instrument_id: String,
        quantity: Decimal,
        cost_basis: Decimal,
    },
}

impl HoldingSnapshotEntry {
    /// Id of the instrument the holding belongs to, independent of its map key.
    pub fn instrument_id(&self) -> &str {
        match self {
            Self::Priced { instrument_id, .. }
            | Self::CarryForward { instrument_id, .. }
            | Self::CostBasisOnly { instrument_id, .. } => instrument_id,
        }
    }

    pub fn quantity(&self) -> Decimal {
        match self {
            Self::Priced { quantity, .. }
            | Self::CarryForward { quantity, .. }
            | Self::CostBasisOnly { quantity, .. } => *quantity,
        }
    }

    pub fn value(&self) -> Decimal {
        match self {
            Self::Priced { value, .. } | Self::CarryForward { value, .. } => *value,
            Self::CostBasisOnly { .. } => Decimal::ZERO,
        }
    }

    pub fn cost_basis(&self) -> Decimal {
        match self {
            Self::Priced { cost_basis, .. }
            | Self::CarryForward { cost_basis, .. }
            | Self::CostBasisOnly { cost_basis, .. } => *cost_basis,
        }
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self, Self::CarryForward { .. })
    }

    pub fn is_cost_basis_only(&self) -> bool {
        matches!(self, Self::CostBasisOnly { .. })
    }

    /// `value - cost_basis`, or `None` when the holding has no price.
    pub fn unrealized_pnl(&self) -> Option<Decimal> {
        match self {
            Self::CostBasisOnly { .. } => None,
            _ => Some(self.value() - self.cost_basis()),
        }
    }
}

/// Flat wire shape of a holding entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingEntryRecord {
    pub instrument_id: String,
    pub qty: Decimal,
    pub value: Decimal,
    pub cost_basis: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_estimated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_basis_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_date: Option<NaiveDate>,
}

impl From<HoldingSnapshotEntry> for HoldingEntryRecord {
    fn from(entry: HoldingSnapshotEntry) -> Self {
        match entry {
            HoldingSnapshotEntry::Priced {
                instrument_id,
                quantity,
                value,
                cost_basis,
            } => HoldingEntryRecord {
                instrument_id,
                qty: quantity,
                value,
                cost_basis,
                is_estimated: None,
                cost_basis_only: None,
                price_date: None,
            },
            HoldingSnapshotEntry::CarryForward {
                instrument_id,
                quantity,
                value,
                cost_basis,
                price_date,
            } => HoldingEntryRecord {
                instrument_id,
                qty: quantity,
                value,
                cost_basis,
                is_estimated: Some(true),
                cost_basis_only: None,
                price_date: Some(price_date),
            },
            HoldingSnapshotEntry::CostBasisOnly {
                instrument_id,
                quantity,
                cost_basis,
            } => HoldingEntryRecord {
                instrument_id,
                qty: quantity,
                value: Decimal::ZERO,
                cost_basis,
                is_estimated: None,
                cost_basis_only: Some(true),
                price_date: None,
            },
        }
    }
}

impl TryFrom<HoldingEntryRecord> for HoldingSnapshotEntry {
    type Error = String;

    fn try_from(record: HoldingEntryRecord) -> std::result::Result<Self, Self::Error> {
        let estimated = record.is_estimated.unwrap_or(false);
        let cost_basis_only = record.cost_basis_only.unwrap_or(false);
        match (estimated, cost_basis_only) {
            (true, true) => Err("holding cannot be both estimated and cost-basis-only".to_string()),
            (false, true) => {
                if !record.value.is_zero() {
                    return Err(format!(
                        "cost-basis-only holding must have zero value, got {}",
                        record.value
                    ));
                }
                Ok(HoldingSnapshotEntry::CostBasisOnly {
                    instrument_id: record.instrument_id,
                    quantity: record.qty,
                    cost_basis: record.cost_basis,
                })
            }
            (true, false) => {
                let price_date = record
                    .price_date
                    .ok_or_else(|| "estimated holding is missing priceDate".to_string())?;
                Ok(HoldingSnapshotEntry::CarryForward {
                    instrument_id: record.instrument_id,
                    quantity: record.qty,
                    value: record.value,
                    cost_basis: record.cost_basis,
                    price_date,
                })
            }
            (false, false) => Ok(HoldingSnapshotEntry::Priced {
                instrument_id: record.instrument_id,
                quantity: record.qty,
                value: record.value,
                cost_basis: record.cost_basis,
            }),
        }
    }
}

/// Full valuation state of the portfolio at the close of one trading day.
///
/// `date` is the natural key. A rebuild replaces the whole snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValueSnapshot {
    pub date: NaiveDate,
    /// Sum of holding values, excluding cost-basis-only holdings.
    pub total_value: Decimal,
    /// Sum of cost basis over every open holding.
    pub total_cost_basis: Decimal,
    /// Cumulative realized PnL of all sells on or before `date`.
    pub realized_pnl: Decimal,
    /// Sum of `value - cost_basis` over priced holdings.
    pub unrealized_pnl: Decimal,
    /// Keyed by instrument symbol. A second instrument sharing a symbol on the same
    /// date is keyed by its instrument id.
    #[serde(rename = "holdingsJson", default)]
    pub holdings: BTreeMap<String, HoldingSnapshotEntry>,
    pub rebuilt_at: DateTime<Utc>,
}

impl PortfolioValueSnapshot {
    /// A snapshot with no open holdings.
    pub fn empty(date: NaiveDate, realized_pnl: Decimal, rebuilt_at: DateTime<Utc>) -> Self {
        Self {
            date,
            total_value: Decimal::ZERO,
            total_cost_basis: Decimal::ZERO,
            realized_pnl,
            unrealized_pnl: Decimal::ZERO,
            holdings: BTreeMap::new(),
            rebuilt_at,
        }
    }

    /// Adds a holding and folds it into the totals.
    pub fn add_holding(&mut self, symbol: String, entry: HoldingSnapshotEntry) {
        self.total_cost_basis += entry.cost_basis();
        if let Some(pnl) = entry.unrealized_pnl() {
            self.total_value += entry.value();
            self.unrealized_pnl += pnl;
        }
        self.holdings.insert(symbol, entry);
    }

    /// Compares everything except `rebuilt_at`.
    pub fn is_content_equal(&self, other: &Self) -> bool {
        self.date == other.date
            && self.total_value == other.total_value
            && self.total_cost_basis == other.total_cost_basis
            && self.realized_pnl == other.realized_pnl
            && self.unrealized_pnl == other.unrealized_pnl
            && self.holdings == other.holdings
    }
}
