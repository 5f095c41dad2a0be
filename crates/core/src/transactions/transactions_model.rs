//! Transaction and instrument domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{Result, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Buy,
    Sell,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Buy => write!(f, "BUY"),
            TransactionType::Sell => write!(f, "SELL"),
        }
    }
}

/// One immutable row of the ledger. Effective at `trade_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub instrument_id: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub quantity: Decimal,
    pub price: Decimal,
    #[serde(default)]
    pub fees: Decimal,
    pub trade_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Transaction {
    pub fn is_buy(&self) -> bool {
        self.transaction_type == TransactionType::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.transaction_type == TransactionType::Sell
    }

    /// Signed quantity contribution to the running position.
    pub fn signed_quantity(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Buy => self.quantity,
            TransactionType::Sell => -self.quantity,
        }
    }

    /// Checks the field-level constraints a ledger row must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.quantity <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "Transaction {}: quantity must be positive, got {}",
                self.id, self.quantity
            ))
            .into());
        }
        if self.price <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "Transaction {}: price must be positive, got {}",
                self.id, self.price
            ))
            .into());
        }
        if self.fees < Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "Transaction {}: fees must not be negative, got {}",
                self.id, self.fees
            ))
            .into());
        }
        Ok(())
    }
}

/// Instrument reference data needed to label holdings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub id: String,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
}

/// Splits a ledger into per-instrument lists sorted by `trade_at`.
///
/// The sort is stable: rows sharing a `trade_at` keep their input order.
pub fn group_by_instrument(transactions: &[Transaction]) -> BTreeMap<String, Vec<&Transaction>> {
    let mut grouped: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
    for tx in transactions {
        grouped.entry(tx.instrument_id.clone()).or_default().push(tx);
    }
    for rows in grouped.values_mut() {
        rows.sort_by_key(|tx| tx.trade_at);
    }
    grouped
}
