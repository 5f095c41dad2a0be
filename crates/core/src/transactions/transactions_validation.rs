//! Ledger consistency validation.

use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::transactions_model::Transaction;

/// Details of the first transaction that drives a position negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerViolation {
    pub offending_transaction: Transaction,
    /// Absolute value of the running quantity right after the offender is applied.
    pub deficit_qty: Decimal,
    pub first_negative_date: DateTime<Utc>,
}

impl std::fmt::Display for LedgerViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} of {} on {} leaves the position short by {}",
            self.offending_transaction.transaction_type,
            self.offending_transaction.quantity,
            self.offending_transaction.instrument_id,
            self.first_negative_date,
            self.deficit_qty
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LedgerValidation {
    Valid,
    Invalid(LedgerViolation),
}

impl LedgerValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, LedgerValidation::Valid)
    }
}

/// Checks that the running quantity of one instrument never goes below zero.
///
/// Transactions may arrive in any order; they are walked by `trade_at` with ties kept
/// in input order.
pub fn validate_transaction_set(transactions: &[Transaction]) -> LedgerValidation {
    let mut ordered: Vec<&Transaction> = transactions.iter().collect();
    ordered.sort_by_key(|tx| tx.trade_at);

    let mut running = Decimal::ZERO;
    for tx in ordered {
        running += tx.signed_quantity();
        if running < Decimal::ZERO {
            debug!(
                "Transaction {} drives {} negative ({}) on {}",
                tx.id, tx.instrument_id, running, tx.trade_at
            );
            return LedgerValidation::Invalid(LedgerViolation {
                offending_transaction: tx.clone(),
                deficit_qty: running.abs(),
                first_negative_date: tx.trade_at,
            });
        }
    }
    LedgerValidation::Valid
}
