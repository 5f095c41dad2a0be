//! Pre-commit checks for ledger mutations.
//!
//! A mutation is never applied to storage here. The hypothetical post-mutation
//! ledger is built in memory, every instrument it touches is validated, and the
//! caller receives either the accepted ledger (plus the earliest date whose
//! snapshots must be rebuilt) or the violation to report back to the user.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::collections::BTreeSet;

use super::transactions_model::Transaction;
use super::transactions_validation::{validate_transaction_set, LedgerValidation, LedgerViolation};
use crate::errors::{Result, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerMutation {
    Create(Transaction),
    /// Replaces the existing row with the same id.
    Edit(Transaction),
    /// Removes the row with this id.
    Delete(String),
    BulkInsert(Vec<Transaction>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Accepted {
        transactions: Vec<Transaction>,
        /// Earliest trade instant whose snapshots the mutation may change.
        affected_at: DateTime<Utc>,
    },
    Rejected(LedgerViolation),
}

fn find_existing<'a>(existing: &'a [Transaction], id: &str) -> Result<&'a Transaction> {
    existing
        .iter()
        .find(|tx| tx.id == id)
        .ok_or_else(|| ValidationError::TransactionNotFound(id.to_string()).into())
}

/// Builds the ledger as it would look after `mutation`.
///
/// New and edited rows are field-validated; ledger consistency is not checked here.
pub fn apply_mutation(
    existing: &[Transaction],
    mutation: &LedgerMutation,
) -> Result<Vec<Transaction>> {
    match mutation {
        LedgerMutation::Create(tx) => {
            tx.validate()?;
            if existing.iter().any(|row| row.id == tx.id) {
                return Err(ValidationError::InvalidInput(format!(
                    "Transaction id {} already exists",
                    tx.id
                ))
                .into());
            }
            let mut next = existing.to_vec();
            next.push(tx.clone());
            Ok(next)
        }
        LedgerMutation::Edit(tx) => {
            tx.validate()?;
            find_existing(existing, &tx.id)?;
            Ok(existing
                .iter()
                .map(|row| if row.id == tx.id { tx.clone() } else { row.clone() })
                .collect())
        }
        LedgerMutation::Delete(id) => {
            find_existing(existing, id)?;
            Ok(existing.iter().filter(|row| &row.id != id).cloned().collect())
        }
        LedgerMutation::BulkInsert(rows) => {
            let mut seen: BTreeSet<&str> = existing.iter().map(|row| row.id.as_str()).collect();
            for tx in rows {
                tx.validate()?;
                if !seen.insert(tx.id.as_str()) {
                    return Err(ValidationError::InvalidInput(format!(
                        "Duplicate transaction id {} in bulk insert",
                        tx.id
                    ))
                    .into());
                }
            }
            let mut next = existing.to_vec();
            next.extend(rows.iter().cloned());
            Ok(next)
        }
    }
}

/// Instruments whose position history the mutation can change.
fn affected_instruments(
    existing: &[Transaction],
    mutation: &LedgerMutation,
) -> Result<BTreeSet<String>> {
    let mut instruments = BTreeSet::new();
    match mutation {
        LedgerMutation::Create(tx) => {
            instruments.insert(tx.instrument_id.clone());
        }
        LedgerMutation::Edit(tx) => {
            let old = find_existing(existing, &tx.id)?;
            instruments.insert(old.instrument_id.clone());
            instruments.insert(tx.instrument_id.clone());
        }
        LedgerMutation::Delete(id) => {
            instruments.insert(find_existing(existing, id)?.instrument_id.clone());
        }
        LedgerMutation::BulkInsert(rows) => {
            instruments.extend(rows.iter().map(|tx| tx.instrument_id.clone()));
        }
    }
    Ok(instruments)
}

/// Earliest trade instant the mutation touches: the old or new instant of an edit,
/// whichever is earlier.
pub fn mutation_affected_at(
    existing: &[Transaction],
    mutation: &LedgerMutation,
) -> Result<Option<DateTime<Utc>>> {
    Ok(match mutation {
        LedgerMutation::Create(tx) => Some(tx.trade_at),
        LedgerMutation::Edit(tx) => {
            let old = find_existing(existing, &tx.id)?;
            Some(old.trade_at.min(tx.trade_at))
        }
        LedgerMutation::Delete(id) => Some(find_existing(existing, id)?.trade_at),
        LedgerMutation::BulkInsert(rows) => rows.iter().map(|tx| tx.trade_at).min(),
    })
}

/// Validates the post-mutation ledger for every affected instrument.
///
/// Returns `Ok(Rejected)` for a ledger that would go short; `Err` only for malformed
/// mutations (bad fields, unknown or duplicate ids, empty bulk insert).
pub fn check_mutation(
    existing: &[Transaction],
    mutation: &LedgerMutation,
) -> Result<MutationOutcome> {
    let affected_at = mutation_affected_at(existing, mutation)?.ok_or_else(|| {
        ValidationError::InvalidInput("Bulk insert contains no transactions".to_string())
    })?;
    let instruments = affected_instruments(existing, mutation)?;
    let next = apply_mutation(existing, mutation)?;

    for instrument_id in &instruments {
        let rows: Vec<Transaction> = next
            .iter()
            .filter(|tx| &tx.instrument_id == instrument_id)
            .cloned()
            .collect();
        if let LedgerValidation::Invalid(violation) = validate_transaction_set(&rows) {
            warn!("Rejecting ledger mutation: {}", violation);
            return Ok(MutationOutcome::Rejected(violation));
        }
    }

    debug!(
        "Ledger mutation accepted for {} instrument(s); affected from {}",
        instruments.len(),
        affected_at
    );
    Ok(MutationOutcome::Accepted {
        transactions: next,
        affected_at,
    })
}
