//! In-memory snapshot store.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{PortfolioValueSnapshot, SnapshotStoreTrait};
use crate::errors::{DatabaseError, Result};

/// Date-keyed snapshot map behind one lock.
///
/// `overwrite_range` runs its delete and its writes under a single write guard, so
/// concurrent readers never observe a half-rebuilt range.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshots: RwLock<BTreeMap<NaiveDate, PortfolioValueSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<NaiveDate, PortfolioValueSnapshot>>> {
        self.snapshots
            .read()
            .map_err(|e| DatabaseError::Internal(format!("snapshot lock poisoned: {}", e)).into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<NaiveDate, PortfolioValueSnapshot>>> {
        self.snapshots
            .write()
            .map_err(|e| DatabaseError::Internal(format!("snapshot lock poisoned: {}", e)).into())
    }
}

fn remove_range(
    map: &mut BTreeMap<NaiveDate, PortfolioValueSnapshot>,
    start: NaiveDate,
    end: NaiveDate,
) -> usize {
    if start > end {
        return 0;
    }
    let doomed: Vec<NaiveDate> = map.range(start..=end).map(|(date, _)| *date).collect();
    for date in &doomed {
        map.remove(date);
    }
    doomed.len()
}

#[async_trait]
impl SnapshotStoreTrait for InMemorySnapshotStore {
    async fn write_batch(&self, snapshots: &[PortfolioValueSnapshot]) -> Result<()> {
        let mut guard = self.write()?;
        for snapshot in snapshots {
            guard.insert(snapshot.date, snapshot.clone());
        }
        Ok(())
    }

    async fn get_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PortfolioValueSnapshot>> {
        if start > end {
            return Ok(Vec::new());
        }
        Ok(self
            .read()?
            .range(start..=end)
            .map(|(_, snapshot)| snapshot.clone())
            .collect())
    }

    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<PortfolioValueSnapshot>> {
        Ok(self.read()?.get(&date).cloned())
    }

    async fn delete_from(&self, date: NaiveDate) -> Result<usize> {
        let mut guard = self.write()?;
        let tail = guard.split_off(&date);
        Ok(tail.len())
    }

    async fn delete_range(&self, start: NaiveDate, end: NaiveDate) -> Result<usize> {
        let mut guard = self.write()?;
        Ok(remove_range(&mut guard, start, end))
    }

    async fn overwrite_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        snapshots: &[PortfolioValueSnapshot],
    ) -> Result<usize> {
        if let Some(stray) = snapshots.iter().find(|s| s.date < start || s.date > end) {
            return Err(DatabaseError::TransactionFailed(format!(
                "snapshot dated {} lies outside overwrite range {}..={}",
                stray.date, start, end
            ))
            .into());
        }

        let mut guard = self.write()?;
        let removed = remove_range(&mut guard, start, end);
        for snapshot in snapshots {
            guard.insert(snapshot.date, snapshot.clone());
        }
        debug!(
            "Overwrote snapshots {}..={}: removed {}, wrote {}",
            start,
            end,
            removed,
            snapshots.len()
        );
        Ok(snapshots.len())
    }
}
