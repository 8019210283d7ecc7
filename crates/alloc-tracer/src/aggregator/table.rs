//! Aggregation table: key -> cumulative statistics.
//!
//! Rows are created lazily on the first allocation with a given key and live
//! until the table is cleared.

use super::key::AggregationKey;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Cumulative statistics for one aggregation key
///
/// **Public** - the value type of every snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRow {
    /// Allocations seen
    pub count: u64,

    /// Objects promoted to the old generation
    pub old_count: u64,

    /// Sum of ages at free, in generations
    pub total_age: u64,

    /// Smallest age at free (0 until the first free)
    pub min_age: u64,

    /// Largest age at free (0 until the first free)
    pub max_age: u64,

    /// Sum of the measured sizes of freed objects
    pub total_memsize: u64,
}

impl StatRow {
    /// Number of statistic columns
    pub const COLUMN_COUNT: usize = 6;

    /// Values in header order
    pub fn columns(&self) -> [u64; Self::COLUMN_COUNT] {
        [
            self.count,
            self.old_count,
            self.total_age,
            self.min_age,
            self.max_age,
            self.total_memsize,
        ]
    }

    /// True when every field is at least the other row's value
    ///
    /// Min age can legitimately shrink as more frees arrive, so it is excluded.
    pub fn dominates(&self, earlier: &StatRow) -> bool {
        self.count >= earlier.count
            && self.old_count >= earlier.old_count
            && self.total_age >= earlier.total_age
            && self.max_age >= earlier.max_age
            && self.total_memsize >= earlier.total_memsize
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct RowState {
    stats: StatRow,
    freed: u64,
}

/// Ordered copy of the table, unaffected by later events
pub type TableSnapshot = BTreeMap<AggregationKey, StatRow>;

/// Key -> statistics table
#[derive(Debug, Default)]
pub struct AggregationTable {
    rows: HashMap<AggregationKey, RowState>,
}

impl AggregationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one allocation, creating the row if needed
    pub fn record_allocation(&mut self, key: &AggregationKey) {
        // Avoid cloning the key on the hot path when the row already exists
        if let Some(row) = self.rows.get_mut(key) {
            row.stats.count = row.stats.count.saturating_add(1);
            return;
        }

        let mut row = RowState::default();
        row.stats.count = 1;
        self.rows.insert(key.clone(), row);
    }

    /// Fold one freed object into its row
    ///
    /// # Arguments
    /// * `key` - Row the object was allocated under
    /// * `age` - Generations the object survived
    /// * `old` - Object was promoted before being freed
    /// * `size` - Measured size in bytes
    pub fn record_free(&mut self, key: &AggregationKey, age: u64, old: bool, size: u64) {
        if !self.rows.contains_key(key) {
            self.rows.insert(key.clone(), RowState::default());
        }
        let Some(row) = self.rows.get_mut(key) else {
            return;
        };
        let stats = &mut row.stats;

        if old {
            stats.old_count = stats.old_count.saturating_add(1);
        }
        stats.total_age = stats.total_age.saturating_add(age);

        if row.freed == 0 {
            stats.min_age = age;
            stats.max_age = age;
        } else {
            stats.min_age = stats.min_age.min(age);
            stats.max_age = stats.max_age.max(age);
        }
        row.freed += 1;

        stats.total_memsize = stats.total_memsize.saturating_add(size);
    }

    pub fn get(&self, key: &AggregationKey) -> Option<&StatRow> {
        self.rows.get(key).map(|row| &row.stats)
    }

    /// Copy every row into an ordered map
    pub fn snapshot(&self) -> TableSnapshot {
        self.rows
            .iter()
            .map(|(key, row)| (key.clone(), row.stats))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        debug!("Clearing aggregation table ({} rows)", self.rows.len());
        self.rows.clear();
    }
}
