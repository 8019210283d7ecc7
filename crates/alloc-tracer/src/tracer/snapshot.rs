//! Immutable trace results.

use crate::aggregator::{AggregationKey, KeyField, StatRow, TableSnapshot};
use crate::utils::config::STAT_COLUMNS;

/// Header for a key configuration: key columns then the statistic columns
pub fn header_for(fields: &[KeyField]) -> Vec<&'static str> {
    fields
        .iter()
        .map(|field| field.name())
        .chain(STAT_COLUMNS.iter().copied())
        .collect()
}

/// Copy of the aggregate table at one point in time
///
/// **Public** - returned by `result`, `stop` and `trace`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceResult {
    fields: Vec<KeyField>,
    rows: TableSnapshot,
}

impl TraceResult {
    pub fn new(fields: Vec<KeyField>, rows: TableSnapshot) -> Self {
        Self { fields, rows }
    }

    /// Key fields configured when the result was taken
    pub fn fields(&self) -> &[KeyField] {
        &self.fields
    }

    pub fn header(&self) -> Vec<&'static str> {
        header_for(&self.fields)
    }

    pub fn rows(&self) -> &TableSnapshot {
        &self.rows
    }

    pub fn into_rows(self) -> TableSnapshot {
        self.rows
    }

    pub fn get(&self, key: &AggregationKey) -> Option<&StatRow> {
        self.rows.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AggregationKey, &StatRow)> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every key here is present in `later` with statistics at least as large
    pub fn is_dominated_by(&self, later: &TraceResult) -> bool {
        self.rows.iter().all(|(key, row)| {
            later
                .rows
                .get(key)
                .is_some_and(|later_row| later_row.dominates(row))
        })
    }
}
