//! Always-on per-type allocation and free counters.
//!
//! These run for the whole life of a tracer, whether or not a trace is active.

use crate::event::ValueType;
use std::collections::BTreeMap;

/// Type -> cumulative count
pub type CountTable = BTreeMap<ValueType, u64>;

#[derive(Debug, Clone)]
pub struct TypeCounters {
    allocated: [u64; ValueType::COUNT],
    freed: [u64; ValueType::COUNT],
}

impl Default for TypeCounters {
    fn default() -> Self {
        Self {
            allocated: [0; ValueType::COUNT],
            freed: [0; ValueType::COUNT],
        }
    }
}

impl TypeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_allocation(&mut self, value_type: ValueType) {
        bump(&mut self.allocated, value_type);
    }

    pub fn record_free(&mut self, value_type: ValueType) {
        bump(&mut self.freed, value_type);
    }

    /// Allocations per type; every type is present, zero if never seen
    pub fn allocated_table(&self) -> CountTable {
        to_table(&self.allocated)
    }

    /// Frees per type; every type is present, zero if never seen
    pub fn freed_table(&self) -> CountTable {
        to_table(&self.freed)
    }
}

fn bump(counts: &mut [u64; ValueType::COUNT], value_type: ValueType) {
    if let Some(slot) = counts.get_mut(value_type.index()) {
        *slot = slot.saturating_add(1);
    }
}

fn to_table(counts: &[u64; ValueType::COUNT]) -> CountTable {
    ValueType::ALL
        .iter()
        .zip(counts.iter())
        .map(|(value_type, count)| (*value_type, *count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_list_every_type() {
        let counters = TypeCounters::new();
        let table = counters.allocated_table();
        assert_eq!(table.len(), ValueType::COUNT);
        assert_eq!(table[&ValueType::None], 0);
    }

    #[test]
    fn test_counts_are_independent() {
        let mut counters = TypeCounters::new();
        counters.record_allocation(ValueType::String);
        counters.record_allocation(ValueType::String);
        counters.record_free(ValueType::String);

        assert_eq!(counters.allocated_table()[&ValueType::String], 2);
        assert_eq!(counters.freed_table()[&ValueType::String], 1);
        assert_eq!(counters.freed_table()[&ValueType::Array], 0);
    }
}
