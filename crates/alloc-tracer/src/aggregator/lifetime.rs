//! Lifetime histogram: how many objects of each type died at each age.
//!
//! Reading the histogram drains it. A second read with no new frees in between
//! returns `None`, so a report never shows the same frees twice.

use crate::event::ValueType;
use log::debug;
use std::collections::BTreeMap;

/// Type -> free counts indexed by age (index 0 = freed at age 0)
pub type LifetimeSnapshot = BTreeMap<ValueType, Vec<u64>>;

/// Per-type age histogram with an enable switch
#[derive(Debug, Default)]
pub struct LifetimeTable {
    enabled: bool,
    counts: LifetimeSnapshot,
}

impl LifetimeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn collection on or off; turning it off drops collected data
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled && !self.counts.is_empty() {
            debug!("Discarding lifetime histogram for {} types", self.counts.len());
            self.counts.clear();
        }
        self.enabled = enabled;
    }

    /// Count one freed object; ignored while disabled
    pub fn record_free(&mut self, value_type: ValueType, age: u64) {
        if !self.enabled {
            return;
        }

        let Ok(index) = usize::try_from(age) else {
            return;
        };
        let ages = self.counts.entry(value_type).or_default();
        if ages.len() <= index {
            ages.resize(index + 1, 0);
        }
        if let Some(slot) = ages.get_mut(index) {
            *slot += 1;
        }
    }

    /// Take everything collected since the last drain
    ///
    /// # Returns
    /// `None` when disabled or when nothing was freed since the last drain
    pub fn drain(&mut self) -> Option<LifetimeSnapshot> {
        if !self.enabled || self.counts.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.counts))
    }

    /// Drop collected data, keeping the enable switch as is
    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_by_default() {
        let mut table = LifetimeTable::new();
        table.record_free(ValueType::String, 0);
        assert!(table.drain().is_none());
    }

    #[test]
    fn test_extends_with_zeros() {
        let mut table = LifetimeTable::new();
        table.set_enabled(true);
        table.record_free(ValueType::String, 3);
        table.record_free(ValueType::String, 3);
        table.record_free(ValueType::String, 0);

        let drained = table.drain().unwrap();
        assert_eq!(drained[&ValueType::String], vec![1, 0, 0, 2]);
    }

    #[test]
    fn test_drain_is_one_shot() {
        let mut table = LifetimeTable::new();
        table.set_enabled(true);
        table.record_free(ValueType::Object, 1);

        assert!(table.drain().is_some());
        assert!(table.drain().is_none());

        table.record_free(ValueType::Object, 0);
        assert_eq!(table.drain().unwrap()[&ValueType::Object], vec![1]);
    }

    #[test]
    fn test_disable_discards_data() {
        let mut table = LifetimeTable::new();
        table.set_enabled(true);
        table.record_free(ValueType::Hash, 2);
        table.set_enabled(false);
        table.set_enabled(true);

        assert!(table.drain().is_none());
    }

    #[test]
    fn test_clear_keeps_enabled() {
        let mut table = LifetimeTable::new();
        table.set_enabled(true);
        table.record_free(ValueType::Hash, 2);
        table.clear();

        assert!(table.is_enabled());
        assert!(table.drain().is_none());

        table.record_free(ValueType::Hash, 0);
        assert_eq!(table.drain().unwrap()[&ValueType::Hash], vec![1]);
    }
}
