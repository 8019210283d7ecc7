//! Per-object shadow records.
//!
//! For every live traced object we remember which row it belongs to and the
//! generation it was born in. The record is keyed by object identity only and
//! never holds the object itself.

use super::key::AggregationKey;
use crate::event::{ObjectId, ValueType};
use log::trace;
use std::collections::HashMap;

/// Bookkeeping for one live traced object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowRecord {
    pub key: AggregationKey,

    /// Type at allocation time (feeds the lifetime histogram)
    pub value_type: ValueType,

    /// Generation counter value when the object was allocated
    pub birth_generation: u64,

    /// Set once the runtime promoted the object
    pub became_old: bool,
}

impl ShadowRecord {
    pub fn new(key: AggregationKey, value_type: ValueType, birth_generation: u64) -> Self {
        Self {
            key,
            value_type,
            birth_generation,
            became_old: false,
        }
    }
}

/// Result of retiring a shadow record on free
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreedObject {
    pub key: AggregationKey,
    pub value_type: ValueType,

    /// Generations survived
    pub age: u64,

    pub became_old: bool,
}

/// Identity -> shadow record table
#[derive(Debug, Default)]
pub struct ShadowStore {
    records: HashMap<ObjectId, ShadowRecord>,
}

impl ShadowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking an object
    ///
    /// A record already stored under this identity is replaced: the host only
    /// reuses identities after the previous owner is gone.
    pub fn on_allocate(&mut self, object: ObjectId, record: ShadowRecord) {
        if self.records.insert(object, record).is_some() {
            trace!("Replaced stale shadow record for {}", object);
        }
    }

    /// Flag a live object as promoted; no-op for untracked objects
    pub fn mark_old(&mut self, object: ObjectId) {
        if let Some(record) = self.records.get_mut(&object) {
            record.became_old = true;
        }
    }

    /// Stop tracking an object and compute its age
    ///
    /// # Returns
    /// `None` if the object was never tracked (allocated before the trace
    /// started, during a pause, or already freed)
    pub fn on_free(&mut self, object: ObjectId, current_generation: u64) -> Option<FreedObject> {
        let record = self.records.remove(&object)?;

        Some(FreedObject {
            age: current_generation.saturating_sub(record.birth_generation),
            key: record.key,
            value_type: record.value_type,
            became_old: record.became_old,
        })
    }

    /// Drop a record without reporting it
    pub fn forget(&mut self, object: ObjectId) -> bool {
        self.records.remove(&object).is_some()
    }

    /// Iterate over live records
    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &ShadowRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: u32, birth: u64) -> ShadowRecord {
        ShadowRecord::new(AggregationKey::site("a.rb", line), ValueType::Object, birth)
    }

    #[test]
    fn test_free_computes_age() {
        let mut store = ShadowStore::new();
        store.on_allocate(ObjectId(1), record(1, 3));

        let freed = store.on_free(ObjectId(1), 7).unwrap();
        assert_eq!(freed.age, 4);
        assert_eq!(freed.key, AggregationKey::site("a.rb", 1));
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_and_double_free_are_ignored() {
        let mut store = ShadowStore::new();
        assert!(store.on_free(ObjectId(9), 0).is_none());

        store.on_allocate(ObjectId(1), record(1, 0));
        assert!(store.on_free(ObjectId(1), 0).is_some());
        assert!(store.on_free(ObjectId(1), 0).is_none());
    }

    #[test]
    fn test_reused_identity_replaces_record() {
        let mut store = ShadowStore::new();
        store.on_allocate(ObjectId(1), record(1, 0));
        store.on_allocate(ObjectId(1), record(2, 5));

        assert_eq!(store.len(), 1);
        let freed = store.on_free(ObjectId(1), 5).unwrap();
        assert_eq!(freed.key, AggregationKey::site("a.rb", 2));
        assert_eq!(freed.age, 0);
    }

    #[test]
    fn test_mark_old_sticks_until_free() {
        let mut store = ShadowStore::new();
        store.on_allocate(ObjectId(1), record(1, 0));
        store.mark_old(ObjectId(1));
        store.mark_old(ObjectId(2));

        assert!(store.on_free(ObjectId(1), 1).unwrap().became_old);
    }

    #[test]
    fn test_age_never_underflows() {
        let mut store = ShadowStore::new();
        store.on_allocate(ObjectId(1), record(1, 10));
        assert_eq!(store.on_free(ObjectId(1), 2).unwrap().age, 0);
    }
}
