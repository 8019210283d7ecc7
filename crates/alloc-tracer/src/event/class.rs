//! Interned class identities.
//!
//! The host hands the tracer a [`ClassId`] instead of a live class reference, so
//! recording an allocation never keeps a class alive.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Opaque, comparable handle for a user-visible class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(u32);

impl ClassId {
    /// Shared by every class interned after the registry ran out of ids
    pub const OVERFLOW: ClassId = ClassId(u32::MAX);

    /// Wrap a raw handle supplied by the host runtime
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw handle value
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<class:{}>", self.0)
    }
}

/// Name <-> id table for classes seen by the tracer
///
/// Ids are dense and handed out in first-seen order. The registry only grows.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    ids: HashMap<Arc<str>, ClassId>,
    names: Vec<Arc<str>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `name`, allocating one on first sight
    pub fn intern(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }

        let Some(id) = next_id(self.names.len()) else {
            warn!("Class registry is full; {} is recorded as {}", name, ClassId::OVERFLOW);
            return ClassId::OVERFLOW;
        };

        let name: Arc<str> = Arc::from(name);
        self.names.push(Arc::clone(&name));
        self.ids.insert(name, id);
        id
    }

    /// Look up the name behind an id
    pub fn name(&self, id: ClassId) -> Option<&Arc<str>> {
        self.names.get(usize::try_from(id.0).ok()?)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Id for the next registry slot; `None` once the id space is used up
fn next_id(len: usize) -> Option<ClassId> {
    u32::try_from(len)
        .ok()
        .filter(|raw| *raw != ClassId::OVERFLOW.0)
        .map(ClassId)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_idempotent() {
        let mut registry = ClassRegistry::new();
        let a = registry.intern("Array");
        let b = registry.intern("Hash");
        assert_ne!(a, b);
        assert_eq!(registry.intern("Array"), a);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_name_lookup() {
        let mut registry = ClassRegistry::new();
        let id = registry.intern("Widget");
        assert_eq!(registry.name(id).map(|n| n.as_ref()), Some("Widget"));
        assert!(registry.name(ClassId::from_raw(99)).is_none());
    }

    #[test]
    fn test_next_id_stops_at_overflow() {
        assert_eq!(next_id(0), Some(ClassId::from_raw(0)));
        assert_eq!(next_id(7), Some(ClassId::from_raw(7)));
        assert_eq!(next_id(u32::MAX as usize), None);
        assert_eq!(next_id(usize::MAX), None);
        assert_eq!(ClassId::OVERFLOW.to_string(), "#<class:4294967295>");
    }
}
