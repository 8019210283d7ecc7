//! Event shapes delivered by the host instrumentation layer.
//!
//! The host calls into an [`AllocationObserver`] synchronously, on the thread
//! that allocated or reclaimed the object. Recorded event logs use the
//! serializable [`EventRecord`] form instead.

use super::class::ClassId;
use super::value_type::ValueType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a live object (address or handle)
///
/// Only valid while the object is alive; the host may reuse it after the free event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// An object was created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationEvent<'a> {
    pub object: ObjectId,

    /// Source file of the allocating call site (None for native frames)
    pub path: Option<&'a str>,

    /// Source line of the allocating call site
    pub line: u32,

    pub value_type: ValueType,

    /// Class of the allocated value (None for internal/primitive values)
    pub class: Option<ClassId>,
}

/// An object is about to be reclaimed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeEvent {
    pub object: ObjectId,

    pub value_type: ValueType,

    /// Measured size of the object, in bytes
    pub size_bytes: u64,

    /// The runtime had promoted the object to the old generation
    pub is_old: bool,
}

/// Receiver for allocation events
///
/// **Public** - the seam between a host runtime's hooks and the tracer
///
/// Implementations must tolerate every call in every state: events for objects
/// they never saw, and events that arrive while no trace is active.
pub trait AllocationObserver: Send + Sync {
    /// Called once per object creation
    fn notify_allocate(&self, event: &AllocationEvent<'_>);

    /// Called once per object reclamation
    fn notify_free(&self, event: &FreeEvent);

    /// Called when the runtime promotes a live object to the old generation
    fn notify_promote(&self, _object: ObjectId) {}

    /// Called once per completed collection cycle
    fn generation_tick(&self);
}

/// One line of a recorded event log
///
/// Serialized as JSON with an `event` tag, e.g.
/// `{"event":"allocate","object":1,"path":"app.rb","line":3,"type":"string"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventRecord {
    Allocate {
        object: u64,
        #[serde(default)]
        path: Option<String>,
        #[serde(default)]
        line: u32,
        #[serde(rename = "type")]
        value_type: ValueType,
        #[serde(default)]
        class: Option<String>,
    },
    Free {
        object: u64,
        #[serde(rename = "type", default)]
        value_type: Option<ValueType>,
        #[serde(default)]
        size: u64,
        #[serde(default)]
        old: bool,
    },
    Promote {
        object: u64,
    },
    Gc,
    Pause,
    Resume,
}

impl EventRecord {
    /// Short label used in log messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Allocate { .. } => "allocate",
            Self::Free { .. } => "free",
            Self::Promote { .. } => "promote",
            Self::Gc => "gc",
            Self::Pause => "pause",
            Self::Resume => "resume",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_allocate_record_defaults() {
        let record: EventRecord =
            serde_json::from_value(json!({"event": "allocate", "object": 7, "type": "array"}))
                .unwrap();

        assert_eq!(
            record,
            EventRecord::Allocate {
                object: 7,
                path: None,
                line: 0,
                value_type: ValueType::Array,
                class: None,
            }
        );
    }

    #[test]
    fn test_free_record_without_type() {
        let record: EventRecord =
            serde_json::from_value(json!({"event": "free", "object": 7, "size": 40})).unwrap();

        assert_eq!(
            record,
            EventRecord::Free {
                object: 7,
                value_type: None,
                size: 40,
                old: false,
            }
        );
        assert_eq!(record.kind(), "free");
    }

    #[test]
    fn test_unit_records() {
        let record: EventRecord = serde_json::from_value(json!({"event": "gc"})).unwrap();
        assert_eq!(record, EventRecord::Gc);
    }
}
