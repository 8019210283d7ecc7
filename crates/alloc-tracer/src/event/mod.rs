//! Allocation events: what the host runtime tells the tracer.
//!
//! This module defines:
//! - Built-in value type tags and interned class handles
//! - The live event shapes and the observer trait hosts call into
//! - Recorded event logs (JSON lines) used for replays

pub mod class;
pub mod log_reader;
pub mod schema;
pub mod value_type;

// Re-export main types
pub use class::{ClassId, ClassRegistry};
pub use log_reader::{parse_event_line, read_event_log, EventLogReader};
pub use schema::{AllocationEvent, AllocationObserver, EventRecord, FreeEvent, ObjectId};
pub use value_type::ValueType;
