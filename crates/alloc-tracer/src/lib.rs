//! Allocation tracer library
//!
//! Attributes every object allocation to a configurable key (source path,
//! line, value type, class) and aggregates per-key counts, promotion counts,
//! ages at free and freed bytes. A host runtime feeds it through the
//! [`event::AllocationObserver`] trait; recorded event logs can be replayed
//! through the same path.

pub mod aggregator;
pub mod commands;
pub mod event;
pub mod output;
pub mod tracer;
pub mod utils;

pub use event::{AllocationEvent, AllocationObserver, ClassId, FreeEvent, ObjectId, ValueType};
pub use tracer::{AllocationTracer, TraceGuard, TraceResult, TracerState};
pub use utils::error::TracerError;
