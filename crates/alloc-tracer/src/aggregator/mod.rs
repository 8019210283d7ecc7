//! Aggregation of allocation events into tables.
//!
//! This module turns the raw event stream into:
//! - Aggregation keys (configurable subset of path, line, type, class)
//! - Per-object shadow records for objects still alive
//! - The per-key statistics table
//! - The per-type lifetime histogram and always-on type counters
//! - Summary metrics over a snapshot

pub mod counts;
pub mod key;
pub mod lifetime;
pub mod metrics;
pub mod shadow;
pub mod table;

// Re-export main types and functions
pub use counts::{CountTable, TypeCounters};
pub use key::{build_key, parse_key_fields, AggregationKey, KeyField, KeyValue, PathInterner};
pub use lifetime::{LifetimeSnapshot, LifetimeTable};
pub use metrics::{calculate_hot_sites, calculate_trace_summary, HotSite, StatColumn, TraceSummary};
pub use shadow::{FreedObject, ShadowRecord, ShadowStore};
pub use table::{AggregationTable, StatRow, TableSnapshot};
