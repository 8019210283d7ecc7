//! Output writers for trace results.
//!
//! This module renders and writes trace data in several formats:
//! - JSON reports (readable back for validation)
//! - Tab separated tables (allocation table and lifetime histogram)
//! - HTML pages with column-sort links

pub mod html;
pub mod json;
pub mod tsv;

// Re-export main functions
pub use html::{render_counts_html, render_lifetime_html, render_table_html};
pub use json::{build_report, read_report, write_report, KeyCell, ReportRow, TraceReport};
pub use tsv::{render_lifetime_table, render_table, sort_rows, write_text};

use crate::aggregator::KeyValue;
use crate::event::{ClassId, ClassRegistry};
use crate::tracer::AllocationTracer;
use crate::utils::error::OutputError;
use std::path::Path;
use std::sync::Arc;

/// Placeholder for a missing path or class
pub const INTERNAL_LABEL: &str = "<internal>";

/// Resolves interned class ids back to names when rendering
pub trait ClassNames {
    fn class_name(&self, id: ClassId) -> Option<Arc<str>>;
}

impl ClassNames for AllocationTracer {
    fn class_name(&self, id: ClassId) -> Option<Arc<str>> {
        AllocationTracer::class_name(self, id)
    }
}

impl ClassNames for ClassRegistry {
    fn class_name(&self, id: ClassId) -> Option<Arc<str>> {
        self.name(id).cloned()
    }
}

/// Renders class ids as their raw `#<class:N>` form
#[derive(Debug, Clone, Copy, Default)]
pub struct RawClassIds;

impl ClassNames for RawClassIds {
    fn class_name(&self, _id: ClassId) -> Option<Arc<str>> {
        None
    }
}

/// Text of one key cell
pub fn key_cell_text(value: &KeyValue, names: &dyn ClassNames) -> String {
    match value {
        KeyValue::Path(None) | KeyValue::Class(None) => INTERNAL_LABEL.to_string(),
        KeyValue::Class(Some(id)) => names
            .class_name(*id)
            .map(|name| name.to_string())
            .unwrap_or_else(|| id.to_string()),
        other => other.to_string(),
    }
}

/// Common path validation for output files
pub fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Create parent directories of an output file
///
/// **Private** - shared by the writers
fn ensure_parent_dir(path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            log::debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}
