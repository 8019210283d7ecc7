//! JSON trace report writer.
//!
//! A report is a self-describing dump of one trace: header, rows, the drained
//! lifetime histogram and both per-type counters.

use super::{ensure_parent_dir, key_cell_text, ClassNames};
use crate::aggregator::{CountTable, KeyValue, LifetimeSnapshot, StatRow};
use crate::tracer::TraceResult;
use crate::utils::config::REPORT_SCHEMA_VERSION;
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// One key cell: line numbers stay numeric, everything else is text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyCell {
    Number(u64),
    Text(String),
}

/// One row of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub key: Vec<KeyCell>,

    #[serde(flatten)]
    pub stats: StatRow,
}

/// Serialized trace report
///
/// **Public** - written by `write_report`, read back by `read_report`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceReport {
    /// Report schema version
    pub version: String,

    /// ISO 8601 timestamp
    pub generated_at: String,

    pub header: Vec<String>,

    pub rows: Vec<ReportRow>,

    /// Type name -> frees per age; absent when the histogram was off or empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<BTreeMap<String, Vec<u64>>>,

    #[serde(default)]
    pub allocated_counts: BTreeMap<String, u64>,

    #[serde(default)]
    pub freed_counts: BTreeMap<String, u64>,
}

impl TraceReport {
    /// Sum of `count` across rows
    pub fn total_allocations(&self) -> u64 {
        self.rows.iter().map(|row| row.stats.count).sum()
    }

    /// Sum of `total_memsize` across rows
    pub fn total_memsize(&self) -> u64 {
        self.rows.iter().map(|row| row.stats.total_memsize).sum()
    }
}

/// Assemble a report from a trace result and the tracer's side tables
///
/// **Public** - main entry point for report construction
///
/// # Arguments
/// * `result` - Snapshot returned by `stop` or `result`
/// * `lifetime` - Drained lifetime histogram, if any
/// * `allocated` - Per-type allocation counter
/// * `freed` - Per-type free counter
/// * `names` - Class name lookup for `class` key cells
pub fn build_report(
    result: &TraceResult,
    lifetime: Option<&LifetimeSnapshot>,
    allocated: &CountTable,
    freed: &CountTable,
    names: &dyn ClassNames,
) -> TraceReport {
    let rows = result
        .iter()
        .map(|(key, stats)| ReportRow {
            key: key
                .values()
                .iter()
                .map(|value| match value {
                    KeyValue::Line(line) => KeyCell::Number(u64::from(*line)),
                    other => KeyCell::Text(key_cell_text(other, names)),
                })
                .collect(),
            stats: *stats,
        })
        .collect();

    TraceReport {
        version: REPORT_SCHEMA_VERSION.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        header: result.header().iter().map(|s| s.to_string()).collect(),
        rows,
        lifetime: lifetime.map(|table| {
            table
                .iter()
                .map(|(value_type, ages)| (value_type.name().to_string(), ages.clone()))
                .collect()
        }),
        allocated_counts: named_counts(allocated),
        freed_counts: named_counts(freed),
    }
}

/// **Private** - key a count table by type name
fn named_counts(table: &CountTable) -> BTreeMap<String, u64> {
    table
        .iter()
        .map(|(value_type, count)| (value_type.name().to_string(), *count))
        .collect()
}

/// Write a report to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `report` - Report to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
///
/// # Example
/// ```ignore
/// let report = build_report(&result, None, &allocated, &freed, &tracer);
/// write_report(&report, "trace.json")?;
/// ```
pub fn write_report(report: &TraceReport, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing report to: {}", output_path.display());

    super::validate_path(output_path)?;
    ensure_parent_dir(output_path)?;

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, report).map_err(OutputError::SerializationFailed)?;

    info!(
        "Report written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Calculate file size in bytes
///
/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Read a report from a JSON file
///
/// **Public** - useful for validation and testing
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_report(input_path: impl AsRef<Path>) -> Result<TraceReport, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading report from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let report: TraceReport =
        serde_json::from_reader(BufReader::new(file)).map_err(OutputError::SerializationFailed)?;

    debug!(
        "Report loaded: version {}, {} rows",
        report.version,
        report.rows.len()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{AggregationKey, KeyField, TableSnapshot};
    use crate::output::RawClassIds;
    use serde_json::json;

    #[test]
    fn test_row_serialization_shape() {
        let row = ReportRow {
            key: vec![KeyCell::Text("a.rb".to_string()), KeyCell::Number(3)],
            stats: StatRow {
                count: 2,
                ..StatRow::default()
            },
        };

        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({
                "key": ["a.rb", 3],
                "count": 2,
                "old_count": 0,
                "total_age": 0,
                "min_age": 0,
                "max_age": 0,
                "total_memsize": 0
            })
        );
    }

    #[test]
    fn test_build_report() {
        let mut rows = TableSnapshot::new();
        rows.insert(
            AggregationKey::site("a.rb", 3),
            StatRow {
                count: 2,
                ..StatRow::default()
            },
        );
        let result = TraceResult::new(vec![KeyField::Path, KeyField::Line], rows);

        let report = build_report(
            &result,
            None,
            &CountTable::new(),
            &CountTable::new(),
            &RawClassIds,
        );
        assert_eq!(report.version, REPORT_SCHEMA_VERSION);
        assert_eq!(report.header[0], "path");
        assert_eq!(report.total_allocations(), 2);
        assert!(report.lifetime.is_none());
    }
}
