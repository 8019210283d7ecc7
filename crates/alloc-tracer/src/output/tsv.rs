//! Tab separated renderings of trace results.
//!
//! The allocation table has one header line matching `header()` and one line
//! per key. The lifetime table has a `type` column followed by one column per age.

use super::{ensure_parent_dir, key_cell_text, ClassNames};
use crate::aggregator::{AggregationKey, LifetimeSnapshot, StatRow};
use crate::tracer::TraceResult;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Order rows by one header column
///
/// **Public** - shared by the TSV and HTML renderers
///
/// # Arguments
/// * `result` - Trace result to order
/// * `sort_column` - Header index; key columns sort ascending, statistic
///   columns descending. `None` or an out-of-range index keeps key order.
///
/// # Returns
/// Rows in display order
pub fn sort_rows(
    result: &TraceResult,
    sort_column: Option<usize>,
) -> Vec<(&AggregationKey, &StatRow)> {
    let mut rows: Vec<(&AggregationKey, &StatRow)> = result.iter().collect();
    let key_columns = result.fields().len();

    match sort_column {
        Some(index) if index < key_columns => {
            rows.sort_by(|a, b| a.0.values().get(index).cmp(&b.0.values().get(index)));
        }
        Some(index) if index < key_columns + StatRow::COLUMN_COUNT => {
            let stat = index - key_columns;
            rows.sort_by(|a, b| compare_stat(b.1, a.1, stat).then_with(|| a.0.cmp(b.0)));
        }
        _ => {}
    }

    rows
}

/// **Private** - compare one statistic column of two rows
fn compare_stat(a: &StatRow, b: &StatRow, stat: usize) -> Ordering {
    a.columns()[stat].cmp(&b.columns()[stat])
}

/// Render the allocation table as TSV
///
/// **Public** - main entry point for text output
///
/// # Arguments
/// * `result` - Trace result to render
/// * `sort_column` - Optional header index to sort by
/// * `names` - Class name lookup for `class` key cells
///
/// # Returns
/// Header line plus one line per key, each newline terminated
pub fn render_table(
    result: &TraceResult,
    sort_column: Option<usize>,
    names: &dyn ClassNames,
) -> String {
    let mut out = result.header().join("\t");
    out.push('\n');

    for (key, stats) in sort_rows(result, sort_column) {
        let cells: Vec<String> = key
            .values()
            .iter()
            .map(|value| key_cell_text(value, names))
            .chain(stats.columns().iter().map(|n| n.to_string()))
            .collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }

    out
}

/// Render the lifetime histogram as TSV
///
/// Every row is padded with zeros to the widest age seen.
pub fn render_lifetime_table(lifetime: &LifetimeSnapshot) -> String {
    let width = lifetime.values().map(Vec::len).max().unwrap_or(0);

    let mut out = String::from("type");
    for age in 0..width {
        out.push('\t');
        out.push_str(&age.to_string());
    }
    out.push('\n');

    for (value_type, ages) in lifetime {
        out.push_str(value_type.name());
        for age in 0..width {
            out.push('\t');
            out.push_str(&ages.get(age).copied().unwrap_or(0).to_string());
        }
        out.push('\n');
    }

    out
}

/// Write rendered text to a file
///
/// # Errors
/// * `OutputError::InvalidPath` - Path is empty, a directory, or its parent cannot be created
/// * `OutputError::WriteFailed` - I/O error during write
pub fn write_text(content: &str, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing text output to: {}", output_path.display());

    super::validate_path(output_path)?;
    ensure_parent_dir(output_path)?;

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(content.as_bytes())
        .map_err(OutputError::WriteFailed)?;
    writer.flush().map_err(OutputError::WriteFailed)?;

    debug!("Wrote {} bytes", content.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{KeyField, TableSnapshot};
    use crate::event::ValueType;
    use crate::output::RawClassIds;

    fn result() -> TraceResult {
        let mut rows = TableSnapshot::new();
        rows.insert(
            AggregationKey::site("a.rb", 1),
            StatRow {
                count: 1,
                ..StatRow::default()
            },
        );
        rows.insert(
            AggregationKey::site("b.rb", 2),
            StatRow {
                count: 5,
                total_memsize: 40,
                ..StatRow::default()
            },
        );
        TraceResult::new(vec![KeyField::Path, KeyField::Line], rows)
    }

    #[test]
    fn test_render_table_key_order() {
        let text = render_table(&result(), None, &RawClassIds);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "path\tline\tcount\told_count\ttotal_age\tmin_age\tmax_age\ttotal_memsize"
        );
        assert_eq!(lines[1], "a.rb\t1\t1\t0\t0\t0\t0\t0");
        assert_eq!(lines[2], "b.rb\t2\t5\t0\t0\t0\t0\t40");
    }

    #[test]
    fn test_sort_by_count_descending() {
        let result = result();
        let rows = sort_rows(&result, Some(2));
        assert_eq!(rows[0].1.count, 5);

        let rows = sort_rows(&result, Some(0));
        assert_eq!(rows[0].0, &AggregationKey::site("a.rb", 1));
    }

    #[test]
    fn test_render_lifetime_table_pads() {
        let mut lifetime = LifetimeSnapshot::new();
        lifetime.insert(ValueType::String, vec![3]);
        lifetime.insert(ValueType::Array, vec![0, 0, 2]);

        assert_eq!(
            render_lifetime_table(&lifetime),
            "type\t0\t1\t2\nstring\t3\t0\t0\narray\t0\t0\t2\n"
        );
    }
}
