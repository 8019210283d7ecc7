use crate::aggregator::{parse_key_fields, StatRow};
use crate::output::read_report;
use crate::tracer::header_for;
use crate::utils::config::REPORT_SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Validate a JSON trace report
pub fn validate_report_file(file_path: PathBuf) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let report = read_report(&file_path)
        .with_context(|| format!("Failed to read report {}", file_path.display()))?;

    if let Some(bad) = report
        .rows
        .iter()
        .position(|row| row.key.len() + StatRow::COLUMN_COUNT != report.header.len())
    {
        anyhow::bail!("Row {} does not match the report header", bad);
    }

    println!("✓ Valid trace report");
    println!("  Version: {}", report.version);
    println!("  Generated: {}", report.generated_at);
    println!("  Header: {}", report.header.join(", "));
    println!("  Rows: {}", report.rows.len());
    println!("  Allocations: {}", report.total_allocations());
    println!("  Freed bytes: {}", report.total_memsize());
    println!(
        "  Lifetime table: {}",
        if report.lifetime.is_some() { "present" } else { "absent" }
    );

    Ok(())
}

/// Print the header produced by a key list
pub fn print_header(keys: &[String]) -> Result<()> {
    let fields = parse_key_fields(keys).context("Invalid key list")?;
    println!("{}", header_for(&fields).join("\t"));
    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Allocation Trace Report Schema");
    println!("Current Version: {}", REPORT_SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string           - Schema version (e.g., '1.0.0')");
        println!("  generated_at: string      - ISO 8601 timestamp");
        println!("  header: array             - Key columns then statistic columns");
        println!("  rows: array               - One entry per aggregation key");
        println!("    key: array              - Key values (line numbers are numbers)");
        println!("    count: number           - Allocations");
        println!("    old_count: number       - Objects promoted to the old generation");
        println!("    total_age: number       - Sum of ages at free");
        println!("    min_age: number         - Smallest age at free");
        println!("    max_age: number         - Largest age at free");
        println!("    total_memsize: number   - Bytes of freed objects");
        println!("  lifetime: object?         - Type -> frees per age");
        println!("  allocated_counts: object  - Type -> allocations since start");
        println!("  freed_counts: object      - Type -> frees since start");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("alloc-trace v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", REPORT_SCHEMA_VERSION);
    println!();
    println!("Allocation site and object lifetime tracer.");
}
