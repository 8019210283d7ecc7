//! Replay command implementation.
//!
//! The replay command:
//! 1. Builds a tracer from configuration and CLI overrides
//! 2. Streams a recorded event log through it
//! 3. Stops the trace and drains the lifetime histogram
//! 4. Writes the requested output files
//! 5. Optionally prints a summary

use crate::aggregator::{calculate_hot_sites, calculate_trace_summary, StatColumn};
use crate::commands::models::ReplayArgs;
use crate::event::{
    AllocationEvent, AllocationObserver, EventLogReader, EventRecord, FreeEvent, ObjectId,
    ValueType,
};
use crate::output::{
    build_report, render_lifetime_table, render_table, render_table_html, write_report,
    write_text, TraceReport,
};
use crate::tracer::{AllocationTracer, TraceResult};
use crate::utils::config::{load_config, TracerConfig};
use crate::utils::error::TracerError;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::time::Instant;

/// Feeds recorded events into a tracer
///
/// **Public** - also used to drive a tracer from tests
///
/// Remembers the type of every allocation it replays so free records that
/// omit `type` are still counted under the right type.
#[derive(Debug, Default)]
pub struct EventReplayer {
    types: HashMap<u64, ValueType>,
    applied: usize,
}

impl EventReplayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records applied so far
    pub fn applied(&self) -> usize {
        self.applied
    }

    /// Apply one record to the tracer
    ///
    /// # Errors
    /// * `TracerError::NotRunning` - a `pause` or `resume` record arrived in the wrong state
    pub fn apply(
        &mut self,
        tracer: &AllocationTracer,
        record: &EventRecord,
    ) -> Result<(), TracerError> {
        match record {
            EventRecord::Allocate {
                object,
                path,
                line,
                value_type,
                class,
            } => {
                let class = class.as_deref().map(|name| tracer.intern_class(name));
                self.types.insert(*object, *value_type);
                tracer.notify_allocate(&AllocationEvent {
                    object: ObjectId(*object),
                    path: path.as_deref(),
                    line: *line,
                    value_type: *value_type,
                    class,
                });
            }
            EventRecord::Free {
                object,
                value_type,
                size,
                old,
            } => {
                let remembered = self.types.remove(object);
                tracer.notify_free(&FreeEvent {
                    object: ObjectId(*object),
                    value_type: value_type.or(remembered).unwrap_or(ValueType::None),
                    size_bytes: *size,
                    is_old: *old,
                });
            }
            EventRecord::Promote { object } => tracer.notify_promote(ObjectId(*object)),
            EventRecord::Gc => tracer.generation_tick(),
            EventRecord::Pause => tracer.pause()?,
            EventRecord::Resume => tracer.resume()?,
        }

        self.applied += 1;
        Ok(())
    }
}

/// Execute the replay command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Replay command arguments
///
/// # Returns
/// The report that was (or would have been) written as JSON
///
/// # Errors
/// * Configuration file or key list errors
/// * Event log read or parse errors
/// * File write errors
///
/// # Example
/// ```ignore
/// let args = ReplayArgs {
///     input: PathBuf::from("events.jsonl"),
///     keys: vec!["path".into(), "line".into(), "class".into()],
///     print_summary: true,
///     ..ReplayArgs::default()
/// };
///
/// execute_replay(args)?;
/// ```
pub fn execute_replay(args: ReplayArgs) -> Result<TraceReport> {
    let start_time = Instant::now();

    info!("Replaying event log: {}", args.input.display());

    let config = resolve_config(&args)?;
    let tracer = AllocationTracer::with_config(&config).context("Invalid tracer configuration")?;
    debug!("Header: {}", tracer.header().join(", "));

    tracer.start().context("Failed to start trace")?;

    let mut reader = EventLogReader::open(&args.input)
        .with_context(|| format!("Failed to open event log {}", args.input.display()))?;
    let mut replayer = EventReplayer::new();

    while let Some(record) = reader.next() {
        let record = record.context("Failed to read event log")?;
        replayer
            .apply(&tracer, &record)
            .with_context(|| format!("Cannot apply {} event on line {}", record.kind(), reader.line_number()))?;
    }
    info!("Replayed {} events", replayer.applied());

    let result = tracer.stop().context("Failed to stop trace")?;
    let lifetime = tracer.lifetime_table();
    if config.lifetime_table && lifetime.is_none() {
        warn!("Lifetime histogram is enabled but no traced object was freed");
    }

    let report = build_report(
        &result,
        lifetime.as_ref(),
        &tracer.allocated_count_table(),
        &tracer.freed_count_table(),
        &tracer,
    );

    let sort_column = match args.sort_by.as_deref() {
        Some(name) => Some(resolve_sort_column(&result, name)?),
        None => None,
    };

    write_outputs(&args, &tracer, &result, &report, sort_column, lifetime.as_ref())?;

    if args.print_summary {
        print_trace_summary(&args, &result, &tracer);
    }

    info!(
        "Replay completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(report)
}

/// Merge the configuration file with CLI overrides.
///
/// **Private** - internal helper for execute_replay
fn resolve_config(args: &ReplayArgs) -> Result<TracerConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => TracerConfig::default(),
    };

    if !args.keys.is_empty() {
        config.keys = args.keys.clone();
    }
    config.lifetime_table |= args.lifetime;

    Ok(config)
}

/// Map a header column name to its index.
///
/// **Private** - internal helper for execute_replay
fn resolve_sort_column(result: &TraceResult, name: &str) -> Result<usize> {
    let header = result.header();
    header
        .iter()
        .position(|column| *column == name)
        .with_context(|| {
            format!(
                "Unknown sort column '{}' (expected one of: {})",
                name,
                header.join(", ")
            )
        })
}

/// Write output files.
///
/// **Private** - internal helper for execute_replay
fn write_outputs(
    args: &ReplayArgs,
    tracer: &AllocationTracer,
    result: &TraceResult,
    report: &TraceReport,
    sort_column: Option<usize>,
    lifetime: Option<&crate::aggregator::LifetimeSnapshot>,
) -> Result<()> {
    info!("Writing output files...");

    if let Some(path) = &args.output_json {
        write_report(report, path).context("Failed to write JSON report")?;
        info!("✓ Report written to: {}", path.display());
    }

    if let Some(path) = &args.output_tsv {
        write_text(&render_table(result, sort_column, tracer), path)
            .context("Failed to write TSV table")?;
        info!("✓ Table written to: {}", path.display());
    }

    if let Some(path) = &args.output_html {
        write_text(&render_table_html(result, sort_column, tracer), path)
            .context("Failed to write HTML table")?;
        info!("✓ HTML table written to: {}", path.display());
    }

    if let Some(path) = &args.output_lifetime {
        match lifetime {
            Some(table) => {
                write_text(&render_lifetime_table(table), path)
                    .context("Failed to write lifetime table")?;
                info!("✓ Lifetime table written to: {}", path.display());
            }
            None => warn!(
                "No lifetime data collected; skipping {} (pass --lifetime to enable)",
                path.display()
            ),
        }
    }

    Ok(())
}

/// Print a human-readable summary to stdout.
///
/// **Private** - internal helper for execute_replay
fn print_trace_summary(args: &ReplayArgs, result: &TraceResult, tracer: &AllocationTracer) {
    let column = args
        .sort_by
        .as_deref()
        .and_then(|name| name.parse::<StatColumn>().ok())
        .unwrap_or(StatColumn::Count);
    let summary = calculate_trace_summary(result.rows());
    let hot_sites = calculate_hot_sites(result.rows(), column, args.top_sites);

    println!("\n{}", "=".repeat(72));
    println!("  ALLOCATION TRACE SUMMARY");
    println!("{}", "=".repeat(72));
    println!("  Event log:   {}", args.input.display());
    println!("  Key:         {}", result.header()[..result.fields().len()].join(", "));
    println!("  {}", summary.summary());
    println!("  Generations: {}", tracer.generation());
    println!();
    println!("  Top {} sites by {}:", hot_sites.len(), column);
    for (rank, site) in hot_sites.iter().enumerate() {
        let key: Vec<String> = site
            .key
            .values()
            .iter()
            .map(|value| crate::output::key_cell_text(value, tracer))
            .collect();
        println!(
            "  {:>3}. {:<48} {:>10} ({:.1}%)",
            rank + 1,
            key.join(":"),
            column.value(&site.stats),
            site.percentage
        );
    }
    println!("{}\n", "=".repeat(72));
}

/// Validate replay arguments
///
/// **Public** - can be called before execute_replay for early validation
///
/// # Arguments
/// * `args` - Arguments to validate
///
/// # Returns
/// Ok if arguments are valid, Err with message if not
pub fn validate_args(args: &ReplayArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Event log path cannot be empty");
    }

    if !args.input.exists() {
        anyhow::bail!("Event log not found: {}", args.input.display());
    }

    if args.top_sites == 0 {
        anyhow::bail!("top_sites must be greater than 0");
    }

    if args.top_sites > 1000 {
        anyhow::bail!("top_sites is too large (max 1000)");
    }

    crate::aggregator::parse_key_fields(&args.keys).context("Invalid --keys")?;

    Ok(())
}
