//! alloc-trace CLI
//!
//! Replays recorded allocation event logs through the allocation tracer and
//! writes the per-site tables as JSON, TSV or HTML.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::debug;
use std::path::PathBuf;

use alloc_tracer::commands::{
    display_schema, display_version, execute_replay, print_header, validate_args,
    validate_report_file, ReplayArgs,
};

/// alloc-trace - Allocation site and object lifetime tracing
#[derive(Parser, Debug)]
#[command(name = "alloc-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a JSON-lines event log through the tracer
    Replay {
        /// Event log to replay
        #[arg(short, long)]
        input: PathBuf,

        /// Tracer configuration file (TOML)
        #[arg(short, long, env = "ALLOC_TRACE_CONFIG")]
        config: Option<PathBuf>,

        /// Aggregation key fields, e.g. path,line,class
        #[arg(short, long, value_delimiter = ',')]
        keys: Vec<String>,

        /// Collect the per-type lifetime histogram
        #[arg(long)]
        lifetime: bool,

        /// Output path for the JSON report (placed in artifacts/ by default)
        #[arg(short, long, default_value = "artifacts/trace.json")]
        output: PathBuf,

        /// Output path for the TSV allocation table
        #[arg(long)]
        tsv: Option<PathBuf>,

        /// Output path for the HTML allocation table
        #[arg(long)]
        html: Option<PathBuf>,

        /// Output path for the lifetime histogram TSV
        #[arg(long)]
        lifetime_output: Option<PathBuf>,

        /// Header column to sort tables by (e.g. count, total_memsize)
        #[arg(short, long)]
        sort: Option<String>,

        /// Number of top sites to include in the summary
        #[arg(long, default_value = "20")]
        top_sites: usize,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Print the table header for a key list
    Header {
        /// Aggregation key fields, e.g. path,line,type
        #[arg(short, long, value_delimiter = ',')]
        keys: Vec<String>,
    },

    /// Validate a JSON trace report
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Replay {
            input,
            config,
            keys,
            lifetime,
            mut output,
            tsv,
            html,
            lifetime_output,
            sort,
            top_sites,
            summary,
        } => {
            // Ensure the report goes to artifacts/ if no directory is specified
            if output.parent().map(|p| p.as_os_str().is_empty()).unwrap_or(true) {
                output = PathBuf::from("artifacts").join(output);
            }

            let args = ReplayArgs {
                input,
                config,
                keys,
                lifetime: lifetime || lifetime_output.is_some(),
                output_json: Some(output),
                output_tsv: tsv,
                output_html: html,
                output_lifetime: lifetime_output,
                sort_by: sort,
                top_sites,
                print_summary: summary,
            };
            debug!("Replay arguments: {:?}", args);

            // Validate args first
            validate_args(&args)?;

            // Execute replay
            execute_replay(args)?;
        }

        Commands::Header { keys } => {
            print_header(&keys)?;
        }

        Commands::Validate { file } => {
            validate_report_file(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
