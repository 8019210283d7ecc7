use crate::utils::config::DEFAULT_TOP_SITES;
use std::path::PathBuf;

/// Arguments for the replay command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ReplayArgs {
    /// JSON-lines event log to replay
    pub input: PathBuf,

    /// Optional tracer configuration file (TOML)
    pub config: Option<PathBuf>,

    /// Key fields overriding the configuration file
    pub keys: Vec<String>,

    /// Collect the lifetime histogram even if the configuration does not
    pub lifetime: bool,

    /// Output path for the JSON report
    pub output_json: Option<PathBuf>,

    /// Output path for the TSV allocation table
    pub output_tsv: Option<PathBuf>,

    /// Output path for the HTML allocation table
    pub output_html: Option<PathBuf>,

    /// Output path for the lifetime histogram TSV
    pub output_lifetime: Option<PathBuf>,

    /// Header column to sort the table outputs by
    pub sort_by: Option<String>,

    /// Number of top sites to include in the summary
    pub top_sites: usize,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for ReplayArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            config: None,
            keys: Vec::new(),
            lifetime: false,
            output_json: Some(PathBuf::from("trace.json")),
            output_tsv: None,
            output_html: None,
            output_lifetime: None,
            sort_by: None,
            top_sites: DEFAULT_TOP_SITES,
            print_summary: false,
        }
    }
}
