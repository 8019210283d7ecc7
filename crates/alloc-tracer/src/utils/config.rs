//! Configuration and constants for the tracer and the CLI.

use crate::aggregator::key::{parse_key_fields, KeyField};
use crate::utils::error::{ConfigError, TracerError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current report schema version
pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Key fields used when `setup` is called with no fields
pub const DEFAULT_KEY_FIELDS: &[KeyField] = &[KeyField::Path, KeyField::Line];

/// Statistic columns that always trail the key columns in a header
pub const STAT_COLUMNS: &[&str] = &[
    "count",
    "old_count",
    "total_age",
    "min_age",
    "max_age",
    "total_memsize",
];

/// Number of sites listed in printed summaries
pub const DEFAULT_TOP_SITES: usize = 20;

/// Tracer configuration, usually loaded from a TOML file
///
/// ```toml
/// keys = ["path", "line", "class"]
/// lifetime_table = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TracerConfig {
    /// Aggregation key fields, in header order
    #[serde(default = "default_keys")]
    pub keys: Vec<String>,

    /// Collect the per-type lifetime histogram
    #[serde(default)]
    pub lifetime_table: bool,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            keys: default_keys(),
            lifetime_table: false,
        }
    }
}

impl TracerConfig {
    /// Validate and convert the configured key names
    ///
    /// # Errors
    /// * `TracerError::Configuration` - unknown or repeated key name
    pub fn key_fields(&self) -> Result<Vec<KeyField>, TracerError> {
        parse_key_fields(&self.keys)
    }
}

fn default_keys() -> Vec<String> {
    DEFAULT_KEY_FIELDS
        .iter()
        .map(|field| field.name().to_string())
        .collect()
}

/// Load tracer configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the TOML configuration file
///
/// # Returns
/// Parsed and validated TracerConfig
///
/// # Errors
/// * `ConfigError::IoError` - If file cannot be read
/// * `ConfigError::ParseFailed` - If TOML is invalid
/// * `ConfigError::Tracer` - If the key list names an unknown field
pub fn load_config(path: impl AsRef<Path>) -> Result<TracerConfig, ConfigError> {
    let path = path.as_ref();
    debug!("Loading tracer configuration from: {}", path.display());

    let contents = fs::read_to_string(path)?;
    let config: TracerConfig = toml::from_str(&contents)?;

    // Reject bad keys at load time rather than at first use
    config.key_fields()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = TracerConfig::default();
        assert_eq!(config.keys, vec!["path", "line"]);
        assert!(!config.lifetime_table);
    }

    #[test]
    fn test_load_config_with_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "lifetime_table = true").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.keys, vec!["path", "line"]);
        assert!(config.lifetime_table);
    }

    #[test]
    fn test_load_config_rejects_unknown_key() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "keys = [\"path\", \"method\"]").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Tracer(TracerError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "keys = [").unwrap();

        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ParseFailed(_))
        ));
    }
}
