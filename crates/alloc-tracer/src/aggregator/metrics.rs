//! Calculate summary metrics and hot allocation sites from a snapshot.
//!
//! Hot sites are the keys that allocate the most (or retain the most bytes).
//! These are the primary targets for optimization.

use super::key::AggregationKey;
use super::table::{StatRow, TableSnapshot};
use log::debug;
use std::fmt;
use std::str::FromStr;

/// One of the fixed statistic columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatColumn {
    Count,
    OldCount,
    TotalAge,
    MinAge,
    MaxAge,
    TotalMemsize,
}

impl StatColumn {
    pub const ALL: [StatColumn; 6] = [
        Self::Count,
        Self::OldCount,
        Self::TotalAge,
        Self::MinAge,
        Self::MaxAge,
        Self::TotalMemsize,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::OldCount => "old_count",
            Self::TotalAge => "total_age",
            Self::MinAge => "min_age",
            Self::MaxAge => "max_age",
            Self::TotalMemsize => "total_memsize",
        }
    }

    /// Read this column from a row
    pub fn value(self, row: &StatRow) -> u64 {
        match self {
            Self::Count => row.count,
            Self::OldCount => row.old_count,
            Self::TotalAge => row.total_age,
            Self::MinAge => row.min_age,
            Self::MaxAge => row.max_age,
            Self::TotalMemsize => row.total_memsize,
        }
    }
}

impl fmt::Display for StatColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StatColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|column| column.name() == wanted)
            .ok_or_else(|| format!("unknown statistic column: {}", s))
    }
}

/// A site ranked by one statistic
#[derive(Debug, Clone, PartialEq)]
pub struct HotSite {
    pub key: AggregationKey,
    pub stats: StatRow,

    /// Share of the column total across all sites
    pub percentage: f64,
}

/// Rank sites by a statistic column
///
/// **Public** - main entry point for hot site calculation
///
/// # Arguments
/// * `rows` - Snapshot to rank
/// * `column` - Statistic to rank by
/// * `top_n` - Number of sites to return
///
/// # Returns
/// Up to `top_n` sites, highest value first; ties keep key order
pub fn calculate_hot_sites(rows: &TableSnapshot, column: StatColumn, top_n: usize) -> Vec<HotSite> {
    debug!(
        "Calculating top {} sites by {} from {} rows",
        top_n,
        column,
        rows.len()
    );

    let column_total: u64 = rows.values().map(|row| column.value(row)).sum();

    let mut ranked: Vec<(&AggregationKey, &StatRow)> = rows.iter().collect();
    ranked.sort_by(|a, b| column.value(b.1).cmp(&column.value(a.1)));

    ranked
        .into_iter()
        .take(top_n)
        .map(|(key, stats)| create_hot_site(key, stats, column, column_total))
        .collect()
}

/// Create a HotSite from a row
pub fn create_hot_site(
    key: &AggregationKey,
    stats: &StatRow,
    column: StatColumn,
    denominator: u64,
) -> HotSite {
    let percentage = if denominator > 0 {
        (column.value(stats) as f64 / denominator as f64) * 100.0
    } else {
        0.0
    };

    HotSite {
        key: key.clone(),
        stats: *stats,
        percentage,
    }
}

/// Calculate whole-trace statistics
///
/// **Public** - provides summary statistics
///
/// # Arguments
/// * `rows` - Snapshot to summarize
///
/// # Returns
/// Totals across all rows
pub fn calculate_trace_summary(rows: &TableSnapshot) -> TraceSummary {
    if rows.is_empty() {
        return TraceSummary::default();
    }

    let total_allocations: u64 = rows.values().map(|row| row.count).sum();
    let total_old: u64 = rows.values().map(|row| row.old_count).sum();
    let total_age: u64 = rows.values().map(|row| row.total_age).sum();
    let total_memsize: u64 = rows.values().map(|row| row.total_memsize).sum();

    // Share of allocations made by the busiest 10% of sites
    let site_count = rows.len();
    let top_count = (site_count as f64 * 0.1).ceil() as usize;
    let mut counts: Vec<u64> = rows.values().map(|row| row.count).collect();
    counts.sort_unstable_by(|a, b| b.cmp(a));
    let top_allocations: u64 = counts.iter().take(top_count).sum();

    TraceSummary {
        site_count,
        total_allocations,
        total_old,
        total_memsize,
        age_per_allocation: if total_allocations > 0 {
            total_age as f64 / total_allocations as f64
        } else {
            0.0
        },
        top_10_percent_percentage: if total_allocations > 0 {
            (top_allocations as f64 / total_allocations as f64) * 100.0
        } else {
            0.0
        },
    }
}

/// Whole-trace statistics
///
/// **Public** - returned from calculate_trace_summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceSummary {
    /// Number of distinct keys
    pub site_count: usize,

    /// Allocations across all keys
    pub total_allocations: u64,

    /// Old objects across all keys
    pub total_old: u64,

    /// Bytes of freed objects across all keys
    pub total_memsize: u64,

    /// Total age divided by allocations
    ///
    /// Live objects count as allocations with no age, so this is not the mean
    /// age at free unless every object was freed.
    pub age_per_allocation: f64,

    /// Percentage of allocations made by the top 10% of sites
    pub top_10_percent_percentage: f64,
}

impl TraceSummary {
    /// Get human-readable summary
    ///
    /// **Public** - for logging and debugging
    pub fn summary(&self) -> String {
        format!(
            "Sites: {} | Allocations: {} | Old: {} | Freed bytes: {} | Age/alloc: {:.2} | Top 10%: {:.1}%",
            self.site_count,
            self.total_allocations,
            self.total_old,
            self.total_memsize,
            self.age_per_allocation,
            self.top_10_percent_percentage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(count: u64, memsize: u64) -> StatRow {
        StatRow {
            count,
            total_memsize: memsize,
            ..StatRow::default()
        }
    }

    fn rows() -> TableSnapshot {
        let mut rows = TableSnapshot::new();
        rows.insert(AggregationKey::site("a.rb", 1), row(50, 100));
        rows.insert(AggregationKey::site("a.rb", 2), row(30, 900));
        rows.insert(AggregationKey::site("b.rb", 1), row(20, 0));
        rows
    }

    #[test]
    fn test_calculate_hot_sites_by_count() {
        let hot = calculate_hot_sites(&rows(), StatColumn::Count, 2);

        assert_eq!(hot.len(), 2);
        assert_eq!(hot[0].key, AggregationKey::site("a.rb", 1));
        assert_eq!(hot[0].percentage, 50.0);
        assert_eq!(hot[1].stats.count, 30);
    }

    #[test]
    fn test_calculate_hot_sites_by_memsize() {
        let hot = calculate_hot_sites(&rows(), StatColumn::TotalMemsize, 1);
        assert_eq!(hot[0].key, AggregationKey::site("a.rb", 2));
        assert_eq!(hot[0].percentage, 90.0);
    }

    #[test]
    fn test_trace_summary() {
        let summary = calculate_trace_summary(&rows());
        assert_eq!(summary.site_count, 3);
        assert_eq!(summary.total_allocations, 100);
        assert_eq!(summary.total_memsize, 1000);
        assert_eq!(summary.top_10_percent_percentage, 50.0);
    }

    #[test]
    fn test_age_per_allocation_counts_live_objects() {
        let mut rows = TableSnapshot::new();
        // Two allocations, one freed at age 4, one still alive
        rows.insert(
            AggregationKey::site("a.rb", 1),
            StatRow {
                count: 2,
                total_age: 4,
                min_age: 4,
                max_age: 4,
                ..StatRow::default()
            },
        );

        let summary = calculate_trace_summary(&rows);
        assert_eq!(summary.age_per_allocation, 2.0);
        assert!(summary.summary().contains("Age/alloc: 2.00"));
    }

    #[test]
    fn test_trace_summary_empty() {
        let summary = calculate_trace_summary(&TableSnapshot::new());
        assert_eq!(summary.site_count, 0);
        assert_eq!(summary.age_per_allocation, 0.0);
    }

    #[test]
    fn test_stat_column_parse() {
        assert_eq!("old_count".parse::<StatColumn>(), Ok(StatColumn::OldCount));
        assert!("average".parse::<StatColumn>().is_err());
    }
}
