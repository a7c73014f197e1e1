//! Data types produced by the aggregation pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::analyzers::frequency::FrequencyTable;
use crate::analyzers::histogram::Histogram;
use crate::analyzers::utility::{fraction, mean, median, quantile, stddev};

/// Numeric metrics summarized per repository, in research-question order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    AgeYears,
    MergedPullRequests,
    Releases,
    DaysSinceUpdate,
    ClosedIssuesRatio,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::AgeYears,
        Metric::MergedPullRequests,
        Metric::Releases,
        Metric::DaysSinceUpdate,
        Metric::ClosedIssuesRatio,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::AgeYears => "age_years",
            Metric::MergedPullRequests => "merged_pull_requests",
            Metric::Releases => "releases",
            Metric::DaysSinceUpdate => "days_since_update",
            Metric::ClosedIssuesRatio => "closed_issues_ratio",
        }
    }

    /// Human-readable label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Metric::AgeYears => "Age (years)",
            Metric::MergedPullRequests => "Merged pull requests",
            Metric::Releases => "Releases",
            Metric::DaysSinceUpdate => "Days since last update",
            Metric::ClosedIssuesRatio => "Closed issues ratio",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive statistics for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub sample_size: usize,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub stddev: f64,
    pub lower_quartile: f64,
    pub upper_quartile: f64,
    pub histogram: Histogram,
}

impl MetricSummary {
    /// Summarizes an ascending slice. Returns `None` when it is empty.
    pub fn from_sorted(sorted: &[f64], bins: usize) -> Option<Self> {
        let median = median(sorted)?;
        let avg = mean(sorted);

        Some(Self {
            sample_size: sorted.len(),
            median,
            min: *sorted.first()?,
            max: *sorted.last()?,
            mean: avg,
            stddev: stddev(sorted, avg),
            lower_quartile: quantile(sorted, 0.25)?,
            upper_quartile: quantile(sorted, 0.75)?,
            histogram: Histogram::from_sorted(sorted, bins),
        })
    }
}

/// A count of records together with its fraction of the total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Share {
    pub count: usize,
    pub share: f64,
}

impl Share {
    /// Builds a share; an empty total yields a share of 0.
    pub fn of(count: usize, total: usize) -> Self {
        Self {
            count,
            share: fraction(count, total),
        }
    }
}

/// Repositories with nothing recorded for a countable activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZeroCounts {
    pub no_issues: Share,
    pub no_releases: Share,
    pub no_merged_pull_requests: Share,
}

/// Threshold counts highlighted in the final report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlights {
    pub many_merged_pull_requests_threshold: u64,
    pub many_merged_pull_requests: Share,
    pub recent_update_days: i64,
    pub recently_updated: Share,
    pub high_closed_ratio_threshold: f64,
    pub high_closed_ratio: Share,
    pub leading_languages: usize,
    pub leading_languages_share: f64,
}

/// Complete aggregation result for a repository collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSummary {
    pub schema_version: u8,
    pub as_of: DateTime<Utc>,
    pub total_records: usize,
    pub metrics: BTreeMap<Metric, MetricSummary>,
    pub languages: FrequencyTable,
    pub zero_counts: ZeroCounts,
    pub highlights: Highlights,
}

impl StatisticsSummary {
    pub fn metric(&self, metric: Metric) -> Option<&MetricSummary> {
        self.metrics.get(&metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_order_follows_research_questions() {
        let mut shuffled = vec![
            Metric::ClosedIssuesRatio,
            Metric::Releases,
            Metric::AgeYears,
            Metric::DaysSinceUpdate,
            Metric::MergedPullRequests,
        ];
        shuffled.sort();
        assert_eq!(shuffled, Metric::ALL.to_vec());
    }

    #[test]
    fn test_metric_serializes_as_snake_case() {
        for metric in Metric::ALL {
            assert_eq!(
                serde_json::to_string(&metric).unwrap(),
                format!("\"{}\"", metric.as_str())
            );
        }
    }

    #[test]
    fn test_metric_summary_single_value() {
        let summary = MetricSummary::from_sorted(&[4.0], 10).unwrap();
        assert_eq!(summary.median, 4.0);
        assert_eq!(summary.min, 4.0);
        assert_eq!(summary.max, 4.0);
        assert_eq!(summary.stddev, 0.0);
        assert_eq!(summary.sample_size, 1);
    }

    #[test]
    fn test_metric_summary_empty() {
        assert!(MetricSummary::from_sorted(&[], 10).is_none());
    }

    #[test]
    fn test_share_with_zero_total() {
        assert_eq!(Share::of(0, 0).share, 0.0);
        assert_eq!(Share::of(1, 4).share, 0.25);
    }
}
