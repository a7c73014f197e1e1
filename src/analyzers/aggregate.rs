use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::debug;

use crate::analyzers::frequency::FrequencyTable;
use crate::analyzers::types::{
    Highlights, Metric, MetricSummary, Share, StatisticsSummary, ZeroCounts,
};
use crate::analyzers::utility::sorted;
use crate::config::AnalysisConfig;
use crate::error::AggregateError;
use crate::record::RepositoryRecord;

pub const SCHEMA_VERSION: u8 = 1;

/// Aggregates a repository collection into a [`StatisticsSummary`].
///
/// Derived metrics are evaluated at `as_of`. The closed-issues ratio is
/// summarized only over repositories that have at least one issue; the
/// others are counted in [`ZeroCounts::no_issues`] instead. When no
/// repository has issues the ratio is left out of
/// [`StatisticsSummary::metrics`].
///
/// # Errors
///
/// [`AggregateError::EmptyInput`] for an empty collection.
pub fn aggregate(
    records: &[RepositoryRecord],
    as_of: DateTime<Utc>,
    config: &AnalysisConfig,
) -> Result<StatisticsSummary, AggregateError> {
    if records.is_empty() {
        return Err(AggregateError::EmptyInput);
    }
    debug!(records = records.len(), as_of = %as_of, "Aggregating repository statistics");

    let mut metrics = BTreeMap::new();
    for metric in Metric::ALL {
        let values = sorted(&metric_values(records, metric, as_of));
        match MetricSummary::from_sorted(&values, config.histogram_bins) {
            Some(summary) => {
                metrics.insert(metric, summary);
            }
            None => debug!(%metric, "No values, metric omitted"),
        }
    }

    let languages: FrequencyTable = records.iter().map(|r| r.primary_language()).collect();

    let total = records.len();
    let zero_counts = ZeroCounts {
        no_issues: count_where(records, |r| !r.has_issues()),
        no_releases: count_where(records, |r| r.releases() == 0),
        no_merged_pull_requests: count_where(records, |r| r.merged_pull_requests() == 0),
    };

    let t = &config.thresholds;
    let leading_count: usize = languages
        .top(t.leading_languages)
        .iter()
        .map(|e| e.count)
        .sum();
    let highlights = Highlights {
        many_merged_pull_requests_threshold: t.many_merged_pull_requests,
        many_merged_pull_requests: count_where(records, |r| {
            r.merged_pull_requests() > t.many_merged_pull_requests
        }),
        recent_update_days: t.recent_update_days,
        recently_updated: count_where(records, |r| {
            r.days_since_update(as_of) <= t.recent_update_days
        }),
        high_closed_ratio_threshold: t.high_closed_ratio,
        high_closed_ratio: count_where(records, |r| {
            r.closed_issues_ratio() >= t.high_closed_ratio
        }),
        leading_languages: t.leading_languages,
        leading_languages_share: Share::of(leading_count, total).share,
    };

    debug!(
        languages = languages.distinct(),
        no_issues = zero_counts.no_issues.count,
        "Aggregation complete"
    );

    Ok(StatisticsSummary {
        schema_version: SCHEMA_VERSION,
        as_of,
        total_records: total,
        metrics,
        languages,
        zero_counts,
        highlights,
    })
}

/// Collects the values of `metric`, skipping issue-less repositories for the
/// closed-issues ratio.
pub fn metric_values(
    records: &[RepositoryRecord],
    metric: Metric,
    as_of: DateTime<Utc>,
) -> Vec<f64> {
    match metric {
        Metric::AgeYears => records.iter().map(|r| r.age_years(as_of)).collect(),
        Metric::MergedPullRequests => records
            .iter()
            .map(|r| r.merged_pull_requests() as f64)
            .collect(),
        Metric::Releases => records.iter().map(|r| r.releases() as f64).collect(),
        Metric::DaysSinceUpdate => records
            .iter()
            .map(|r| r.days_since_update(as_of) as f64)
            .collect(),
        Metric::ClosedIssuesRatio => records
            .iter()
            .filter(|r| r.has_issues())
            .map(|r| r.closed_issues_ratio())
            .collect(),
    }
}

/// Counts records matching `predicate`. Defined for empty input.
pub fn count_where(
    records: &[RepositoryRecord],
    predicate: impl Fn(&RepositoryRecord) -> bool,
) -> Share {
    let count = records.iter().filter(|&r| predicate(r)).count();
    Share::of(count, records.len())
}
