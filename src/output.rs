//! Output formatting and persistence for repository records and summaries.
//!
//! Supports debug pretty-printing, JSON serialization, CSV export of the
//! normalized record set and writing rendered reports.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::types::StatisticsSummary;
use crate::record::{RepositoryRecord, format_timestamp};

/// One row of the CSV export: stored fields plus the derived ones.
#[derive(Debug, Serialize)]
pub struct CsvRow<'a> {
    pub name: &'a str,
    pub owner: &'a str,
    pub repo_name: &'a str,
    pub stars: u64,
    pub created_at: String,
    pub updated_at: String,
    pub primary_language: &'a str,
    pub releases: u64,
    pub open_issues: u64,
    pub closed_issues: u64,
    pub closed_issues_ratio: f64,
    pub merged_pull_requests: u64,
    pub age_years: f64,
    pub days_since_update: i64,
}

impl<'a> CsvRow<'a> {
    pub fn new(record: &'a RepositoryRecord, as_of: DateTime<Utc>) -> Self {
        Self {
            name: record.name(),
            owner: record.owner(),
            repo_name: record.repo_name(),
            stars: record.stars(),
            created_at: format_timestamp(&record.created_at()),
            updated_at: format_timestamp(&record.updated_at()),
            primary_language: record.primary_language(),
            releases: record.releases(),
            open_issues: record.open_issues(),
            closed_issues: record.closed_issues(),
            closed_issues_ratio: round_to(record.closed_issues_ratio(), 4),
            merged_pull_requests: record.merged_pull_requests(),
            age_years: round_to(record.age_years(as_of), 2),
            days_since_update: record.days_since_update(as_of),
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Logs a summary using Rust's debug pretty-print format.
pub fn print_pretty(summary: &StatisticsSummary) {
    debug!("{:#?}", summary);
}

/// Logs a summary as pretty-printed JSON.
pub fn print_json(summary: &StatisticsSummary) -> Result<()> {
    info!("{}", to_json(summary)?);
    Ok(())
}

/// Serializes any value as pretty-printed JSON.
pub fn to_json(value: &impl Serialize) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Writes `value` as pretty-printed JSON to `path`, replacing any existing file.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let json = to_json(value)?;
    std::fs::write(path, json).with_context(|| format!("failed to write '{}'", path.display()))?;
    info!(path = %path.display(), "JSON written");
    Ok(())
}

/// Writes a rendered report to `path`, replacing any existing file.
pub fn write_report(path: &Path, report: &str) -> Result<()> {
    std::fs::write(path, report)
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    info!(path = %path.display(), bytes = report.len(), "Report written");
    Ok(())
}

/// Writes the record set as CSV with derived columns evaluated at `as_of`.
///
/// The file is created or truncated and always starts with a header row.
pub fn write_records_csv(
    path: &Path,
    records: &[RepositoryRecord],
    as_of: DateTime<Utc>,
) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create '{}'", path.display()))?;

    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);
    for record in records {
        writer.serialize(CsvRow::new(record, as_of))?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = records.len(), "CSV written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate;
    use crate::config::AnalysisConfig;
    use crate::parser::parse_csv;
    use crate::record::{RawRecord, fields, normalize};
    use chrono::TimeZone;
    use std::fs;

    #[test]
    fn test_print_pretty_does_not_panic() {
        let records = vec![create_record()];
        let summary = aggregate(&records, as_of(), &AnalysisConfig::default()).unwrap();
        print_pretty(&summary);
    }

    #[test]
    fn test_summary_json_has_metric_keys() {
        let records = vec![create_record()];
        let summary = aggregate(&records, as_of(), &AnalysisConfig::default()).unwrap();

        let json: serde_json::Value = serde_json::from_str(&to_json(&summary).unwrap()).unwrap();
        assert_eq!(json["total_records"], 1);
        assert_eq!(json["metrics"]["merged_pull_requests"]["median"], 30.0);
        assert_eq!(json["languages"]["entries"][0]["label"], "Rust");
        assert_eq!(json["zero_counts"]["no_releases"]["count"], 0);
    }

    #[test]
    fn test_print_json_does_not_panic() {
        let records = vec![create_record()];
        let summary = aggregate(&records, as_of(), &AnalysisConfig::default()).unwrap();
        assert!(print_json(&summary).is_ok());
    }

    #[test]
    fn test_write_json_round_trips_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let records = vec![create_record()];
        let summary = aggregate(&records, as_of(), &AnalysisConfig::default()).unwrap();

        write_json(&path, &summary).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["schema_version"], 1);
        assert_eq!(json["as_of"], "2025-09-01T00:00:00Z");
    }

    #[test]
    fn test_write_records_csv_with_derived_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repos.csv");

        write_records_csv(&path, &[create_record()], as_of()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("name,owner,repo_name,stars,created_at"));
        assert!(lines[0].ends_with("age_years,days_since_update"));

        let rows = parse_csv(content.as_bytes()).unwrap();
        assert_eq!(rows[0].get("owner"), Some("rust-lang"));
        assert_eq!(rows[0].get("repo_name"), Some("cargo"));
        assert_eq!(rows[0].get("closed_issues_ratio"), Some("0.75"));
        assert_eq!(rows[0].get("days_since_update"), Some("1"));
        assert_eq!(rows[0].get("age_years"), Some("2.0"));
    }

    #[test]
    fn test_csv_export_normalizes_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repos.csv");
        let original = create_record();

        write_records_csv(&path, &[original.clone()], as_of()).unwrap();
        let rows = parse_csv(fs::File::open(&path).unwrap()).unwrap();

        assert_eq!(normalize(&rows[0]).unwrap(), original);
    }

    #[test]
    fn test_write_report_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");

        write_report(&path, "first").unwrap();
        write_report(&path, "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    // Helper functions for tests
    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap()
    }

    fn create_record() -> RepositoryRecord {
        let raw = RawRecord::new()
            .with(fields::NAME, "rust-lang/cargo")
            .with(fields::STARS, "14000")
            .with(fields::CREATED_AT, "2023-09-01T00:00:00Z")
            .with(fields::UPDATED_AT, "2025-08-31T00:00:00Z")
            .with(fields::PRIMARY_LANGUAGE, "Rust")
            .with(fields::RELEASES, "50")
            .with(fields::OPEN_ISSUES, "1")
            .with(fields::CLOSED_ISSUES, "3")
            .with(fields::MERGED_PULL_REQUESTS, "30");
        normalize(&raw).unwrap()
    }
}
