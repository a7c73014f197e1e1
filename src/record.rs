//! Canonical repository records and the normalizer that builds them.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::NormalizeError;

/// Julian year, used to turn elapsed days into years.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Label substituted when the upstream record has no primary language.
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

const SECONDS_PER_DAY: i64 = 86_400;

/// Input field names shared by every input format.
pub mod fields {
    pub const NAME: &str = "name";
    pub const STARS: &str = "stars";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
    pub const PRIMARY_LANGUAGE: &str = "primary_language";
    pub const RELEASES: &str = "releases";
    pub const OPEN_ISSUES: &str = "open_issues";
    pub const CLOSED_ISSUES: &str = "closed_issues";
    pub const MERGED_PULL_REQUESTS: &str = "merged_pull_requests";
}

/// An untyped record as read from XML, CSV or the API.
///
/// Values are kept as text; blank values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    /// Returns the trimmed value of `field`, or `None` when absent or blank.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut raw = RawRecord::new();
        for (k, v) in iter {
            raw.insert(k, v);
        }
        raw
    }
}

impl From<&RepositoryRecord> for RawRecord {
    /// Writes back the stored (non-derived) fields of a record.
    fn from(r: &RepositoryRecord) -> Self {
        RawRecord::new()
            .with(fields::NAME, r.name.as_str())
            .with(fields::STARS, r.stars.to_string())
            .with(fields::CREATED_AT, format_timestamp(&r.created_at))
            .with(fields::UPDATED_AT, format_timestamp(&r.updated_at))
            .with(fields::PRIMARY_LANGUAGE, r.primary_language.as_str())
            .with(fields::RELEASES, r.releases.to_string())
            .with(fields::OPEN_ISSUES, r.open_issues.to_string())
            .with(fields::CLOSED_ISSUES, r.closed_issues.to_string())
            .with(
                fields::MERGED_PULL_REQUESTS,
                r.merged_pull_requests.to_string(),
            )
    }
}

/// A validated repository record. Only [`normalize`] constructs one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryRecord {
    name: String,
    stars: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    primary_language: String,
    releases: u64,
    open_issues: u64,
    closed_issues: u64,
    merged_pull_requests: u64,
}

impl RepositoryRecord {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &str {
        self.name.split_once('/').map_or("", |(owner, _)| owner)
    }

    pub fn repo_name(&self) -> &str {
        self.name.split_once('/').map_or("", |(_, repo)| repo)
    }

    pub fn stars(&self) -> u64 {
        self.stars
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn primary_language(&self) -> &str {
        &self.primary_language
    }

    pub fn releases(&self) -> u64 {
        self.releases
    }

    pub fn open_issues(&self) -> u64 {
        self.open_issues
    }

    pub fn closed_issues(&self) -> u64 {
        self.closed_issues
    }

    pub fn merged_pull_requests(&self) -> u64 {
        self.merged_pull_requests
    }

    /// Open plus closed issues, widened so two `u64` counts cannot overflow.
    pub fn total_issues(&self) -> u128 {
        u128::from(self.open_issues) + u128::from(self.closed_issues)
    }

    pub fn has_issues(&self) -> bool {
        self.total_issues() > 0
    }

    /// Fraction of issues that are closed; exactly `0.0` when there are none.
    pub fn closed_issues_ratio(&self) -> f64 {
        let total = self.total_issues();
        if total == 0 {
            0.0
        } else {
            self.closed_issues as f64 / total as f64
        }
    }

    /// Age in Julian years at `as_of`, counting whole elapsed days.
    pub fn age_years(&self, as_of: DateTime<Utc>) -> f64 {
        whole_days_between(self.created_at, as_of) as f64 / DAYS_PER_YEAR
    }

    /// Whole days elapsed between the last update and `as_of`.
    pub fn days_since_update(&self, as_of: DateTime<Utc>) -> i64 {
        whole_days_between(self.updated_at, as_of)
    }
}

/// Converts one raw record into a [`RepositoryRecord`].
///
/// # Errors
///
/// Fails when a required field is absent or unparseable, when `name` is not
/// `owner/repo`, or when `updated_at` precedes `created_at`. A missing
/// `primary_language` is replaced by [`UNKNOWN_LANGUAGE`].
pub fn normalize(raw: &RawRecord) -> Result<RepositoryRecord, NormalizeError> {
    let name = parse_name(raw)?;
    let stars = parse_count(raw, fields::STARS)?;
    let created_at = parse_timestamp(raw, fields::CREATED_AT)?;
    let updated_at = parse_timestamp(raw, fields::UPDATED_AT)?;
    let releases = parse_count(raw, fields::RELEASES)?;
    let open_issues = parse_count(raw, fields::OPEN_ISSUES)?;
    let closed_issues = parse_count(raw, fields::CLOSED_ISSUES)?;
    let merged_pull_requests = parse_count(raw, fields::MERGED_PULL_REQUESTS)?;

    if updated_at < created_at {
        return Err(NormalizeError::UpdatedBeforeCreated {
            created_at: format_timestamp(&created_at),
            updated_at: format_timestamp(&updated_at),
        });
    }

    let primary_language = raw
        .get(fields::PRIMARY_LANGUAGE)
        .unwrap_or(UNKNOWN_LANGUAGE)
        .to_string();

    Ok(RepositoryRecord {
        name,
        stars,
        created_at,
        updated_at,
        primary_language,
        releases,
        open_issues,
        closed_issues,
        merged_pull_requests,
    })
}

/// Parses an ISO-8601 timestamp with a `Z` designator or numeric offset into UTC.
pub fn parse_utc(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Formats a timestamp the way the upstream API does (`2015-03-14T09:26:53Z`).
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Whole days from `from` to `to`, floored toward negative infinity.
fn whole_days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_seconds().div_euclid(SECONDS_PER_DAY)
}

fn required<'a>(raw: &'a RawRecord, field: &'static str) -> Result<&'a str, NormalizeError> {
    raw.get(field)
        .ok_or(NormalizeError::MissingField { field })
}

fn parse_name(raw: &RawRecord) -> Result<String, NormalizeError> {
    let name = required(raw, fields::NAME)?;
    match name.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok(name.to_string())
        }
        _ => Err(NormalizeError::InvalidName {
            value: name.to_string(),
        }),
    }
}

fn parse_count(raw: &RawRecord, field: &'static str) -> Result<u64, NormalizeError> {
    let value = required(raw, field)?;
    value.parse().map_err(|_| NormalizeError::InvalidField {
        field,
        value: value.to_string(),
    })
}

fn parse_timestamp(raw: &RawRecord, field: &'static str) -> Result<DateTime<Utc>, NormalizeError> {
    let value = required(raw, field)?;
    parse_utc(value).ok_or_else(|| NormalizeError::InvalidTimestamp {
        field,
        value: value.to_string(),
    })
}
