//! Repository statistics aggregation.
//!
//! This module turns a normalized repository collection into per-metric
//! descriptive statistics (median, extremes, spread, histogram), a language
//! frequency table and the threshold counts used by the report.

pub mod aggregate;
pub mod frequency;
pub mod histogram;
pub mod types;
pub mod utility;

pub use aggregate::aggregate;
pub use frequency::{FrequencyEntry, FrequencyTable};
pub use types::{Metric, MetricSummary, Share, StatisticsSummary};
