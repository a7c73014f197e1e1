use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::report::Precision;

/// Environment variable naming a config file when `--config` is not given.
pub const CONFIG_ENV_VAR: &str = "REPO_SURVEY_CONFIG";

/// Tunables for aggregation and rendering.
///
/// Stored as a JSON object on disk; every key is optional:
/// ```json
/// {
///   "histogram_bins": 30,
///   "top_languages": 10,
///   "thresholds": { "many_merged_pull_requests": 100, "recent_update_days": 7 },
///   "precision": { "years": 1, "ratios": 2 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub histogram_bins: usize,
    pub top_languages: usize,
    pub thresholds: Thresholds,
    pub precision: Precision,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            histogram_bins: 30,
            top_languages: 10,
            thresholds: Thresholds::default(),
            precision: Precision::default(),
        }
    }
}

/// Cut-offs for the highlight counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    /// Repositories with strictly more merged PRs than this are counted.
    pub many_merged_pull_requests: u64,
    /// Repositories updated at most this many days ago are counted.
    pub recent_update_days: i64,
    /// Repositories whose closed-issues ratio reaches this are counted.
    pub high_closed_ratio: f64,
    /// How many of the most common languages make up the leading share.
    pub leading_languages: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            many_merged_pull_requests: 100,
            recent_update_days: 7,
            high_closed_ratio: 0.8,
            leading_languages: 3,
        }
    }
}

impl AnalysisConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{path}'"))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("invalid config file '{path}'"))?;
        debug!(path, "Loaded analysis config");
        Ok(config)
    }

    /// Loads `path` if given, else the file named by [`CONFIG_ENV_VAR`], else defaults.
    pub fn resolve(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match std::env::var(CONFIG_ENV_VAR) {
                Ok(path) if !path.is_empty() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }
}
