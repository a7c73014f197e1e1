//! Text and markdown rendering of a [`StatisticsSummary`].
//!
//! Rendering only formats values already present in the summary; it never
//! touches the underlying records.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analyzers::types::{Metric, MetricSummary, Share, StatisticsSummary};
use crate::config::AnalysisConfig;

const RULE: &str =
    "================================================================================";

/// Decimal places used per kind of value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Precision {
    pub years: usize,
    pub ratios: usize,
    pub counts: usize,
    pub percent: usize,
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            years: 1,
            ratios: 2,
            counts: 0,
            percent: 1,
        }
    }
}

impl Precision {
    pub fn for_metric(&self, metric: Metric) -> usize {
        match metric {
            Metric::AgeYears => self.years,
            Metric::ClosedIssuesRatio => self.ratios,
            Metric::MergedPullRequests | Metric::Releases | Metric::DaysSinceUpdate => self.counts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportStyle {
    #[default]
    Text,
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub style: ReportStyle,
    pub precision: Precision,
    pub top_languages: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            style: ReportStyle::Text,
            precision: Precision::default(),
            top_languages: 10,
        }
    }
}

impl ReportOptions {
    pub fn from_config(config: &AnalysisConfig, style: ReportStyle) -> Self {
        Self {
            style,
            precision: config.precision,
            top_languages: config.top_languages,
        }
    }
}

/// Report sections, one per research question, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Metric(Metric),
    Languages,
}

const SECTIONS: [(&str, Section, &str); 6] = [
    (
        "RQ01",
        Section::Metric(Metric::AgeYears),
        "Are popular systems mature/old?",
    ),
    (
        "RQ02",
        Section::Metric(Metric::MergedPullRequests),
        "Do popular systems receive a lot of external contribution?",
    ),
    (
        "RQ03",
        Section::Metric(Metric::Releases),
        "Do popular systems ship releases frequently?",
    ),
    (
        "RQ04",
        Section::Metric(Metric::DaysSinceUpdate),
        "Are popular systems updated frequently?",
    ),
    (
        "RQ05",
        Section::Languages,
        "Are popular systems written in the most popular languages?",
    ),
    (
        "RQ06",
        Section::Metric(Metric::ClosedIssuesRatio),
        "Do popular systems have a high percentage of closed issues?",
    ),
];

/// Renders `summary` as a complete report.
pub fn render(summary: &StatisticsSummary, options: &ReportOptions) -> String {
    Report { summary, options }.to_string()
}

/// Formats `value` with `places` decimals.
pub fn format_value(value: f64, places: usize) -> String {
    format!("{value:.places$}")
}

fn no_values_note(metric: Metric) -> &'static str {
    match metric {
        Metric::ClosedIssuesRatio => "No repository has any issues.",
        _ => "No values recorded.",
    }
}

struct Report<'a> {
    summary: &'a StatisticsSummary,
    options: &'a ReportOptions,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.options.style {
            ReportStyle::Text => self.write_text(f),
            ReportStyle::Markdown => self.write_markdown(f),
        }
    }
}

impl Report<'_> {
    fn value(&self, metric: Metric, value: f64) -> String {
        format_value(value, self.options.precision.for_metric(metric))
    }

    fn percent(&self, share: f64) -> String {
        format!(
            "{}%",
            format_value(share * 100.0, self.options.precision.percent)
        )
    }

    fn share(&self, share: &Share) -> String {
        format!("{} ({})", share.count, self.percent(share.share))
    }

    fn extra_lines(&self) -> Vec<(String, String)> {
        let zero = &self.summary.zero_counts;
        let h = &self.summary.highlights;
        vec![
            ("Repositories without issues".to_string(), self.share(&zero.no_issues)),
            ("Repositories without releases".to_string(), self.share(&zero.no_releases)),
            (
                "Repositories without merged pull requests".to_string(),
                self.share(&zero.no_merged_pull_requests),
            ),
            (
                format!(
                    "Repositories with more than {} merged pull requests",
                    h.many_merged_pull_requests_threshold
                ),
                self.share(&h.many_merged_pull_requests),
            ),
            (
                format!("Repositories updated within {} days", h.recent_update_days),
                self.share(&h.recently_updated),
            ),
            (
                format!(
                    "Repositories with closed issues ratio >= {}",
                    format_value(h.high_closed_ratio_threshold, self.options.precision.ratios)
                ),
                self.share(&h.high_closed_ratio),
            ),
            (
                format!("Share of the top {} languages", h.leading_languages),
                self.percent(h.leading_languages_share),
            ),
        ]
    }

    fn write_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(
            f,
            "POPULAR REPOSITORY SURVEY: {} repositories as of {}",
            self.summary.total_records,
            self.summary.as_of.format("%Y-%m-%d %H:%M UTC")
        )?;
        writeln!(f, "{RULE}")?;

        for (id, section, question) in SECTIONS {
            writeln!(f)?;
            writeln!(f, "{id} - {question}")?;
            match section {
                Section::Metric(metric) => self.write_text_metric(f, metric)?,
                Section::Languages => {
                    let top = self.summary.languages.top(self.options.top_languages);
                    writeln!(f, "  Top {} languages:", top.len())?;
                    for entry in top {
                        writeln!(
                            f,
                            "    {}: {} repositories ({})",
                            entry.label,
                            entry.count,
                            self.percent(entry.share)
                        )?;
                    }
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "ADDITIONAL STATISTICS")?;
        writeln!(f, "{RULE}")?;
        for (label, value) in self.extra_lines() {
            writeln!(f, "{label}: {value}")?;
        }
        Ok(())
    }

    fn write_text_metric(&self, f: &mut fmt::Formatter<'_>, metric: Metric) -> fmt::Result {
        let Some(m) = self.summary.metric(metric) else {
            return writeln!(f, "  {}", no_values_note(metric));
        };
        let label = metric.label();
        writeln!(f, "  {label} (median): {}", self.value(metric, m.median))?;
        writeln!(f, "  {label} (min): {}", self.value(metric, m.min))?;
        writeln!(f, "  {label} (max): {}", self.value(metric, m.max))?;
        if m.sample_size != self.summary.total_records {
            writeln!(f, "  Computed over {} repositories", m.sample_size)?;
        }
        Ok(())
    }

    fn write_markdown(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Popular repository survey")?;
        writeln!(f)?;
        writeln!(
            f,
            "_{} repositories, as of {}_",
            self.summary.total_records,
            self.summary.as_of.format("%Y-%m-%d %H:%M UTC")
        )?;
        writeln!(f)?;
        writeln!(f, "## Central metrics")?;
        writeln!(f)?;
        writeln!(f, "| Metric | Median | Mean | Std dev | Min | Max |")?;
        writeln!(f, "|--------|--------|------|---------|-----|-----|")?;
        for metric in Metric::ALL {
            if let Some(m) = self.summary.metric(metric) {
                writeln!(
                    f,
                    "| **{}** | {} | {} | {} | {} | {} |",
                    metric.label(),
                    self.value(metric, m.median),
                    self.value(metric, m.mean),
                    self.value(metric, m.stddev),
                    self.value(metric, m.min),
                    self.value(metric, m.max),
                )?;
            }
        }

        for (id, section, question) in SECTIONS {
            writeln!(f)?;
            writeln!(f, "## {id} - {question}")?;
            writeln!(f)?;
            match section {
                Section::Metric(metric) => match self.summary.metric(metric) {
                    Some(m) => self.write_markdown_metric(f, metric, m)?,
                    None => writeln!(f, "_{}_", no_values_note(metric))?,
                },
                Section::Languages => {
                    let top = self.summary.languages.top(self.options.top_languages);
                    writeln!(f, "**Top {} languages:**", top.len())?;
                    writeln!(f)?;
                    for (rank, entry) in top.iter().enumerate() {
                        writeln!(
                            f,
                            "{}. **{}**: {} repositories ({})",
                            rank + 1,
                            entry.label,
                            entry.count,
                            self.percent(entry.share)
                        )?;
                    }
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "## Additional statistics")?;
        writeln!(f)?;
        for (label, value) in self.extra_lines() {
            writeln!(f, "- {label}: {value}")?;
        }
        Ok(())
    }

    fn write_markdown_metric(
        &self,
        f: &mut fmt::Formatter<'_>,
        metric: Metric,
        m: &MetricSummary,
    ) -> fmt::Result {
        writeln!(f, "- **Median**: {}", self.value(metric, m.median))?;
        writeln!(f, "- **Min**: {}", self.value(metric, m.min))?;
        writeln!(f, "- **Max**: {}", self.value(metric, m.max))?;
        writeln!(
            f,
            "- **Interquartile range**: {} to {}",
            self.value(metric, m.lower_quartile),
            self.value(metric, m.upper_quartile)
        )?;
        if m.sample_size != self.summary.total_records {
            writeln!(f, "- Computed over {} repositories", m.sample_size)?;
        }
        Ok(())
    }
}
