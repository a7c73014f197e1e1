use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use repo_survey::analyzers::{Metric, aggregate};
use repo_survey::config::AnalysisConfig;
use repo_survey::record::{RawRecord, RepositoryRecord, fields, format_timestamp, normalize};

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

prop_compose! {
    fn arb_raw()(
        owner in "[a-z][a-z0-9-]{0,12}",
        repo in "[a-z][a-z0-9._-]{0,12}",
        stars in 0u64..500_000,
        created_offset in 0i64..400_000_000,
        update_gap in 0i64..100_000_000,
        language in prop::option::of(prop::sample::select(vec!["Rust", "Go", "Python", "C"])),
        releases in 0u64..1_000,
        open in prop_oneof![Just(0u64), 0u64..10_000],
        closed in prop_oneof![Just(0u64), 0u64..10_000],
        merged in 0u64..100_000,
    ) -> RawRecord {
        let created = Utc.with_ymd_and_hms(2008, 1, 1, 0, 0, 0).unwrap()
            + Duration::seconds(created_offset);
        let updated = created + Duration::seconds(update_gap);

        let mut raw = RawRecord::new()
            .with(fields::NAME, format!("{owner}/{repo}"))
            .with(fields::STARS, stars.to_string())
            .with(fields::CREATED_AT, format_timestamp(&created))
            .with(fields::UPDATED_AT, format_timestamp(&updated))
            .with(fields::RELEASES, releases.to_string())
            .with(fields::OPEN_ISSUES, open.to_string())
            .with(fields::CLOSED_ISSUES, closed.to_string())
            .with(fields::MERGED_PULL_REQUESTS, merged.to_string());
        if let Some(language) = language {
            raw.insert(fields::PRIMARY_LANGUAGE, language);
        }
        raw
    }
}

fn metric_value(record: &RepositoryRecord, metric: Metric) -> f64 {
    match metric {
        Metric::AgeYears => record.age_years(as_of()),
        Metric::MergedPullRequests => record.merged_pull_requests() as f64,
        Metric::Releases => record.releases() as f64,
        Metric::DaysSinceUpdate => record.days_since_update(as_of()) as f64,
        Metric::ClosedIssuesRatio => record.closed_issues_ratio(),
    }
}

proptest! {
    #[test]
    fn normalize_is_idempotent(raw in arb_raw()) {
        let first = normalize(&raw).unwrap();
        let second = normalize(&RawRecord::from(&first)).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.age_years(as_of()), second.age_years(as_of()));
        prop_assert_eq!(first.days_since_update(as_of()), second.days_since_update(as_of()));
        prop_assert_eq!(first.closed_issues_ratio(), second.closed_issues_ratio());
    }

    #[test]
    fn closed_issues_ratio_is_a_fraction(raw in arb_raw()) {
        let record = normalize(&raw).unwrap();
        let ratio = record.closed_issues_ratio();
        prop_assert!((0.0..=1.0).contains(&ratio));
    }

    #[test]
    fn identical_records_collapse_statistics(raw in arb_raw(), copies in 1usize..20) {
        let record = normalize(&raw).unwrap();
        let records = vec![record.clone(); copies];

        let summary = aggregate(&records, as_of(), &AnalysisConfig::default()).unwrap();
        prop_assert_eq!(
            summary.metric(Metric::ClosedIssuesRatio).is_some(),
            record.has_issues()
        );
        for metric in Metric::ALL {
            let Some(m) = summary.metric(metric) else {
                continue;
            };
            let expected = metric_value(&record, metric);
            prop_assert_eq!(m.median, expected);
            prop_assert_eq!(m.min, expected);
            prop_assert_eq!(m.max, expected);
        }
    }

    #[test]
    fn median_lies_between_extremes(raws in prop::collection::vec(arb_raw(), 1..40)) {
        let records: Vec<_> = raws.iter().map(|r| normalize(r).unwrap()).collect();

        let summary = aggregate(&records, as_of(), &AnalysisConfig::default()).unwrap();
        for metric in Metric::ALL {
            let Some(m) = summary.metric(metric) else {
                continue;
            };
            prop_assert!(m.min <= m.median && m.median <= m.max);
            prop_assert!(m.lower_quartile <= m.upper_quartile);
            prop_assert_eq!(m.histogram.total(), m.sample_size);
        }

        let no_issues = records.iter().filter(|r| !r.has_issues()).count();
        prop_assert_eq!(summary.zero_counts.no_issues.count, no_issues);
        let ratio_samples = summary
            .metric(Metric::ClosedIssuesRatio)
            .map_or(0, |m| m.sample_size);
        prop_assert_eq!(ratio_samples, records.len() - no_issues);
        prop_assert_eq!(summary.languages.total(), records.len());
    }
}
