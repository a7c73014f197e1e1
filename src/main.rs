//! CLI entry point for the repository survey tool.
//!
//! Provides subcommands for analyzing collected repository metadata,
//! converting exports to CSV with derived columns, and validating inputs.

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use repo_survey::{
    analyzers::aggregate,
    collection::{InvalidRecordPolicy, RepositoryCollection},
    config::AnalysisConfig,
    output::{print_pretty, to_json, write_records_csv, write_report},
    parser::load_raw_records,
    record::parse_utc,
    report::{ReportOptions, ReportStyle, render},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "repo_survey")]
#[command(about = "Descriptive statistics over popular open-source repositories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize repository metadata and report statistics per research question
    Analyze {
        /// XML, CSV or API JSON export (optionally gzipped)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Report format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write the report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON config file (falls back to $REPO_SURVEY_CONFIG)
        #[arg(short, long)]
        config: Option<String>,

        /// Number of languages listed in the report
        #[arg(long)]
        top_languages: Option<usize>,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Convert an export into CSV with derived age and update columns
    Convert {
        /// XML, CSV or API JSON export (optionally gzipped)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// CSV file to write
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Normalize every record and list the ones that fail
    Validate {
        /// XML, CSV or API JSON export (optionally gzipped)
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Instant derived metrics are computed against (RFC 3339), defaults to now
    #[arg(long, value_parser = parse_as_of)]
    as_of: Option<DateTime<Utc>>,

    /// What to do with records that fail to normalize
    #[arg(long, value_enum, default_value = "reject")]
    on_invalid: OnInvalid,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum OnInvalid {
    /// Abort on the first invalid record
    Reject,
    /// Drop invalid records and report how many were dropped
    Skip,
}

impl From<OnInvalid> for InvalidRecordPolicy {
    fn from(value: OnInvalid) -> Self {
        match value {
            OnInvalid::Reject => InvalidRecordPolicy::Reject,
            OnInvalid::Skip => InvalidRecordPolicy::Skip,
        }
    }
}

fn parse_as_of(value: &str) -> Result<DateTime<Utc>, String> {
    parse_utc(value).ok_or_else(|| format!("'{value}' is not an RFC 3339 timestamp"))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            format,
            output,
            config,
            top_languages,
            common,
        } => {
            let mut config = AnalysisConfig::resolve(config.as_deref())?;
            if let Some(n) = top_languages {
                config.top_languages = n;
            }
            let as_of = common.as_of.unwrap_or_else(Utc::now);

            let collection = load_collection(&input, common.on_invalid.into())?;
            let summary = aggregate(collection.records(), as_of, &config)?;
            print_pretty(&summary);

            let rendered = match format {
                OutputFormat::Json => to_json(&summary)?,
                OutputFormat::Text => render(
                    &summary,
                    &ReportOptions::from_config(&config, ReportStyle::Text),
                ),
                OutputFormat::Markdown => render(
                    &summary,
                    &ReportOptions::from_config(&config, ReportStyle::Markdown),
                ),
            };

            match output {
                Some(path) => write_report(&path, &rendered)?,
                None => println!("{rendered}"),
            }
        }
        Commands::Convert {
            input,
            output,
            common,
        } => {
            let as_of = common.as_of.unwrap_or_else(Utc::now);
            let collection = load_collection(&input, common.on_invalid.into())?;
            write_records_csv(&output, collection.records(), as_of)?;
        }
        Commands::Validate { input } => {
            let collection = load_collection(&input, InvalidRecordPolicy::Skip)?;
            let total = collection.len() + collection.rejected().len();

            for rejected in collection.rejected() {
                println!(
                    "#{} {}: {}",
                    rejected.position,
                    rejected.name.as_deref().unwrap_or("<unnamed>"),
                    rejected.error
                );
            }

            if !collection.rejected().is_empty() {
                bail!(
                    "{} of {} records failed validation",
                    collection.rejected().len(),
                    total
                );
            }
            info!(total, "All records are valid");
        }
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/repo_survey.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("repo_survey.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

/// Parses an input file and normalizes it under `policy`.
#[tracing::instrument(skip(path), fields(input = %path.display()))]
fn load_collection(path: &Path, policy: InvalidRecordPolicy) -> Result<RepositoryCollection> {
    let raw = load_raw_records(path)?;
    let collection = RepositoryCollection::from_raw(raw, policy)?;

    if !collection.rejected().is_empty() {
        warn!(
            rejected = collection.rejected().len(),
            kept = collection.len(),
            "Some records were dropped"
        );
    }
    info!(records = collection.len(), "Repository collection loaded");
    Ok(collection)
}
