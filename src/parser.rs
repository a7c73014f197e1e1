//! Input parsers for collected repository metadata.
//!
//! Every supported format is reduced to [`RawRecord`]s; typing and
//! validation happen later in [`crate::record::normalize`].

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::record::{RawRecord, fields};

/// Element wrapping one repository in XML exports.
pub const XML_RECORD_TAG: &str = "repository";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Xml,
    Csv,
    ApiJson,
}

impl InputFormat {
    /// Picks a format from the file extension, looking through a trailing `.gz`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let name = name.strip_suffix(".gz").unwrap_or(&name);

        match Path::new(name).extension().and_then(|e| e.to_str()) {
            Some("xml") => Ok(InputFormat::Xml),
            Some("csv") => Ok(InputFormat::Csv),
            Some("json") => Ok(InputFormat::ApiJson),
            _ => bail!("unsupported input file '{}'", path.display()),
        }
    }
}

/// Reads `path` and parses it according to its extension.
pub fn load_raw_records(path: &Path) -> Result<Vec<RawRecord>> {
    let format = InputFormat::from_path(path)?;
    let text = read_input(path)?;

    let records = match format {
        InputFormat::Xml => parse_xml(&text),
        InputFormat::Csv => parse_csv(text.as_bytes()),
        InputFormat::ApiJson => parse_api_json(&text),
    }
    .with_context(|| format!("failed to parse '{}'", path.display()))?;

    debug!(path = %path.display(), ?format, records = records.len(), "Loaded raw records");
    Ok(records)
}

/// Reads a file to a string, gunzipping it when the name ends in `.gz`.
pub fn read_input(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?;

    if path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
    {
        let mut text = String::new();
        GzDecoder::new(bytes.as_slice())
            .read_to_string(&mut text)
            .with_context(|| format!("failed to decompress '{}'", path.display()))?;
        Ok(text)
    } else {
        String::from_utf8(bytes)
            .with_context(|| format!("'{}' is not valid UTF-8", path.display()))
    }
}

/// Parses an XML export: every `<repository>` element's child elements become fields.
///
/// # Errors
///
/// Returns an error if the document is not well-formed XML.
pub fn parse_xml(text: &str) -> Result<Vec<RawRecord>> {
    let doc = roxmltree::Document::parse(text)?;

    let records: Vec<RawRecord> = doc
        .descendants()
        .filter(|n| n.has_tag_name(XML_RECORD_TAG))
        .map(|repo| {
            repo.children()
                .filter(|n| n.is_element())
                .map(|child| (child.tag_name().name(), child.text().unwrap_or_default()))
                .collect::<RawRecord>()
        })
        .collect();

    Ok(records)
}

/// Parses a CSV export with a header row naming the fields.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut records: Vec<RawRecord> = Vec::new();
    for result in rdr.records() {
        let row = result?;
        records.push(headers.iter().zip(row.iter()).collect());
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct TotalCount {
    #[serde(rename = "totalCount")]
    total_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Language {
    name: Option<String>,
}

/// One repository node as returned by the GraphQL API. Any field may be
/// missing or `null`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiRepository {
    name_with_owner: Option<String>,
    stargazer_count: Option<u64>,
    created_at: Option<String>,
    updated_at: Option<String>,
    primary_language: Option<Language>,
    releases: Option<TotalCount>,
    issues: Option<TotalCount>,
    closed_issues: Option<TotalCount>,
    pull_requests: Option<TotalCount>,
}

impl From<ApiRepository> for RawRecord {
    fn from(api: ApiRepository) -> Self {
        fn total(count: Option<TotalCount>) -> Option<String> {
            count.and_then(|c| c.total_count).map(|n| n.to_string())
        }

        let pairs = [
            (fields::NAME, api.name_with_owner),
            (fields::STARS, api.stargazer_count.map(|n| n.to_string())),
            (fields::CREATED_AT, api.created_at),
            (fields::UPDATED_AT, api.updated_at),
            (
                fields::PRIMARY_LANGUAGE,
                api.primary_language.and_then(|l| l.name),
            ),
            (fields::RELEASES, total(api.releases)),
            (fields::OPEN_ISSUES, total(api.issues)),
            (fields::CLOSED_ISSUES, total(api.closed_issues)),
            (fields::MERGED_PULL_REQUESTS, total(api.pull_requests)),
        ];

        pairs
            .into_iter()
            .filter_map(|(field, value)| value.map(|v| (field, v)))
            .collect()
    }
}

/// Parses a JSON array of GraphQL repository nodes.
pub fn parse_api_json(text: &str) -> Result<Vec<RawRecord>> {
    let nodes: Vec<ApiRepository> = serde_json::from_str(text)?;
    Ok(nodes.into_iter().map(RawRecord::from).collect())
}
