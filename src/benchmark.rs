use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::stats::SkippedPage;

/// Leading columns of the benchmark table; trailing timing columns are ignored.
const ROW_COLUMNS: usize = 6;

/// One capture of a page, as written by the benchmark runner.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BenchmarkRow {
    pub url: String,
    /// Capture time in milliseconds since the unix epoch.
    pub timestamp: i64,
    #[serde(deserialize_with = "bool_text")]
    pub js_enabled: bool,
    pub script_count: u32,
    #[serde(deserialize_with = "bool_text")]
    pub noscript: bool,
    /// Base name of the capture's artifact files, without extension.
    pub data_file_name: String,
}

impl BenchmarkRow {
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

fn bool_text<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().eq_ignore_ascii_case("true"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub line: u64,
    pub message: String,
}

pub type RowOutcome = std::result::Result<BenchmarkRow, RowError>;

/// The JS-enabled and JS-disabled captures of one logical page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCapture {
    pub js: BenchmarkRow,
    pub no_js: BenchmarkRow,
}

impl PageCapture {
    pub fn captures(&self) -> [&BenchmarkRow; 2] {
        [&self.js, &self.no_js]
    }
}

pub fn read_benchmark(path: &Path) -> Result<Vec<RowOutcome>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open benchmark table {:?}", path))?;
    let rows = read_benchmark_from(file)?;
    info!(
        action = "loaded",
        component = "benchmark_table",
        file_path = ?path,
        row_count = rows.len(),
        "Loaded benchmark rows"
    );
    Ok(rows)
}

/// Reads rows after the header line. Malformed rows are kept as errors so
/// that a single bad line only costs its page.
pub fn read_benchmark_from<R: Read>(reader: R) -> Result<Vec<RowOutcome>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    reader
        .headers()
        .context("Failed to read benchmark table header")?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        // header occupies line 1
        let fallback_line = index as u64 + 2;
        let row = match record {
            Ok(record) => parse_row(record, fallback_line),
            Err(e) => Err(RowError {
                line: e.position().map_or(fallback_line, |p| p.line()),
                message: e.to_string(),
            }),
        };
        rows.push(row);
    }

    Ok(rows)
}

fn parse_row(mut record: StringRecord, fallback_line: u64) -> RowOutcome {
    let line = record.position().map_or(fallback_line, |p| p.line());

    if record.len() < ROW_COLUMNS {
        return Err(RowError {
            line,
            message: format!("expected {} columns, found {}", ROW_COLUMNS, record.len()),
        });
    }

    record.truncate(ROW_COLUMNS);
    record.deserialize(None).map_err(|e| RowError {
        line,
        message: e.to_string(),
    })
}

/// Groups consecutive rows into page captures, JS-enabled row first.
pub fn pair_captures(rows: Vec<RowOutcome>) -> Vec<std::result::Result<PageCapture, SkippedPage>> {
    let mut rows = rows.into_iter();
    let mut pages = Vec::new();

    while let Some(first) = rows.next() {
        let Some(second) = rows.next() else {
            pages.push(Err(skipped(&first, "capture without a matching second row")));
            break;
        };

        let page = match (first, second) {
            (Ok(js), Ok(no_js)) => {
                if js.url != no_js.url || !js.js_enabled || no_js.js_enabled {
                    warn!(
                        action = "pair",
                        component = "benchmark_table",
                        js_url = %js.url,
                        no_js_url = %no_js.url,
                        "Capture pair looks out of order"
                    );
                }
                Ok(PageCapture { js, no_js })
            }
            (Err(e), other) | (other, Err(e)) => Err(skipped(
                &other,
                &format!("malformed row at line {}: {}", e.line, e.message),
            )),
        };
        pages.push(page);
    }

    pages
}

fn skipped(row: &RowOutcome, reason: &str) -> SkippedPage {
    let url = match row {
        Ok(row) => row.url.clone(),
        Err(e) => format!("<line {}>", e.line),
    };
    SkippedPage {
        url,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "url,timestamp,jsEnabled,scriptCount,noscript,dataFileName,load1,load2\n";

    fn rows(body: &str) -> Vec<RowOutcome> {
        read_benchmark_from(format!("{}{}", HEADER, body).as_bytes()).unwrap()
    }

    #[test]
    fn test_reads_positional_columns() {
        let parsed = rows(
            "https://example.com/,1589961600000,True,12,\"FALSE\",example_com_js_1,10.5,11\n",
        );

        assert_eq!(
            parsed,
            vec![Ok(BenchmarkRow {
                url: "https://example.com/".to_string(),
                timestamp: 1589961600000,
                js_enabled: true,
                script_count: 12,
                noscript: false,
                data_file_name: "example_com_js_1".to_string(),
            })]
        );
        let captured = parsed[0].as_ref().unwrap().captured_at().unwrap();
        assert_eq!(captured.to_rfc3339(), "2020-05-20T08:00:00+00:00");
    }

    #[test]
    fn test_malformed_rows_are_kept_as_errors() {
        let parsed = rows(
            "https://a.com/,1,true,x,true,a_js\nhttps://a.com/,1,false\nhttps://b.com/,1,true,0,false,b_js\n",
        );

        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].as_ref().unwrap_err().line, 2);
        assert_eq!(parsed[1].as_ref().unwrap_err().line, 3);
        assert!(parsed[2].is_ok());
    }

    #[test]
    fn test_pair_captures() {
        let parsed = rows(
            "https://a.com/,1,true,3,true,a_js\n\
             https://a.com/,2,false,0,false,a_nojs\n\
             https://b.com/,3,true,3,true,b_js\n\
             https://b.com/,4,false,oops,false,b_nojs\n\
             https://c.com/,5,true,1,true,c_js\n",
        );
        let pages = pair_captures(parsed);

        assert_eq!(pages.len(), 3);
        let first = pages[0].as_ref().unwrap();
        assert_eq!(first.js.data_file_name, "a_js");
        assert_eq!(first.no_js.data_file_name, "a_nojs");

        let malformed = pages[1].as_ref().unwrap_err();
        assert_eq!(malformed.url, "https://b.com/");
        assert!(malformed.reason.contains("line 5"));

        assert_eq!(pages[2].as_ref().unwrap_err().url, "https://c.com/");
    }
}
