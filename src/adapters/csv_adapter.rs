//! CSV file bar adapter.
//!
//! Expects a header row and the columns `time,open,high,low,close,volume`.
//! The volume column may be missing or empty.

use crate::domain::error::SwingtraderError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;

const TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// `source` is resolved against the base path. A file that exists under
    /// that exact name is read as is; otherwise `.csv` is added when the
    /// name has no extension.
    fn csv_path(&self, source: &str) -> PathBuf {
        let path = self.base_path.join(source);
        if path.extension().is_none() && !path.is_file() {
            path.with_extension("csv")
        } else {
            path
        }
    }
}

fn data_error(reason: String) -> SwingtraderError {
    SwingtraderError::Data { reason }
}

pub fn parse_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn price_field(
    record: &StringRecord,
    idx: usize,
    name: &str,
    line: u64,
) -> Result<f64, SwingtraderError> {
    record
        .get(idx)
        .ok_or_else(|| data_error(format!("line {line}: missing {name} column")))?
        .trim()
        .parse()
        .map_err(|e| data_error(format!("line {line}: invalid {name} value: {e}")))
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, source: &str) -> Result<Vec<Bar>, SwingtraderError> {
        let path = self.csv_path(source);
        let content = fs::read_to_string(&path)
            .map_err(|e| data_error(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| data_error(format!("CSV parse error: {e}")))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let time_str = record
                .get(0)
                .ok_or_else(|| data_error(format!("line {line}: missing time column")))?;
            let time = parse_time(time_str)
                .ok_or_else(|| data_error(format!("line {line}: invalid time '{time_str}'")))?;

            let volume = match record.get(5) {
                Some(v) if !v.is_empty() => v
                    .parse()
                    .map_err(|e| data_error(format!("line {line}: invalid volume value: {e}")))?,
                _ => 0.0,
            };

            bars.push(Bar {
                time,
                open: price_field(&record, 1, "open", line)?,
                high: price_field(&record, 2, "high", line)?,
                low: price_field(&record, 3, "low", line)?,
                close: price_field(&record, 4, "close", line)?,
                volume,
            });
        }

        bars.sort_by_key(|b| b.time);
        Ok(bars)
    }
}
