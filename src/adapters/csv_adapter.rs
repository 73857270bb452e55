//! CSV file bar adapter.
//!
//! One file per symbol, `<base>/<symbol>.csv`, with a header row and columns
//! `datetime,open,high,low,close,volume`. Rows are returned in file order;
//! the core rejects files that are not strictly chronological.

use crate::domain::error::CoreError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    /// Read bars from a single CSV file.
    pub fn read_file(path: &Path) -> Result<Vec<Bar>, CoreError> {
        let content = fs::read_to_string(path).map_err(|e| CoreError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        parse_bars(&content)
    }
}

pub fn parse_bars(content: &str) -> Result<Vec<Bar>, CoreError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut bars = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| CoreError::Data {
            reason: format!("CSV parse error: {}", e),
        })?;

        let field = |index: usize, name: &str| -> Result<&str, CoreError> {
            record.get(index).ok_or_else(|| CoreError::Data {
                reason: format!("row {}: missing {} column", row + 1, name),
            })
        };
        let number = |index: usize, name: &str| -> Result<f64, CoreError> {
            field(index, name)?
                .trim()
                .parse::<f64>()
                .map_err(|e| CoreError::Data {
                    reason: format!("row {}: invalid {} value: {}", row + 1, name, e),
                })
        };

        let timestamp = parse_timestamp(field(0, "datetime")?).ok_or_else(|| CoreError::Data {
            reason: format!("row {}: invalid datetime format", row + 1),
        })?;

        let bar = Bar {
            timestamp,
            open: number(1, "open")?,
            high: number(2, "high")?,
            low: number(3, "low")?,
            close: number(4, "close")?,
            volume: number(5, "volume")?,
        };
        bar.check().map_err(|e| CoreError::Data {
            reason: format!("row {}: {}", row + 1, e),
        })?;
        bars.push(bar);
    }

    Ok(bars)
}

/// Accepts full timestamps or bare dates (taken as midnight).
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, CoreError> {
        Self::read_file(&self.csv_path(symbol))
    }

    fn list_symbols(&self) -> Result<Vec<String>, CoreError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| CoreError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        symbols.sort();
        Ok(symbols)
    }
}
