//! Wide price tables.
//!
//! Input panels arrive as one row per series and one column per date:
//!
//! ```text
//! Name,2017-01-02,2017-01-03,...
//! ACME CORP - PI,100.0,101.5,...
//! ACME CORP - MV,5120.3,5198.0,...
//! ```
//!
//! The first column is the series name carrying a variable label suffix;
//! every other header cell is a date.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Configuration for reading wide tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WideTableConfig {
    /// `chrono` formats tried in order for each date header (first match wins)
    pub date_formats: Vec<String>,
    /// Cell contents treated as missing (compared after trimming)
    pub na_values: Vec<String>,
}

impl Default for WideTableConfig {
    fn default() -> Self {
        Self {
            date_formats: vec![
                "%Y-%m-%d".to_string(),
                "%d/%m/%Y".to_string(),
                "%m/%d/%Y".to_string(),
                "%d.%m.%Y".to_string(),
            ],
            na_values: vec![
                String::new(),
                "NA".to_string(),
                "N/A".to_string(),
                "#N/A".to_string(),
                "NaN".to_string(),
                "NULL".to_string(),
            ],
        }
    }
}

/// A single row of a wide table.
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    /// Raw series name, label suffix included
    pub series: String,
    /// One value per date column; `None` when missing or unparseable
    pub values: Vec<Option<f64>>,
}

/// A wide time-series table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    /// Date axis, in header order
    pub dates: Vec<NaiveDate>,
    /// Series rows; each has `dates.len()` values
    pub rows: Vec<WideRow>,
}

impl WideTable {
    /// Read a wide table from a CSV file.
    pub fn from_path(path: &Path, config: &WideTableConfig) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, config, &path.display().to_string())
    }

    /// Read a wide table from any CSV reader.
    ///
    /// `source` names the input in error messages.
    pub fn from_reader<R: Read>(reader: R, config: &WideTableConfig, source: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        if headers.len() < 2 {
            return Err(DataError::MissingColumn {
                column: "<date columns>".to_string(),
                table: source.to_string(),
            });
        }

        let mut seen = HashSet::new();
        let mut dates = Vec::with_capacity(headers.len() - 1);
        for raw in headers.iter().skip(1) {
            let date = parse_date(raw, &config.date_formats)?;
            if !seen.insert(date) {
                return Err(DataError::DuplicateDate(date));
            }
            dates.push(date);
        }

        let mut rows = Vec::new();
        let mut unparseable = 0usize;
        for record in rdr.records() {
            let record = record?;
            let series = record.get(0).unwrap_or_default().to_string();
            if series.is_empty() {
                continue;
            }
            let values = record
                .iter()
                .skip(1)
                .map(|cell| {
                    let value = parse_value(cell, &config.na_values);
                    if value.is_none() && !is_na(cell, &config.na_values) {
                        unparseable += 1;
                    }
                    value
                })
                .collect();
            rows.push(WideRow { series, values });
        }

        if unparseable > 0 {
            debug!(source, unparseable, "non-numeric cells treated as missing");
        }

        Ok(Self { dates, rows })
    }

    /// Number of series rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no series rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse a date with the first matching format.
pub fn parse_date(raw: &str, formats: &[String]) -> Result<NaiveDate> {
    let raw = raw.trim();
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| DataError::InvalidDate {
            value: raw.to_string(),
            formats: formats.to_vec(),
        })
}

fn is_na(cell: &str, na_values: &[String]) -> bool {
    let cell = cell.trim();
    na_values.iter().any(|na| na == cell)
}

fn parse_value(cell: &str, na_values: &[String]) -> Option<f64> {
    if is_na(cell, na_values) {
        return None;
    }
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
Name,2017-01-02,2017-01-03,2017-01-04
ACME CORP - PI,100.0,101.0,NA
ACME CORP - MV,10,11,12
$$ER: E100 - PI,$$ER: 9898,,
";

    fn load(input: &str) -> Result<WideTable> {
        WideTable::from_reader(input.as_bytes(), &WideTableConfig::default(), "test")
    }

    #[test]
    fn test_reads_dates_and_rows() {
        let table = load(TABLE).unwrap();
        assert_eq!(table.dates.len(), 3);
        assert_eq!(
            table.dates[0],
            NaiveDate::from_ymd_opt(2017, 1, 2).unwrap()
        );
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0].series, "ACME CORP - PI");
        assert_eq!(table.rows[0].values, vec![Some(100.0), Some(101.0), None]);
    }

    #[test]
    fn test_error_cells_become_missing() {
        let table = load(TABLE).unwrap();
        assert_eq!(table.rows[2].values, vec![None, None, None]);
    }

    #[test]
    fn test_alternative_date_format() {
        let input = "Name,02/01/2017,03/01/2017\nX - PI,1,2\n";
        let table = load(input).unwrap();
        assert_eq!(
            table.dates,
            vec![
                NaiveDate::from_ymd_opt(2017, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2017, 1, 3).unwrap(),
            ]
        );
    }

    #[test]
    fn test_invalid_date_header_is_fatal() {
        let input = "Name,not-a-date\nX - PI,1\n";
        assert!(matches!(load(input), Err(DataError::InvalidDate { .. })));
    }

    #[test]
    fn test_duplicate_date_header_is_fatal() {
        let input = "Name,2017-01-02,2017-01-02\nX - PI,1,2\n";
        assert!(matches!(load(input), Err(DataError::DuplicateDate(_))));
    }

    #[test]
    fn test_table_without_dates_is_fatal() {
        let input = "Name\nX - PI\n";
        assert!(matches!(load(input), Err(DataError::MissingColumn { .. })));
    }

    #[test]
    fn test_parse_value_rejects_non_finite() {
        let na = WideTableConfig::default().na_values;
        assert_eq!(parse_value("inf", &na), None);
        assert_eq!(parse_value(" 2.5 ", &na), Some(2.5));
        assert_eq!(parse_value("#N/A", &na), None);
    }
}
