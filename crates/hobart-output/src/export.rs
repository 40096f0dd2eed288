//! Export functionality for Hobart study results.
//!
//! This module provides CSV and JSON export for abnormal returns, fitted
//! market models and the skip log.

use chrono::NaiveDate;
use hobart_model::{AbnormalReturnRecord, RegressionFit, SkipRecord, cumulative_abnormal_return};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialized CSV was not valid UTF-8.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Comma-separated values format.
    #[default]
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" | "prettyjson" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// A record type with a fixed CSV header.
///
/// `HEADERS` must list the serialized fields in declaration order.
pub trait CsvRow: Serialize {
    /// Column names.
    const HEADERS: &'static [&'static str];
}

impl CsvRow for AbnormalReturnRecord {
    const HEADERS: &'static [&'static str] = &[
        "entity_id",
        "date",
        "actual_return",
        "predicted_normal_return",
        "abnormal_return",
    ];
}

impl CsvRow for SkipRecord {
    const HEADERS: &'static [&'static str] =
        &["entity_id", "reason", "window_start", "window_end", "detail"];
}

/// Flat, export-friendly view of a fitted market model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FitExport {
    /// Entity name.
    pub entity_id: String,

    /// Reference index.
    pub index_name: String,

    /// Intercept (α).
    pub intercept: f64,

    /// Slope (β).
    pub slope: f64,

    /// Standard error of α.
    pub se_intercept: f64,

    /// Standard error of β.
    pub se_slope: f64,

    /// t-statistic of α.
    pub t_intercept: f64,

    /// t-statistic of β.
    pub t_slope: f64,

    /// Coefficient of determination.
    pub r_squared: f64,

    /// Observations in the estimation window.
    pub n_observations: usize,

    /// Covariance estimator name.
    pub covariance: String,
}

impl From<&RegressionFit> for FitExport {
    fn from(fit: &RegressionFit) -> Self {
        let (se_intercept, se_slope) = fit.std_errors();
        let (t_intercept, t_slope) = fit.t_stats();
        Self {
            entity_id: fit.entity_id.clone(),
            index_name: fit.index_name.clone(),
            intercept: fit.intercept,
            slope: fit.slope,
            se_intercept,
            se_slope,
            t_intercept,
            t_slope,
            r_squared: fit.r_squared,
            n_observations: fit.n_observations,
            covariance: fit.covariance_kind.to_string(),
        }
    }
}

impl CsvRow for FitExport {
    const HEADERS: &'static [&'static str] = &[
        "entity_id",
        "index_name",
        "intercept",
        "slope",
        "se_intercept",
        "se_slope",
        "t_intercept",
        "t_slope",
        "r_squared",
        "n_observations",
        "covariance",
    ];
}

/// Cumulative abnormal return over one entity's prediction window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CumulativeAbnormalReturn {
    /// Entity name.
    pub entity_id: String,

    /// First prediction date.
    pub first_date: NaiveDate,

    /// Last prediction date.
    pub last_date: NaiveDate,

    /// Rows with a non-missing abnormal return.
    pub n_observations: usize,

    /// Sum of non-missing abnormal returns.
    pub car: f64,
}

impl CsvRow for CumulativeAbnormalReturn {
    const HEADERS: &'static [&'static str] =
        &["entity_id", "first_date", "last_date", "n_observations", "car"];
}

/// Trait for exporting data to various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl<T: CsvRow> Exporter for [T] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::WriterBuilder::new()
                    .has_headers(false)
                    .from_writer(vec![]);
                wtr.write_record(T::HEADERS)?;
                for record in self {
                    wtr.serialize(record)?;
                }
                let data = String::from_utf8(wtr.into_inner().map_err(|e| e.into_error())?)?;
                Ok(data)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl<T: CsvRow> Exporter for Vec<T> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        self.as_slice().export_to_string(format)
    }
}

/// Per-entity cumulative abnormal returns, in first-appearance order.
///
/// Records of one entity are expected to be contiguous, as the batch driver
/// emits them.
pub fn cumulative_by_entity(records: &[AbnormalReturnRecord]) -> Vec<CumulativeAbnormalReturn> {
    records
        .chunk_by(|a, b| a.entity_id == b.entity_id)
        .filter_map(|group| {
            let first = group.first()?;
            Some(CumulativeAbnormalReturn {
                entity_id: first.entity_id.clone(),
                first_date: group.iter().map(|r| r.date).min()?,
                last_date: group.iter().map(|r| r.date).max()?,
                n_observations: group.iter().filter(|r| r.abnormal_return.is_some()).count(),
                car: cumulative_abnormal_return(group),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hobart_model::{CovarianceKind, SkipReason};
    use rstest::rstest;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn records() -> Vec<AbnormalReturnRecord> {
        vec![
            AbnormalReturnRecord {
                entity_id: "ACME".to_string(),
                date: date(4),
                actual_return: Some(0.05),
                predicted_normal_return: Some(0.04),
                abnormal_return: Some(0.01),
            },
            AbnormalReturnRecord {
                entity_id: "ACME".to_string(),
                date: date(5),
                actual_return: None,
                predicted_normal_return: Some(0.02),
                abnormal_return: None,
            },
        ]
    }

    #[rstest]
    #[case("csv", ExportFormat::Csv)]
    #[case("JSON", ExportFormat::Json)]
    #[case("pretty-json", ExportFormat::PrettyJson)]
    fn test_format_from_str(#[case] input: &str, #[case] expected: ExportFormat) {
        assert_eq!(input.parse::<ExportFormat>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_format() {
        assert!(matches!(
            "xlsx".parse::<ExportFormat>(),
            Err(ExportError::InvalidFormat(_))
        ));
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }

    #[test]
    fn test_abnormal_returns_csv() {
        let csv = records().export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "entity_id,date,actual_return,predicted_normal_return,abnormal_return"
        );
        assert_eq!(lines[1], "ACME,2024-01-04,0.05,0.04,0.01");
        assert_eq!(lines[2], "ACME,2024-01-05,,0.02,");
    }

    #[test]
    fn test_empty_csv_has_header() {
        let empty: Vec<SkipRecord> = Vec::new();
        let csv = empty.export_to_string(ExportFormat::Csv).unwrap();
        assert_eq!(csv, "entity_id,reason,window_start,window_end,detail\n");
    }

    #[test]
    fn test_skip_log_csv() {
        let skips = vec![SkipRecord {
            entity_id: "BETA".to_string(),
            reason: SkipReason::MissingIndexMapping,
            window_start: date(1),
            window_end: date(4),
            detail: "country \"VE\" has no usable index".to_string(),
        }];
        let csv = skips.export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.contains("BETA,MissingIndexMapping,2024-01-01,2024-01-04,"));
    }

    #[test]
    fn test_json_nulls() {
        let json = records().export_to_string(ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value[1]["actual_return"].is_null());
        assert_eq!(value[0]["date"], "2024-01-04");
    }

    #[test]
    fn test_fit_export() {
        let fit = RegressionFit {
            entity_id: "ACME".to_string(),
            index_name: "X".to_string(),
            intercept: 0.5,
            slope: 2.0,
            covariance_matrix: [[0.04, 0.0], [0.0, 0.25]],
            covariance_kind: CovarianceKind::Hc3,
            n_observations: 10,
            r_squared: 0.9,
            residual_variance: 0.01,
        };
        let row = FitExport::from(&fit);
        assert_eq!(row.t_slope, 4.0);
        assert_eq!(row.covariance, "hc3");

        let csv = vec![row].export_to_string(ExportFormat::Csv).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.lines().next().unwrap().ends_with("n_observations,covariance"));
    }

    #[test]
    fn test_cumulative_by_entity() {
        let mut rows = records();
        rows.push(AbnormalReturnRecord {
            entity_id: "BETA".to_string(),
            date: date(4),
            actual_return: Some(0.0),
            predicted_normal_return: Some(0.03),
            abnormal_return: Some(-0.03),
        });
        let cars = cumulative_by_entity(&rows);
        assert_eq!(cars.len(), 2);
        assert_eq!(cars[0].entity_id, "ACME");
        assert_eq!(cars[0].n_observations, 1);
        assert_eq!(cars[0].last_date, date(5));
        assert_eq!(cars[1].car, -0.03);
    }

    #[test]
    fn test_cumulative_skips_missing_abnormal_returns() {
        let mut rows = records();
        for row in &mut rows {
            row.abnormal_return = None;
        }
        let cars = cumulative_by_entity(&rows);
        assert_eq!(cars.len(), 1);
        assert_eq!(cars[0].n_observations, 0);
        assert_eq!(cars[0].car, 0.0);
        assert_eq!(cars[0].first_date, date(4));
        assert!(cumulative_by_entity(&[]).is_empty());
    }
}
