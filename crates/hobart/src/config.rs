//! Study configuration.
//!
//! A study is described by a JSON file; only the two window dates are
//! required:
//!
//! ```json
//! {
//!   "training_start_date": "2017-01-02",
//!   "training_end_date": "2018-01-02",
//!   "return_variable_name": "log_return",
//!   "index_variable_name": "PI"
//! }
//! ```

use chrono::NaiveDate;
use hobart_data::{CharacteristicsConfig, ReturnKind, TransformConfig, WideTableConfig};
use hobart_model::{CovarianceKind, EstimationWindow, MarketModelConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors in the study configuration. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A date field is not `YYYY-MM-DD`
    #[error("Invalid {field}: {value:?} is not a YYYY-MM-DD date")]
    InvalidDate {
        /// Field name
        field: &'static str,
        /// Raw value
        value: String,
    },

    /// Window start is not before its end
    #[error("training_start_date {start} must be before training_end_date {end}")]
    EmptyWindow {
        /// Parsed start
        start: NaiveDate,
        /// Parsed end
        end: NaiveDate,
    },

    /// `return_variable_name` is not a known return column
    #[error("Unknown return variable {0:?}, expected \"simple_return\" or \"log_return\"")]
    UnknownReturnVariable(String),

    /// A label or separator is blank
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

/// Raw study configuration as read from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyConfig {
    /// Exclusive estimation start and global anchor date
    pub training_start_date: String,

    /// Exclusive estimation end; prediction starts here
    pub training_end_date: String,

    /// Transformed column used as the return (default: "simple_return")
    #[serde(default = "default_return_variable")]
    pub return_variable_name: String,

    /// Label of index price rows (default: "PI")
    #[serde(default = "default_price_label")]
    pub index_variable_name: String,

    /// Label of entity price rows (default: same as the index label)
    #[serde(default)]
    pub entity_variable_name: Option<String>,

    /// Separator between name and label (default: " - ")
    #[serde(default = "default_separator")]
    pub label_separator: String,

    /// Date header formats tried in order
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,

    /// Cell values read as missing
    #[serde(default = "default_na_values")]
    pub na_values: Vec<String>,

    /// Coefficient covariance estimator (default: "hc3")
    #[serde(default)]
    pub covariance: CovarianceKind,

    /// Minimum estimation observations (default: 2)
    #[serde(default = "default_min_observations")]
    pub min_observations: usize,

    /// Fan entities out over the rayon pool (default: true)
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Characteristics table column names
    #[serde(default)]
    pub characteristics: CharacteristicsConfig,
}

fn default_return_variable() -> String {
    ReturnKind::Simple.column().to_string()
}

fn default_price_label() -> String {
    TransformConfig::default().price_label
}

fn default_separator() -> String {
    TransformConfig::default().label_separator
}

fn default_date_formats() -> Vec<String> {
    WideTableConfig::default().date_formats
}

fn default_na_values() -> Vec<String> {
    WideTableConfig::default().na_values
}

const fn default_min_observations() -> usize {
    2
}

const fn default_parallel() -> bool {
    true
}

impl StudyConfig {
    /// Configuration with defaults for everything but the window.
    pub fn new(training_start_date: impl Into<String>, training_end_date: impl Into<String>) -> Self {
        Self {
            training_start_date: training_start_date.into(),
            training_end_date: training_end_date.into(),
            return_variable_name: default_return_variable(),
            index_variable_name: default_price_label(),
            entity_variable_name: None,
            label_separator: default_separator(),
            date_formats: default_date_formats(),
            na_values: default_na_values(),
            covariance: CovarianceKind::default(),
            min_observations: default_min_observations(),
            parallel: default_parallel(),
            characteristics: CharacteristicsConfig::default(),
        }
    }

    /// Parse from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Validate and convert into typed settings.
    pub fn validate(&self) -> Result<StudySettings, ConfigError> {
        let start = parse_iso("training_start_date", &self.training_start_date)?;
        let end = parse_iso("training_end_date", &self.training_end_date)?;
        let window =
            EstimationWindow::new(start, end).map_err(|_| ConfigError::EmptyWindow { start, end })?;

        let return_kind = ReturnKind::from_column(&self.return_variable_name)
            .ok_or_else(|| ConfigError::UnknownReturnVariable(self.return_variable_name.clone()))?;

        let index_label = non_blank("index_variable_name", &self.index_variable_name)?;
        let entity_label = match &self.entity_variable_name {
            Some(label) => non_blank("entity_variable_name", label)?,
            None => index_label.clone(),
        };
        if self.label_separator.is_empty() {
            return Err(ConfigError::EmptyField("label_separator"));
        }

        let transform = |label: String| TransformConfig {
            price_label: label,
            extra_labels: Vec::new(),
            label_separator: self.label_separator.clone(),
        };

        Ok(StudySettings {
            window,
            anchor: start,
            return_kind,
            entity_transform: transform(entity_label),
            index_transform: transform(index_label),
            table: WideTableConfig {
                date_formats: self.date_formats.clone(),
                na_values: self.na_values.clone(),
            },
            characteristics: self.characteristics.clone(),
            model: MarketModelConfig {
                covariance: self.covariance,
                min_observations: self.min_observations,
                ..Default::default()
            },
            parallel: self.parallel,
        })
    }
}

/// Validated, typed study settings.
#[derive(Debug, Clone)]
pub struct StudySettings {
    /// Estimation window
    pub window: EstimationWindow,
    /// Date excluded from every series
    pub anchor: NaiveDate,
    /// Which return column is used
    pub return_kind: ReturnKind,
    /// Entity panel transformation
    pub entity_transform: TransformConfig,
    /// Index panel transformation
    pub index_transform: TransformConfig,
    /// Wide-table parsing
    pub table: WideTableConfig,
    /// Characteristics table columns
    pub characteristics: CharacteristicsConfig,
    /// Estimator configuration
    pub model: MarketModelConfig,
    /// Run entities in parallel
    pub parallel: bool,
}

fn parse_iso(field: &'static str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

fn non_blank(field: &'static str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::EmptyField(field));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_minimal_config_defaults() {
        let config = StudyConfig::from_json_str(
            r#"{"training_start_date": "2017-01-02", "training_end_date": "2017-06-30"}"#,
        )
        .unwrap();
        assert_eq!(config, StudyConfig::new("2017-01-02", "2017-06-30"));

        let settings = config.validate().unwrap();
        assert_eq!(settings.return_kind, ReturnKind::Simple);
        assert_eq!(settings.anchor, NaiveDate::from_ymd_opt(2017, 1, 2).unwrap());
        assert_eq!(settings.entity_transform.price_label, "PI");
        assert_eq!(settings.index_transform.price_label, "PI");
        assert_eq!(settings.model.covariance, CovarianceKind::Hc3);
        assert!(settings.parallel);
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "training_start_date": "2017-01-02",
            "training_end_date": "2017-06-30",
            "return_variable_name": "log_return",
            "index_variable_name": "PI",
            "entity_variable_name": "RI",
            "label_separator": " | ",
            "covariance": "hc1",
            "parallel": false,
            "characteristics": {"name_column": "Company", "country_column": "ISO", "exchange_column": "Bourse"}
        }"#;
        let settings = StudyConfig::from_json_str(json).unwrap().validate().unwrap();
        assert_eq!(settings.return_kind, ReturnKind::Log);
        assert_eq!(settings.entity_transform.price_label, "RI");
        assert_eq!(settings.entity_transform.label_separator, " | ");
        assert_eq!(settings.model.covariance, CovarianceKind::Hc1);
        assert_eq!(settings.characteristics.country_column, "ISO");
        assert!(!settings.parallel);
    }

    #[test]
    fn test_missing_dates_rejected() {
        assert!(matches!(
            StudyConfig::from_json_str(r#"{"training_start_date": "2017-01-02"}"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[rstest]
    #[case("2017-13-01", "2017-06-30")]
    #[case("02/01/2017", "2017-06-30")]
    #[case("2017-01-02", "")]
    fn test_invalid_dates(#[case] start: &str, #[case] end: &str) {
        assert!(matches!(
            StudyConfig::new(start, end).validate(),
            Err(ConfigError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_reversed_window() {
        assert!(matches!(
            StudyConfig::new("2017-06-30", "2017-01-02").validate(),
            Err(ConfigError::EmptyWindow { .. })
        ));
    }

    #[test]
    fn test_unknown_return_variable() {
        let mut config = StudyConfig::new("2017-01-02", "2017-06-30");
        config.return_variable_name = "excess_return".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownReturnVariable(_))
        ));
    }

    #[test]
    fn test_blank_label() {
        let mut config = StudyConfig::new("2017-01-02", "2017-06-30");
        config.index_variable_name = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyField(_))));
    }
}
