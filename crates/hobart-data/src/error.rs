//! Error types for data operations.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading or reshaping input panels.
///
/// Every variant is fatal to a run: they describe malformed inputs rather
/// than problems with a single entity.
#[derive(Debug, Error)]
pub enum DataError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// A required column is absent from an input table
    #[error("Missing column '{column}' in {table}")]
    MissingColumn {
        /// Name of the absent column
        column: String,
        /// Table that was being read
        table: String,
    },

    /// A date header could not be parsed with any configured format
    #[error("Invalid date '{value}': expected one of {formats:?}")]
    InvalidDate {
        /// Raw header cell
        value: String,
        /// Formats that were tried
        formats: Vec<String>,
    },

    /// The same date appears twice in a wide table header
    #[error("Duplicate date column: {0}")]
    DuplicateDate(NaiveDate),

    /// The same (name, label) series appears twice in a wide table
    #[error("Duplicate series '{name}' with label '{label}'")]
    DuplicateSeries {
        /// Bare series name
        name: String,
        /// Variable label
        label: String,
    },

    /// A table contained no usable rows
    #[error("Empty table: {0}")]
    EmptyTable(String),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),
}
