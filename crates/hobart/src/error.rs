//! Top-level error type.

use crate::config::ConfigError;
use hobart_data::DataError;
use hobart_market::MarketError;
use hobart_model::ModelError;
use hobart_output::ExportError;
use thiserror::Error;

/// Result type for study runs
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors that abort a study run.
///
/// Per-entity failures never surface here; they become skip records.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid study configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Unreadable or malformed input panel
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Unreadable or inconsistent market map
    #[error("Market map error: {0}")]
    Market(#[from] MarketError),

    /// Model setup error
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Output could not be written
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}
