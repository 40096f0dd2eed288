//! Error types for market map loading and index resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for market map operations
pub type Result<T> = std::result::Result<T, MarketError>;

/// Fatal errors raised while loading a market map
#[derive(Debug, Error)]
pub enum MarketError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parse error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Both sentinels carry the same string
    #[error("Sentinels must differ, both are {0:?}")]
    IdenticalSentinels(String),

    /// A sentinel is empty after trimming
    #[error("Sentinel '{0}' must not be empty")]
    EmptySentinel(&'static str),

    /// Mapping table file is malformed
    #[error("Invalid mapping table {path}: {message}")]
    InvalidTable {
        /// Offending file
        path: PathBuf,
        /// What is wrong with it
        message: String,
    },
}

/// Why an entity could not be mapped to a usable index.
///
/// These are per-entity outcomes, never fatal to a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The entity carries no country code
    #[error("entity has no country of domicile")]
    MissingCountry,

    /// The country is not a key of the country table
    #[error("country {0:?} is not in the country table")]
    UnknownCountry(String),

    /// The country maps to the unusable sentinel
    #[error("country {0:?} has no usable index")]
    CountryUnusable(String),

    /// Exchange fallback was needed but the entity carries no exchange
    #[error("country {country:?} needs an exchange fallback but the entity has no exchange")]
    MissingExchange {
        /// Country that requested the fallback
        country: String,
    },

    /// The exchange is not a key of the exchange table
    #[error("exchange {0:?} is not in the exchange table")]
    UnknownExchange(String),

    /// The exchange maps to a sentinel
    #[error("exchange {0:?} has no usable index")]
    ExchangeUnusable(String),
}
