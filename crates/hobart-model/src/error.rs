//! Error types and the per-entity skip taxonomy.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while windowing or fitting a single entity
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// A return inside the estimation window is missing
    #[error("Missing {series} return on {date} inside the estimation window")]
    InsufficientEstimationData {
        /// Entity or index series with the gap
        series: String,
        /// Date of the first missing value
        date: NaiveDate,
    },

    /// The regression is undefined for this data
    #[error("Regression failed: {0}")]
    RegressionFailure(String),

    /// Entity and index cannot be aligned by date
    #[error("Index {index} has no observation on {date}")]
    DateAlignmentMismatch {
        /// Index series name
        index: String,
        /// Entity date absent from the index
        date: NaiveDate,
    },

    /// The estimation window is empty or reversed
    #[error("Invalid estimation window: start {start} must be before end {end}")]
    InvalidWindow {
        /// Exclusive start
        start: NaiveDate,
        /// Exclusive end
        end: NaiveDate,
    },
}

impl ModelError {
    /// Skip reason for per-entity errors, `None` for configuration errors.
    pub const fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::InsufficientEstimationData { .. } => Some(SkipReason::InsufficientEstimationData),
            Self::RegressionFailure(_) => Some(SkipReason::RegressionFailure),
            Self::DateAlignmentMismatch { .. } => Some(SkipReason::DateAlignmentMismatch),
            Self::InvalidWindow { .. } => None,
        }
    }
}

/// Why an entity produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkipReason {
    /// Neither country nor exchange resolves to a usable index in the index panel
    MissingIndexMapping,
    /// Missing return values inside the estimation window
    InsufficientEstimationData,
    /// Degenerate estimation data
    RegressionFailure,
    /// Entity and index date axes cannot be reconciled
    DateAlignmentMismatch,
}

impl SkipReason {
    /// All reasons, in reporting order.
    pub const ALL: [Self; 4] = [
        Self::MissingIndexMapping,
        Self::InsufficientEstimationData,
        Self::RegressionFailure,
        Self::DateAlignmentMismatch,
    ];

    /// Reason name as written to the skip log.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingIndexMapping => "MissingIndexMapping",
            Self::InsufficientEstimationData => "InsufficientEstimationData",
            Self::RegressionFailure => "RegressionFailure",
            Self::DateAlignmentMismatch => "DateAlignmentMismatch",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
