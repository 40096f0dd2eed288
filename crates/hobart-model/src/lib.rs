#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod covariance;
pub mod error;
pub mod estimator;
pub mod projector;
pub mod types;
pub mod window;

// Re-export main types
pub use covariance::{CovarianceKind, RobustCovariance};
pub use error::{ModelError, Result, SkipReason};
pub use estimator::{MarketModel, MarketModelConfig};
pub use projector::{cumulative_abnormal_return, project};
pub use types::{AbnormalReturnRecord, EstimationWindow, RegressionFit, SkipRecord};
pub use window::{EstimationSlice, PredictionSlice, WindowSelector, WindowSlices};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
