//! Coefficient covariance estimation
//!
//! Heteroskedasticity-consistent ("sandwich") estimators for the OLS
//! coefficient covariance. Event-study residuals are rarely homoskedastic,
//! so HC3 is the default.

pub mod hc;
pub mod utils;

pub use hc::{Classical, Hc0, Hc1, Hc3};
pub use utils::{design_matrix, leverages, sandwich, xtx_inverse};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trait for OLS coefficient covariance estimators
pub trait RobustCovariance {
    /// Which estimator this is
    fn kind(&self) -> CovarianceKind;

    /// Estimate the `k x k` coefficient covariance
    ///
    /// # Arguments
    /// * `x` - `n x k` design matrix, intercept column included
    /// * `residuals` - OLS residuals, length `n`
    /// * `xtx_inv` - `(X'X)^-1`
    ///
    /// Undefined estimates are returned as NaN-filled matrices.
    fn estimate(
        &self,
        x: &Array2<f64>,
        residuals: &Array1<f64>,
        xtx_inv: &Array2<f64>,
    ) -> Array2<f64>;
}

/// Selectable covariance estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CovarianceKind {
    /// White (1980)
    Hc0,
    /// HC0 scaled by `n / (n - k)`
    Hc1,
    /// Leverage-adjusted, MacKinnon & White (1985)
    #[default]
    Hc3,
    /// Homoskedastic `s² (X'X)^-1`
    Classical,
}

impl CovarianceKind {
    /// Configuration name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hc0 => "hc0",
            Self::Hc1 => "hc1",
            Self::Hc3 => "hc3",
            Self::Classical => "classical",
        }
    }
}

impl fmt::Display for CovarianceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RobustCovariance for CovarianceKind {
    fn kind(&self) -> CovarianceKind {
        *self
    }

    fn estimate(
        &self,
        x: &Array2<f64>,
        residuals: &Array1<f64>,
        xtx_inv: &Array2<f64>,
    ) -> Array2<f64> {
        match self {
            Self::Hc0 => Hc0.estimate(x, residuals, xtx_inv),
            Self::Hc1 => Hc1.estimate(x, residuals, xtx_inv),
            Self::Hc3 => Hc3::default().estimate(x, residuals, xtx_inv),
            Self::Classical => Classical.estimate(x, residuals, xtx_inv),
        }
    }
}

/// A `k x k` matrix of NaN.
pub(crate) fn undefined(k: usize) -> Array2<f64> {
    Array2::from_elem((k, k), f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(CovarianceKind::default(), CovarianceKind::Hc3);
        assert_eq!(CovarianceKind::Classical.to_string(), "classical");
        assert_eq!(CovarianceKind::Hc1.kind(), CovarianceKind::Hc1);
    }
}
