//! HC0, HC1, HC3 and classical OLS covariance estimators.
//!
//! ```text
//! HC0 = (X'X)^-1 X' diag(e_i²) X (X'X)^-1
//! HC1 = n / (n - k) · HC0
//! HC3 = (X'X)^-1 X' diag(e_i² / (1 - h_ii)²) X (X'X)^-1
//! OLS = s² (X'X)^-1,   s² = Σ e_i² / (n - k)
//! ```
//!
//! # References
//! - White, H. (1980). "A Heteroskedasticity-Consistent Covariance Matrix
//!   Estimator and a Direct Test for Heteroskedasticity." Econometrica, 48(4).
//! - MacKinnon, J. G., & White, H. (1985). "Some heteroskedasticity-consistent
//!   covariance matrix estimators with improved finite sample properties."
//!   Journal of Econometrics, 29(3).

use super::utils::{leverages, sandwich};
use super::{CovarianceKind, RobustCovariance, undefined};
use ndarray::{Array1, Array2};

/// White's heteroskedasticity-consistent estimator
#[derive(Debug, Clone, Copy, Default)]
pub struct Hc0;

impl RobustCovariance for Hc0 {
    fn kind(&self) -> CovarianceKind {
        CovarianceKind::Hc0
    }

    fn estimate(
        &self,
        x: &Array2<f64>,
        residuals: &Array1<f64>,
        xtx_inv: &Array2<f64>,
    ) -> Array2<f64> {
        let weights = residuals.mapv(|e| e * e);
        sandwich(x, xtx_inv, &weights)
    }
}

/// HC0 with a degrees-of-freedom correction
#[derive(Debug, Clone, Copy, Default)]
pub struct Hc1;

impl RobustCovariance for Hc1 {
    fn kind(&self) -> CovarianceKind {
        CovarianceKind::Hc1
    }

    fn estimate(
        &self,
        x: &Array2<f64>,
        residuals: &Array1<f64>,
        xtx_inv: &Array2<f64>,
    ) -> Array2<f64> {
        let (n, k) = x.dim();
        if n <= k {
            return undefined(k);
        }
        Hc0.estimate(x, residuals, xtx_inv) * (n as f64 / (n - k) as f64)
    }
}

/// Leverage-adjusted estimator
#[derive(Debug, Clone, Copy)]
pub struct Hc3 {
    /// `1 - h_ii` at or below this makes the estimate undefined (default: 1e-10)
    pub leverage_tolerance: f64,
}

impl Default for Hc3 {
    fn default() -> Self {
        Self {
            leverage_tolerance: 1e-10,
        }
    }
}

impl RobustCovariance for Hc3 {
    fn kind(&self) -> CovarianceKind {
        CovarianceKind::Hc3
    }

    fn estimate(
        &self,
        x: &Array2<f64>,
        residuals: &Array1<f64>,
        xtx_inv: &Array2<f64>,
    ) -> Array2<f64> {
        let (_, k) = x.dim();
        let h = leverages(x, xtx_inv);

        let mut weights = Array1::<f64>::zeros(residuals.len());
        for (i, (&e, &h_ii)) in residuals.iter().zip(h.iter()).enumerate() {
            let one_minus_h = 1.0 - h_ii;
            // Exactly-determined observation: the HC3 weight is 0 / 0
            if one_minus_h <= self.leverage_tolerance {
                return undefined(k);
            }
            weights[i] = e * e / (one_minus_h * one_minus_h);
        }

        sandwich(x, xtx_inv, &weights)
    }
}

/// Homoskedastic OLS covariance
#[derive(Debug, Clone, Copy, Default)]
pub struct Classical;

impl RobustCovariance for Classical {
    fn kind(&self) -> CovarianceKind {
        CovarianceKind::Classical
    }

    fn estimate(
        &self,
        x: &Array2<f64>,
        residuals: &Array1<f64>,
        xtx_inv: &Array2<f64>,
    ) -> Array2<f64> {
        let (n, k) = x.dim();
        if n <= k {
            return undefined(k);
        }
        let s2 = residuals.mapv(|e| e * e).sum() / (n - k) as f64;
        xtx_inv * s2
    }
}
