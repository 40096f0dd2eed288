//! Market-model estimation
//!
//! Fits the single-index market model by OLS with an explicit intercept:
//! ```text
//! r_firm(t) = α + β · r_index(t) + ε(t)
//! ```
//! Coefficient covariance comes from a [`RobustCovariance`] estimator
//! (HC3 unless configured otherwise).

use crate::covariance::{CovarianceKind, RobustCovariance, design_matrix, xtx_inverse};
use crate::error::{ModelError, Result};
use crate::types::RegressionFit;
use crate::window::EstimationSlice;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of free parameters (α, β).
const N_PARAMS: usize = 2;

/// Market-model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketModelConfig {
    /// Covariance estimator (default: HC3)
    pub covariance: CovarianceKind,

    /// Minimum observations; never below the 2 free parameters (default: 2)
    pub min_observations: usize,

    /// Index return variance at or below this multiple of the squared index
    /// mean is treated as constant (default: 1e-20)
    pub variance_tolerance: f64,
}

impl Default for MarketModelConfig {
    fn default() -> Self {
        Self {
            covariance: CovarianceKind::Hc3,
            min_observations: N_PARAMS,
            variance_tolerance: 1e-20,
        }
    }
}

/// OLS market-model estimator
#[derive(Debug, Default)]
pub struct MarketModel {
    config: MarketModelConfig,
}

impl MarketModel {
    /// Create an estimator with the given configuration
    pub const fn new(config: MarketModelConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub const fn config(&self) -> &MarketModelConfig {
        &self.config
    }

    /// Fit `firm = α + β·index` over an estimation slice.
    ///
    /// # Errors
    /// `RegressionFailure` when there are fewer observations than required,
    /// a non-finite input, or a constant index column.
    ///
    /// Coefficients come from centred moments, `β = Sxy / Sxx` and
    /// `α = ȳ - β·x̄`, so the result does not depend on the scale of the returns.
    pub fn fit(&self, entity_id: &str, slice: &EstimationSlice) -> Result<RegressionFit> {
        let n = slice.firm.len();
        if slice.index.len() != n {
            return Err(ModelError::RegressionFailure(format!(
                "{} firm returns but {} index returns",
                n,
                slice.index.len()
            )));
        }

        let required = self.config.min_observations.max(N_PARAMS);
        if n < required {
            return Err(ModelError::RegressionFailure(format!(
                "need at least {} observations, got {}",
                required, n
            )));
        }

        if slice
            .firm
            .iter()
            .chain(slice.index.iter())
            .any(|v| !v.is_finite())
        {
            return Err(ModelError::RegressionFailure(
                "non-finite return in estimation window".to_string(),
            ));
        }

        let nf = n as f64;
        let mean_x = slice.index.iter().sum::<f64>() / nf;
        let mean_y = slice.firm.iter().sum::<f64>() / nf;
        let (sxx, sxy, syy) = slice.index.iter().zip(&slice.firm).fold(
            (0.0, 0.0, 0.0),
            |(sxx, sxy, syy), (&x, &y)| {
                let (dx, dy) = (x - mean_x, y - mean_y);
                (sxx + dx * dx, sxy + dx * dy, syy + dy * dy)
            },
        );

        let var_x = sxx / nf;
        if var_x <= self.config.variance_tolerance * mean_x * mean_x {
            return Err(ModelError::RegressionFailure(format!(
                "index {} has zero variance over the estimation window",
                slice.index_name
            )));
        }

        let xtx_inv = xtx_inverse(n, mean_x, sxx).ok_or_else(|| {
            ModelError::RegressionFailure(format!(
                "index {} has a degenerate estimation column",
                slice.index_name
            ))
        })?;
        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        if !(slope.is_finite() && intercept.is_finite()) {
            return Err(ModelError::RegressionFailure(
                "non-finite coefficient estimate".to_string(),
            ));
        }

        let x = design_matrix(&slice.index);
        let residuals: Array1<f64> = slice
            .index
            .iter()
            .zip(&slice.firm)
            .map(|(&r_index, &r_firm)| r_firm - intercept - slope * r_index)
            .collect();

        let ssr = residuals.mapv(|e| e * e).sum();
        let r_squared = if syy > 0.0 { 1.0 - ssr / syy } else { f64::NAN };
        let residual_variance = if n > N_PARAMS {
            ssr / (n - N_PARAMS) as f64
        } else {
            f64::NAN
        };

        let cov = self.config.covariance.estimate(&x, &residuals, &xtx_inv);
        if cov.iter().any(|v| v.is_nan()) {
            debug!(
                entity = entity_id,
                covariance = %self.config.covariance,
                n,
                "coefficient covariance undefined, keeping point estimates"
            );
        }

        Ok(RegressionFit {
            entity_id: entity_id.to_string(),
            index_name: slice.index_name.clone(),
            intercept,
            slope,
            covariance_matrix: [[cov[[0, 0]], cov[[0, 1]]], [cov[[1, 0]], cov[[1, 1]]]],
            covariance_kind: self.config.covariance.kind(),
            n_observations: n,
            r_squared,
            residual_variance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;

    fn slice(index: Vec<f64>, firm: Vec<f64>) -> EstimationSlice {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        EstimationSlice {
            index_name: "X".to_string(),
            dates: (0..index.len())
                .map(|i| start + chrono::Days::new(i as u64))
                .collect(),
            firm,
            index,
        }
    }

    #[test]
    fn test_recovers_exact_relation() {
        let index = vec![0.01, -0.02, 0.03, 0.00, 0.015, -0.01];
        let firm = index.iter().map(|x| 2.0 + 3.0 * x).collect();
        let fit = MarketModel::default().fit("ACME", &slice(index, firm)).unwrap();

        assert_relative_eq!(fit.intercept, 2.0, epsilon = 1e-10);
        assert_relative_eq!(fit.slope, 3.0, epsilon = 1e-10);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-10);
        assert_eq!(fit.n_observations, 6);
        assert_eq!(fit.covariance_kind, CovarianceKind::Hc3);
        assert_eq!(fit.index_name, "X");
    }

    #[test]
    fn test_noisy_fit_is_finite() {
        let mut rng = StdRng::seed_from_u64(42);
        let index: Vec<f64> = (0..250).map(|_| rng.gen_range(-0.03..0.03)).collect();
        let firm: Vec<f64> = index
            .iter()
            .map(|x| 0.001 + 1.2 * x + rng.gen_range(-0.01..0.01))
            .collect();
        let fit = MarketModel::default().fit("NOISY", &slice(index, firm)).unwrap();

        assert!(fit.intercept.is_finite());
        assert!(fit.slope.is_finite());
        assert_relative_eq!(fit.slope, 1.2, epsilon = 0.1);
        let (se_a, se_b) = fit.std_errors();
        assert!(se_a > 0.0 && se_b > 0.0);
        assert!(fit.covariance_matrix.iter().flatten().all(|v| v.is_finite()));
        assert!(fit.r_squared > 0.5 && fit.r_squared < 1.0);
    }

    #[test]
    fn test_tiny_index_returns_still_fit() {
        let index: Vec<f64> = (0..60).map(|i| 1e-7 * ((i % 7) as f64 - 3.0)).collect();
        let firm = index.iter().map(|x| 2.0 + 3.0 * x).collect();
        let fit = MarketModel::default().fit("QUIET", &slice(index, firm)).unwrap();

        assert_relative_eq!(fit.intercept, 2.0, epsilon = 1e-9);
        assert_relative_eq!(fit.slope, 3.0, epsilon = 1e-6);
        assert_eq!(fit.n_observations, 60);
    }

    #[test]
    fn test_offset_constant_index_rejected() {
        // Constant away from zero: centred deviations are pure rounding noise
        let index = vec![0.1 + 0.2; 40];
        let firm = (0..40).map(|i| i as f64 * 1e-3).collect();
        let result = MarketModel::default().fit("FLAT", &slice(index, firm));
        assert!(matches!(result, Err(ModelError::RegressionFailure(_))));
    }

    #[test]
    fn test_two_observations_keep_coefficients() {
        let fit = MarketModel::default()
            .fit("PAIR", &slice(vec![0.1, 0.3], vec![0.2, 0.6]))
            .unwrap();
        assert_relative_eq!(fit.intercept, 0.0, epsilon = 1e-12);
        assert_relative_eq!(fit.slope, 2.0, epsilon = 1e-12);
        assert!(fit.covariance_matrix.iter().flatten().all(|v| v.is_nan()));
        assert!(fit.residual_variance.is_nan());
    }

    #[rstest]
    #[case::empty(vec![], vec![])]
    #[case::single(vec![0.1], vec![0.2])]
    #[case::constant_index(vec![0.01, 0.01, 0.01], vec![0.1, 0.2, 0.3])]
    #[case::non_finite(vec![0.01, f64::NAN, 0.03], vec![0.1, 0.2, 0.3])]
    #[case::length_mismatch(vec![0.01, 0.02, 0.03], vec![0.1, 0.2])]
    fn test_degenerate_inputs(#[case] index: Vec<f64>, #[case] firm: Vec<f64>) {
        let result = MarketModel::default().fit("BAD", &slice(index, firm));
        assert!(matches!(result, Err(ModelError::RegressionFailure(_))));
    }

    #[test]
    fn test_min_observations_config() {
        let model = MarketModel::new(MarketModelConfig {
            min_observations: 5,
            ..Default::default()
        });
        let result = model.fit("SHORT", &slice(vec![0.1, 0.2, 0.3], vec![0.1, 0.3, 0.2]));
        assert!(matches!(result, Err(ModelError::RegressionFailure(_))));
    }

    #[test]
    fn test_covariance_selection() {
        let index = vec![0.0, 1.0, 2.0];
        let firm = vec![1.0, 3.0, 2.0];
        let classical = MarketModel::new(MarketModelConfig {
            covariance: CovarianceKind::Classical,
            ..Default::default()
        })
        .fit("C", &slice(index.clone(), firm.clone()))
        .unwrap();
        let hc3 = MarketModel::default().fit("C", &slice(index, firm)).unwrap();

        assert_eq!(classical.covariance_kind, CovarianceKind::Classical);
        assert_relative_eq!(classical.covariance_matrix[1][1], 0.75, epsilon = 1e-12);
        assert_relative_eq!(hc3.covariance_matrix[1][1], 4.5, epsilon = 1e-10);
        assert_relative_eq!(hc3.intercept, 1.5, epsilon = 1e-12);
        assert_relative_eq!(hc3.slope, 0.5, epsilon = 1e-12);
    }
}
