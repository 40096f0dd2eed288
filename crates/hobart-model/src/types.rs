//! Windows, fits and output records.

use crate::covariance::CovarianceKind;
use crate::error::{ModelError, Result, SkipReason};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Estimation window with exclusive bounds.
///
/// `end` is also the first date of the prediction window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimationWindow {
    /// Exclusive start of the fitting interval
    pub start: NaiveDate,
    /// Exclusive end of the fitting interval and inclusive prediction start
    pub end: NaiveDate,
}

impl EstimationWindow {
    /// Create a window, rejecting `start >= end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start >= end {
            return Err(ModelError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Whether `date` lies strictly inside the estimation interval.
    pub fn in_estimation(&self, date: NaiveDate) -> bool {
        self.start < date && date < self.end
    }

    /// Whether `date` belongs to the prediction interval.
    pub fn in_prediction(&self, date: NaiveDate) -> bool {
        date >= self.end
    }
}

/// A fitted market model for one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionFit {
    /// Entity the model was fitted for
    pub entity_id: String,
    /// Reference index
    pub index_name: String,
    /// α
    pub intercept: f64,
    /// β
    pub slope: f64,
    /// Coefficient covariance `[[var(α), cov(α,β)], [cov(β,α), var(β)]]`
    pub covariance_matrix: [[f64; 2]; 2],
    /// Estimator that produced `covariance_matrix`
    pub covariance_kind: CovarianceKind,
    /// Observations used
    pub n_observations: usize,
    /// Coefficient of determination
    pub r_squared: f64,
    /// `SSR / (n - 2)`
    pub residual_variance: f64,
}

impl RegressionFit {
    /// Predicted return for an index return.
    pub fn predict(&self, index_return: f64) -> f64 {
        self.intercept + self.slope * index_return
    }

    /// Standard errors of `(α, β)`.
    pub fn std_errors(&self) -> (f64, f64) {
        (
            self.covariance_matrix[0][0].sqrt(),
            self.covariance_matrix[1][1].sqrt(),
        )
    }

    /// t-statistics of `(α, β)`.
    pub fn t_stats(&self) -> (f64, f64) {
        let (se_a, se_b) = self.std_errors();
        (self.intercept / se_a, self.slope / se_b)
    }
}

/// One prediction-window row of the output panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbnormalReturnRecord {
    /// Entity name
    pub entity_id: String,
    /// Observation date
    pub date: NaiveDate,
    /// Observed return
    pub actual_return: Option<f64>,
    /// `α + β · index_return`
    pub predicted_normal_return: Option<f64>,
    /// `actual - predicted`
    pub abnormal_return: Option<f64>,
}

/// One row of the skip log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipRecord {
    /// Entity name
    pub entity_id: String,
    /// Taxonomy member
    pub reason: SkipReason,
    /// Estimation window start
    pub window_start: NaiveDate,
    /// Estimation window end
    pub window_end: NaiveDate,
    /// Human-readable cause
    pub detail: String,
}

impl SkipRecord {
    /// Create a skip record for `entity_id` over `window`.
    pub fn new(
        entity_id: impl Into<String>,
        reason: SkipReason,
        window: &EstimationWindow,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            reason,
            window_start: window.start,
            window_end: window.end,
            detail: detail.into(),
        }
    }
}
