//! Abnormal return projection.

use crate::types::{AbnormalReturnRecord, RegressionFit};
use crate::window::PredictionSlice;

/// Project a fitted model over the prediction window.
///
/// One record per prediction date; a missing actual or index return yields a
/// missing abnormal return rather than a dropped row.
pub fn project(fit: &RegressionFit, slice: &PredictionSlice) -> Vec<AbnormalReturnRecord> {
    slice
        .dates
        .iter()
        .zip(slice.actual.iter().zip(&slice.index))
        .map(|(&date, (&actual, &index))| {
            let predicted = index.map(|r| fit.predict(r));
            let abnormal = match (actual, predicted) {
                (Some(a), Some(p)) => Some(a - p),
                _ => None,
            };
            AbnormalReturnRecord {
                entity_id: slice.entity_id.clone(),
                date,
                actual_return: actual,
                predicted_normal_return: predicted,
                abnormal_return: abnormal.filter(|v| v.is_finite()),
            }
        })
        .collect()
}

/// Sum of the non-missing abnormal returns.
pub fn cumulative_abnormal_return(records: &[AbnormalReturnRecord]) -> f64 {
    records.iter().filter_map(|r| r.abnormal_return).sum()
}
