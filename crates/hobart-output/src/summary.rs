//! Batch run summary.
//!
//! Totals for one study run: how many entities were fitted, how many were
//! skipped and why, and how many were never dispatched because the run was
//! interrupted.

use chrono::NaiveDate;
use hobart_model::{AbnormalReturnRecord, SkipReason, SkipRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Totals for one batch run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchSummary {
    /// Estimation window start.
    pub window_start: NaiveDate,

    /// Estimation window end.
    pub window_end: NaiveDate,

    /// Entities in the aligned panel.
    pub entities_total: usize,

    /// Entities with a fitted model.
    pub fitted: usize,

    /// Entities recorded in the skip log.
    pub skipped: usize,

    /// Entities never started because the run was interrupted.
    pub not_dispatched: usize,

    /// Rows in the abnormal return panel.
    pub output_rows: usize,

    /// Rows with a non-missing abnormal return.
    pub populated_rows: usize,

    /// Mean of the non-missing abnormal returns.
    pub mean_abnormal_return: Option<f64>,

    /// Skip counts by reason.
    pub skips_by_reason: BTreeMap<SkipReason, usize>,
}

impl BatchSummary {
    /// Summarize a finished run.
    pub fn new(
        window_start: NaiveDate,
        window_end: NaiveDate,
        entities_total: usize,
        fitted: usize,
        records: &[AbnormalReturnRecord],
        skips: &[SkipRecord],
        not_dispatched: usize,
    ) -> Self {
        let mut skips_by_reason = BTreeMap::new();
        for skip in skips {
            *skips_by_reason.entry(skip.reason).or_insert(0) += 1;
        }

        let populated: Vec<f64> = records.iter().filter_map(|r| r.abnormal_return).collect();
        let mean_abnormal_return = if populated.is_empty() {
            None
        } else {
            Some(populated.iter().sum::<f64>() / populated.len() as f64)
        };

        Self {
            window_start,
            window_end,
            entities_total,
            fitted,
            skipped: skips.len(),
            not_dispatched,
            output_rows: records.len(),
            populated_rows: populated.len(),
            mean_abnormal_return,
            skips_by_reason,
        }
    }

    /// Skips recorded for `reason`.
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skips_by_reason.get(&reason).copied().unwrap_or(0)
    }

    /// Whether every entity was either fitted or skipped.
    pub const fn is_complete(&self) -> bool {
        self.not_dispatched == 0
    }

    /// Generate a formatted ASCII table.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "\nEstimation window: ({}, {})\n",
            self.window_start, self.window_end
        ));
        output.push_str(&"=".repeat(60));
        output.push('\n');
        output.push_str(&format!("  Entities:            {:>8}\n", self.entities_total));
        output.push_str(&format!("  Fitted:              {:>8}\n", self.fitted));
        output.push_str(&format!("  Skipped:             {:>8}\n", self.skipped));
        for reason in SkipReason::ALL {
            let count = self.skipped_for(reason);
            if count > 0 {
                output.push_str(&format!("    {:<28}{:>6}\n", reason.as_str(), count));
            }
        }
        if self.not_dispatched > 0 {
            output.push_str(&format!("  Not dispatched:      {:>8}\n", self.not_dispatched));
        }
        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!("  Output rows:         {:>8}\n", self.output_rows));
        output.push_str(&format!("  Populated rows:      {:>8}\n", self.populated_rows));
        if let Some(mean) = self.mean_abnormal_return {
            output.push_str(&format!("  Mean AR:             {:>7.4}%\n", mean * 100.0));
        }

        output
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entities: {} fitted, {} skipped, {} not dispatched, {} output rows",
            self.entities_total, self.fitted, self.skipped, self.not_dispatched, self.output_rows
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn record(entity: &str, ar: Option<f64>) -> AbnormalReturnRecord {
        AbnormalReturnRecord {
            entity_id: entity.to_string(),
            date: date(5),
            actual_return: ar,
            predicted_normal_return: Some(0.0),
            abnormal_return: ar,
        }
    }

    fn skip(entity: &str, reason: SkipReason) -> SkipRecord {
        SkipRecord {
            entity_id: entity.to_string(),
            reason,
            window_start: date(1),
            window_end: date(4),
            detail: String::new(),
        }
    }

    #[test]
    fn test_counts() {
        let records = vec![record("A", Some(0.02)), record("A", None), record("B", Some(0.04))];
        let skips = vec![
            skip("C", SkipReason::MissingIndexMapping),
            skip("D", SkipReason::MissingIndexMapping),
            skip("E", SkipReason::RegressionFailure),
        ];
        let summary = BatchSummary::new(date(1), date(4), 6, 2, &records, &skips, 1);

        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.skipped_for(SkipReason::MissingIndexMapping), 2);
        assert_eq!(summary.skipped_for(SkipReason::DateAlignmentMismatch), 0);
        assert_eq!(summary.output_rows, 3);
        assert_eq!(summary.populated_rows, 2);
        assert!((summary.mean_abnormal_return.unwrap() - 0.03).abs() < 1e-12);
        assert!(!summary.is_complete());
    }

    #[test]
    fn test_ascii_table() {
        let skips = vec![skip("C", SkipReason::InsufficientEstimationData)];
        let summary = BatchSummary::new(date(1), date(4), 1, 0, &[], &skips, 0);
        let table = summary.to_ascii_table();
        assert!(table.contains("InsufficientEstimationData"));
        assert!(!table.contains("Mean AR"));
        assert!(summary.to_string().starts_with("1 entities: 0 fitted, 1 skipped"));
    }

    #[test]
    fn test_json_keys_are_reason_names() {
        let skips = vec![skip("C", SkipReason::RegressionFailure)];
        let summary = BatchSummary::new(date(1), date(4), 1, 0, &[], &skips, 0);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["skips_by_reason"]["RegressionFailure"], 1);
    }
}
