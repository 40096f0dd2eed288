//! Estimation and prediction window selection.
//!
//! Entity dates drive both slices; the index is looked up by date for each
//! of them, so the two returned columns always share dates and length no
//! matter how either series was filtered beforehand.

use crate::error::{ModelError, Result};
use crate::types::EstimationWindow;
use chrono::NaiveDate;
use hobart_data::{ReturnKind, ReturnSeries};

/// Fully-populated, date-aligned estimation data.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationSlice {
    /// Reference index name
    pub index_name: String,
    /// Shared dates, ascending
    pub dates: Vec<NaiveDate>,
    /// Entity returns
    pub firm: Vec<f64>,
    /// Index returns on the same dates
    pub index: Vec<f64>,
}

impl EstimationSlice {
    /// Number of observations.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the slice has no observations.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Date-aligned prediction data; gaps stay as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionSlice {
    /// Entity name
    pub entity_id: String,
    /// Shared dates, ascending
    pub dates: Vec<NaiveDate>,
    /// Entity returns
    pub actual: Vec<Option<f64>>,
    /// Index returns on the same dates
    pub index: Vec<Option<f64>>,
}

impl PredictionSlice {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the slice has no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Both slices for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSlices {
    /// Fitting data
    pub estimation: EstimationSlice,
    /// Projection data
    pub prediction: PredictionSlice,
}

/// Slices entity/index pairs for a fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSelector {
    window: EstimationWindow,
    anchor: NaiveDate,
    kind: ReturnKind,
}

impl WindowSelector {
    /// Selector whose anchor is the window start.
    pub const fn new(window: EstimationWindow, kind: ReturnKind) -> Self {
        Self {
            window,
            anchor: window.start,
            kind,
        }
    }

    /// Override the globally excluded anchor date.
    pub const fn with_anchor(mut self, anchor: NaiveDate) -> Self {
        self.anchor = anchor;
        self
    }

    /// The window in use.
    pub const fn window(&self) -> &EstimationWindow {
        &self.window
    }

    /// The excluded anchor date.
    pub const fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    /// Slice `entity` and `index` into estimation and prediction data.
    ///
    /// # Errors
    /// * `DateAlignmentMismatch` - an entity estimation date is absent from the index
    /// * `InsufficientEstimationData` - entity or index return missing inside the window
    pub fn select(&self, entity: &ReturnSeries, index: &ReturnSeries) -> Result<WindowSlices> {
        Ok(WindowSlices {
            estimation: self.estimation(entity, index)?,
            prediction: self.prediction(entity, index),
        })
    }

    /// Estimation slice: `start < date < end`.
    pub fn estimation(&self, entity: &ReturnSeries, index: &ReturnSeries) -> Result<EstimationSlice> {
        let mut dates = Vec::new();
        let mut firm = Vec::new();
        let mut market = Vec::new();

        for record in entity.records() {
            let date = record.date;
            if date == self.anchor || !self.window.in_estimation(date) {
                continue;
            }

            let firm_return =
                record
                    .value(self.kind)
                    .ok_or_else(|| ModelError::InsufficientEstimationData {
                        series: entity.name().to_string(),
                        date,
                    })?;

            let index_record =
                index
                    .get(date)
                    .ok_or_else(|| ModelError::DateAlignmentMismatch {
                        index: index.name().to_string(),
                        date,
                    })?;
            let index_return = index_record.value(self.kind).ok_or_else(|| {
                ModelError::InsufficientEstimationData {
                    series: index.name().to_string(),
                    date,
                }
            })?;

            dates.push(date);
            firm.push(firm_return);
            market.push(index_return);
        }

        Ok(EstimationSlice {
            index_name: index.name().to_string(),
            dates,
            firm,
            index: market,
        })
    }

    /// Prediction slice: `date >= end`. Index gaps propagate as `None`.
    pub fn prediction(&self, entity: &ReturnSeries, index: &ReturnSeries) -> PredictionSlice {
        let rows: Vec<_> = entity
            .records()
            .iter()
            .filter(|r| r.date != self.anchor && self.window.in_prediction(r.date))
            .map(|r| {
                let index_return = index.get(r.date).and_then(|i| i.value(self.kind));
                (r.date, r.value(self.kind), index_return)
            })
            .collect();

        PredictionSlice {
            entity_id: entity.name().to_string(),
            dates: rows.iter().map(|(d, _, _)| *d).collect(),
            actual: rows.iter().map(|(_, a, _)| *a).collect(),
            index: rows.iter().map(|(_, _, i)| *i).collect(),
        }
    }
}
