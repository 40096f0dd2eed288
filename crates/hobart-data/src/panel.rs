//! Typed return panels.
//!
//! The polars frames produced by the transformer and aligner are converted
//! into [`ReturnPanel`]s once; all per-entity computation works on these
//! immutable, date-sorted series.

use crate::align::align_panel;
use crate::error::{DataError, Result};
use crate::transform::{TransformConfig, transform};
use crate::wide::{WideTable, WideTableConfig};
use crate::{DATE_COL, LOG_RETURN_COL, NAME_COL, SIMPLE_RETURN_COL};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

/// Which transformed column is treated as "the return".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReturnKind {
    /// `value[t] / value[t-1] - 1`
    #[default]
    #[serde(rename = "simple_return")]
    Simple,
    /// `ln(1 + value[t]) - ln(1 + value[t-1])`
    #[serde(rename = "log_return")]
    Log,
}

impl ReturnKind {
    /// Column name of this return in transformed frames.
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Simple => SIMPLE_RETURN_COL,
            Self::Log => LOG_RETURN_COL,
        }
    }

    /// Parse from a column name.
    pub fn from_column(name: &str) -> Option<Self> {
        match name.trim() {
            SIMPLE_RETURN_COL => Some(Self::Simple),
            LOG_RETURN_COL => Some(Self::Log),
            _ => None,
        }
    }
}

impl fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// One observation of an entity's price level and derived returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnRecord {
    /// Entity (or index) name
    pub entity_id: String,
    /// Observation date
    pub date: NaiveDate,
    /// Price-index level
    pub raw_value: Option<f64>,
    /// Simple period-over-period return
    pub simple_return: Option<f64>,
    /// Log return
    pub log_return: Option<f64>,
}

impl ReturnRecord {
    /// The return selected by `kind`.
    pub const fn value(&self, kind: ReturnKind) -> Option<f64> {
        match kind {
            ReturnKind::Simple => self.simple_return,
            ReturnKind::Log => self.log_return,
        }
    }
}

/// Index observations share the entity record shape, keyed by index name.
pub type IndexReturnRecord = ReturnRecord;

/// Date-sorted return observations for one entity or index.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    name: String,
    records: Vec<ReturnRecord>,
}

impl ReturnSeries {
    /// Create a series; records are sorted by date.
    pub fn new(name: impl Into<String>, mut records: Vec<ReturnRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        Self {
            name: name.into(),
            records,
        }
    }

    /// Build a series from returns alone (no price levels).
    ///
    /// Each entry sets both the simple and the log return.
    pub fn from_returns(
        name: impl Into<String>,
        returns: impl IntoIterator<Item = (NaiveDate, Option<f64>)>,
    ) -> Self {
        let name = name.into();
        let records = returns
            .into_iter()
            .map(|(date, value)| ReturnRecord {
                entity_id: name.clone(),
                date,
                raw_value: None,
                simple_return: value,
                log_return: value,
            })
            .collect();
        Self::new(name, records)
    }

    /// Entity or index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All records in date order.
    pub fn records(&self) -> &[ReturnRecord] {
        &self.records
    }

    /// Look up the record at `date`.
    pub fn get(&self, date: NaiveDate) -> Option<&ReturnRecord> {
        self.records
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.records[i])
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A panel of return series sharing one date axis.
///
/// Series keep the order in which their names first appear in the input
/// table; that order is the entity enumeration order used for all output.
#[derive(Debug, Clone, Default)]
pub struct ReturnPanel {
    dates: Vec<NaiveDate>,
    series: Vec<ReturnSeries>,
    lookup: HashMap<String, usize>,
}

impl ReturnPanel {
    /// Build a panel from already-constructed series, keeping their order.
    ///
    /// A repeated name resolves to its first series.
    pub fn from_series(series: Vec<ReturnSeries>) -> Self {
        let dates: BTreeSet<NaiveDate> = series
            .iter()
            .flat_map(|s| s.records.iter().map(|r| r.date))
            .collect();
        let mut lookup = HashMap::with_capacity(series.len());
        for (i, s) in series.iter().enumerate() {
            lookup.entry(s.name.clone()).or_insert(i);
        }
        Self {
            dates: dates.into_iter().collect(),
            series,
            lookup,
        }
    }

    /// Convert an aligned frame into a panel.
    ///
    /// `price_col` holds the raw level. Non-finite numbers (from division by
    /// zero or `ln` of a non-positive argument) are stored as missing.
    pub fn from_frame(frame: &DataFrame, price_col: &str) -> Result<Self> {
        let names = frame.column(NAME_COL)?.str()?;
        let dates = frame.column(DATE_COL)?.cast(&DataType::String)?;
        let dates = dates.str()?;
        let prices = frame.column(price_col)?.cast(&DataType::Float64)?;
        let prices = prices.f64()?;
        let simple = frame.column(SIMPLE_RETURN_COL)?.f64()?;
        let log = frame.column(LOG_RETURN_COL)?.f64()?;

        let mut series: Vec<ReturnSeries> = Vec::new();
        let mut current: Option<(String, Vec<ReturnRecord>)> = None;

        for i in 0..frame.height() {
            let name = names
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing name".to_string()))?;
            let date = dates
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing date".to_string()))?
                .parse::<NaiveDate>()
                .map_err(|e| DataError::Parse(format!("Invalid date: {}", e)))?;

            let record = ReturnRecord {
                entity_id: name.to_string(),
                date,
                raw_value: finite(prices.get(i)),
                simple_return: finite(simple.get(i)),
                log_return: finite(log.get(i)),
            };

            match current.as_mut() {
                Some((current_name, records)) if current_name == name => records.push(record),
                _ => {
                    if let Some((done_name, records)) = current.take() {
                        series.push(ReturnSeries::new(done_name, records));
                    }
                    current = Some((name.to_string(), vec![record]));
                }
            }
        }
        if let Some((done_name, records)) = current {
            series.push(ReturnSeries::new(done_name, records));
        }

        Ok(Self::from_series(series))
    }

    /// Transform and align a wide table into a panel.
    pub fn from_wide(table: &WideTable, config: &TransformConfig) -> Result<Self> {
        let transformed = transform(table, config)?;
        let aligned = align_panel(&transformed)?;
        Self::from_frame(&aligned, &config.price_label)
    }

    /// Load a wide CSV table and build its panel.
    pub fn from_path(
        path: &Path,
        table_config: &WideTableConfig,
        transform_config: &TransformConfig,
    ) -> Result<Self> {
        let table = WideTable::from_path(path, table_config)?;
        Self::from_wide(&table, transform_config)
    }

    /// The shared date axis, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// All series in enumeration order.
    pub fn series(&self) -> &[ReturnSeries] {
        &self.series
    }

    /// Look up a series by name.
    pub fn get(&self, name: &str) -> Option<&ReturnSeries> {
        self.lookup.get(name).map(|&i| &self.series[i])
    }

    /// Series names in enumeration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.name.as_str())
    }

    /// Number of series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether the panel has no series.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
