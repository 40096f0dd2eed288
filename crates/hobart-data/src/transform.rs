//! Return transformation.
//!
//! Turns a [`WideTable`] into a long `(name, date)` panel with one column per
//! kept variable label, then derives per-entity returns:
//!
//! ```text
//! simple_return[t] = value[t] / value[t-1] - 1
//! log_value[t]     = ln(1 + value[t])
//! log_return[t]    = log_value[t] - log_value[t-1]
//! ```
//!
//! Lags are taken with `shift().over([name])`, so the first observation of
//! every entity has a missing return and no return ever spans two entities.
//!
//! Entities keep the order in which they first appear in the wide table; the
//! `entity_order` column carries that position through every step.

use crate::error::{DataError, Result};
use crate::wide::WideTable;
use crate::{
    DATE_COL, ENTITY_ORDER_COL, LOG_RETURN_COL, LOG_VALUE_COL, NAME_COL, SIMPLE_RETURN_COL,
    VALUE_COL, VARIABLE_COL,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Configuration for the return transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Label of the price-level rows returns are computed from (default: "PI")
    pub price_label: String,
    /// Additional labels pivoted into their own columns next to the price level
    pub extra_labels: Vec<String>,
    /// Separator between the bare name and the label (default: " - ")
    pub label_separator: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            price_label: "PI".to_string(),
            extra_labels: Vec::new(),
            label_separator: " - ".to_string(),
        }
    }
}

impl TransformConfig {
    /// Create a configuration for a single price label.
    pub fn for_label(price_label: impl Into<String>) -> Self {
        Self {
            price_label: price_label.into(),
            ..Default::default()
        }
    }

    /// Kept labels, price label first.
    pub fn labels(&self) -> Vec<&str> {
        std::iter::once(self.price_label.as_str())
            .chain(self.extra_labels.iter().map(String::as_str))
            .collect()
    }

    /// Split a raw series name into `(name, label)` at the last separator.
    pub fn split_series<'a>(&self, series: &'a str) -> Option<(&'a str, &'a str)> {
        series
            .rsplit_once(self.label_separator.as_str())
            .map(|(name, label)| (name.trim(), label.trim()))
    }
}

/// Reshape a wide table into long form.
///
/// Rows whose label is not kept by `config` are discarded. Returns a frame
/// with columns `[name, entity_order, date, variable, value]`, where
/// `entity_order` numbers names by first appearance among the kept rows.
pub fn to_long(table: &WideTable, config: &TransformConfig) -> Result<DataFrame> {
    let labels = config.labels();
    let capacity = table.rows.len() * table.dates.len();

    let mut names = Vec::with_capacity(capacity);
    let mut orders: Vec<u32> = Vec::with_capacity(capacity);
    let mut positions: HashMap<String, u32> = HashMap::new();
    let mut dates = Vec::with_capacity(capacity);
    let mut variables = Vec::with_capacity(capacity);
    let mut values = Vec::with_capacity(capacity);
    let mut seen = HashSet::new();

    for row in &table.rows {
        let Some((name, label)) = config.split_series(&row.series) else {
            continue;
        };
        if name.is_empty() || !labels.contains(&label) {
            continue;
        }
        if !seen.insert((name.to_string(), label.to_string())) {
            return Err(DataError::DuplicateSeries {
                name: name.to_string(),
                label: label.to_string(),
            });
        }
        let next = positions.len() as u32;
        let position = *positions.entry(name.to_string()).or_insert(next);
        for (date, value) in table.dates.iter().zip(&row.values) {
            names.push(name.to_string());
            orders.push(position);
            dates.push(date.format("%Y-%m-%d").to_string());
            variables.push(label.to_string());
            values.push(*value);
        }
    }

    if names.is_empty() {
        return Err(DataError::EmptyTable(format!(
            "no series with label(s) {:?}",
            labels
        )));
    }

    let df = DataFrame::new(vec![
        Series::new(NAME_COL.into(), names).into(),
        Series::new(ENTITY_ORDER_COL.into(), orders).into(),
        Series::new(DATE_COL.into(), dates).into(),
        Series::new(VARIABLE_COL.into(), variables).into(),
        Series::new(VALUE_COL.into(), values).into(),
    ])?;

    let df = df
        .lazy()
        .with_column(col(DATE_COL).cast(DataType::Date))
        .collect()?;

    Ok(df)
}

/// Pivot each kept label into its own column aligned on `(name, date)`.
///
/// The `(name, date)` keys come from the price-label rows; other labels are
/// left-joined onto them. Output is sorted by `(entity_order, date)` with
/// columns `[name, entity_order, date, <price_label>, <extra_labels>...]`.
pub fn pivot_variables(long: &DataFrame, config: &TransformConfig) -> Result<DataFrame> {
    let label_rows = |label: &str| {
        long.clone()
            .lazy()
            .filter(col(VARIABLE_COL).eq(lit(label)))
    };

    let mut pivoted = label_rows(config.price_label.as_str()).select([
        col(NAME_COL),
        col(ENTITY_ORDER_COL),
        col(DATE_COL),
        col(VALUE_COL).alias(config.price_label.as_str()),
    ]);
    for label in &config.extra_labels {
        pivoted = pivoted.join(
            label_rows(label.as_str()).select([
                col(NAME_COL),
                col(DATE_COL),
                col(VALUE_COL).alias(label.as_str()),
            ]),
            [col(NAME_COL), col(DATE_COL)],
            [col(NAME_COL), col(DATE_COL)],
            JoinArgs::new(JoinType::Left),
        );
    }

    let df = pivoted
        .sort([ENTITY_ORDER_COL, DATE_COL], SortMultipleOptions::default())
        .collect()?;

    Ok(df)
}

/// Compute simple and log returns of `price_col`, per entity.
///
/// Adds `simple_return`, `log_value` and `log_return` columns. The input is
/// sorted by `(entity_order, date)` first, or `(name, date)` when it has no
/// order column, so lags follow the date axis.
pub fn compute_returns(frame: &DataFrame, price_col: &str) -> Result<DataFrame> {
    if frame.column(price_col).is_err() {
        return Err(DataError::MissingColumn {
            column: price_col.to_string(),
            table: "pivoted panel".to_string(),
        });
    }

    let entity_key = if frame.column(ENTITY_ORDER_COL).is_ok() {
        ENTITY_ORDER_COL
    } else {
        NAME_COL
    };

    let returns = frame
        .clone()
        .lazy()
        .with_column(col(price_col).cast(DataType::Float64))
        .sort([entity_key, DATE_COL], SortMultipleOptions::default())
        .with_columns([
            (col(price_col) / col(price_col).shift(lit(1)).over([col(NAME_COL)]) - lit(1.0))
                .alias(SIMPLE_RETURN_COL),
            col(price_col).log1p().alias(LOG_VALUE_COL),
        ])
        .with_column(
            (col(LOG_VALUE_COL) - col(LOG_VALUE_COL).shift(lit(1)).over([col(NAME_COL)]))
                .alias(LOG_RETURN_COL),
        )
        .collect()?;

    Ok(returns)
}

/// Run the full transformation: long form, pivot, returns.
pub fn transform(table: &WideTable, config: &TransformConfig) -> Result<DataFrame> {
    let long = to_long(table, config)?;
    let pivoted = pivot_variables(&long, config)?;
    compute_returns(&pivoted, &config.price_label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wide::WideTableConfig;
    use approx::assert_relative_eq;

    const TABLE: &str = "\
Name,2017-01-02,2017-01-03,2017-01-04
BETA LTD - PI,50.0,55.0,44.0
ACME CORP - PI,100.0,110.0,99.0
ACME CORP - MV,1000,1100,990
ACME CORP - DY,1.0,1.1,1.2
";

    fn table() -> WideTable {
        WideTable::from_reader(TABLE.as_bytes(), &WideTableConfig::default(), "test").unwrap()
    }

    fn f64_at(df: &DataFrame, column: &str, row: usize) -> Option<f64> {
        df.column(column).unwrap().f64().unwrap().get(row)
    }

    #[test]
    fn test_split_series() {
        let config = TransformConfig::default();
        assert_eq!(
            config.split_series("ACME - HOLDINGS - PI"),
            Some(("ACME - HOLDINGS", "PI"))
        );
        assert_eq!(config.split_series("NO LABEL"), None);
    }

    #[test]
    fn test_to_long_discards_other_labels() {
        let long = to_long(&table(), &TransformConfig::default()).unwrap();
        // 2 PI series x 3 dates
        assert_eq!(long.height(), 6);
        let variables = long.column(VARIABLE_COL).unwrap().str().unwrap();
        assert!(variables.into_iter().all(|v| v == Some("PI")));
    }

    #[test]
    fn test_to_long_rejects_duplicates() {
        let input = "Name,2017-01-02\nX - PI,1\nX - PI,2\n";
        let table =
            WideTable::from_reader(input.as_bytes(), &WideTableConfig::default(), "dup").unwrap();
        assert!(matches!(
            to_long(&table, &TransformConfig::default()),
            Err(DataError::DuplicateSeries { .. })
        ));
    }

    #[test]
    fn test_to_long_without_matching_rows() {
        let config = TransformConfig::for_label("RI");
        assert!(matches!(
            to_long(&table(), &config),
            Err(DataError::EmptyTable(_))
        ));
    }

    #[test]
    fn test_pivot_extra_labels() {
        let config = TransformConfig {
            extra_labels: vec!["MV".to_string()],
            ..Default::default()
        };
        let long = to_long(&table(), &config).unwrap();
        let pivoted = pivot_variables(&long, &config).unwrap();

        assert_eq!(pivoted.height(), 6);
        assert!(pivoted.column("PI").is_ok());
        assert!(pivoted.column("MV").is_ok());

        // Input order: BETA LTD rows first, then ACME CORP with MV joined on
        assert_eq!(f64_at(&pivoted, "MV", 1), None);
        assert_eq!(f64_at(&pivoted, "MV", 4), Some(1100.0));
    }

    #[test]
    fn test_simple_and_log_returns() {
        let df = transform(&table(), &TransformConfig::default()).unwrap();
        assert_eq!(df.height(), 6);

        // ACME CORP (rows 3..6): 100 -> 110 -> 99
        assert_eq!(f64_at(&df, SIMPLE_RETURN_COL, 3), None);
        assert_relative_eq!(f64_at(&df, SIMPLE_RETURN_COL, 4).unwrap(), 0.1, epsilon = 1e-12);
        assert_relative_eq!(f64_at(&df, SIMPLE_RETURN_COL, 5).unwrap(), -0.1, epsilon = 1e-12);

        assert_relative_eq!(
            f64_at(&df, LOG_VALUE_COL, 3).unwrap(),
            101.0_f64.ln(),
            epsilon = 1e-12
        );
        assert_eq!(f64_at(&df, LOG_RETURN_COL, 3), None);
        assert_relative_eq!(
            f64_at(&df, LOG_RETURN_COL, 4).unwrap(),
            111.0_f64.ln() - 101.0_f64.ln(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_returns_do_not_cross_entities() {
        let df = transform(&table(), &TransformConfig::default()).unwrap();
        // Row 3 is the first ACME CORP observation; it must not be 100/44 - 1
        assert_eq!(f64_at(&df, SIMPLE_RETURN_COL, 3), None);
        assert_eq!(f64_at(&df, LOG_RETURN_COL, 3), None);
        assert_relative_eq!(f64_at(&df, SIMPLE_RETURN_COL, 1).unwrap(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_entity_order_follows_input() {
        let long = to_long(&table(), &TransformConfig::default()).unwrap();
        let df = pivot_variables(&long, &TransformConfig::default()).unwrap();
        let names: Vec<_> = df
            .column(NAME_COL)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        assert_eq!(names[0], "BETA LTD");
        assert_eq!(names[3], "ACME CORP");
    }

    #[test]
    fn test_missing_price_column() {
        let long = to_long(&table(), &TransformConfig::default()).unwrap();
        let pivoted = pivot_variables(&long, &TransformConfig::default()).unwrap();
        assert!(matches!(
            compute_returns(&pivoted, "RI"),
            Err(DataError::MissingColumn { .. })
        ));
    }
}
