//! Panel alignment.
//!
//! Windowing downstream slices by date, so every entity must cover the same
//! date axis. The aligner builds the full `names x dates` grid and left-joins
//! the transformed panel onto it; absent combinations become nulls.

use crate::error::Result;
use crate::{DATE_COL, ENTITY_ORDER_COL, NAME_COL};
use polars::prelude::*;
use std::collections::{BTreeSet, HashSet};

/// Align a transformed panel onto the union of its names and dates.
///
/// Names keep the order of their first row in `frame`. The output has exactly
/// `n_names * n_dates` rows, sorted by `(entity_order, date)`, and carries
/// every column of `frame`; `entity_order` is rebuilt so that it is never null.
pub fn align_panel(frame: &DataFrame) -> Result<DataFrame> {
    let mut seen = HashSet::new();
    let names: Vec<String> = frame
        .column(NAME_COL)?
        .str()?
        .into_iter()
        .flatten()
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect();

    // ISO-8601 strings order chronologically
    let date_strings = frame.column(DATE_COL)?.cast(&DataType::String)?;
    let dates: BTreeSet<String> = date_strings
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();

    let capacity = names.len() * dates.len();
    let mut grid_names = Vec::with_capacity(capacity);
    let mut grid_orders: Vec<u32> = Vec::with_capacity(capacity);
    let mut grid_dates = Vec::with_capacity(capacity);
    for (position, name) in names.iter().enumerate() {
        for date in &dates {
            grid_names.push(name.clone());
            grid_orders.push(position as u32);
            grid_dates.push(date.clone());
        }
    }

    let grid = DataFrame::new(vec![
        Series::new(NAME_COL.into(), grid_names).into(),
        Series::new(ENTITY_ORDER_COL.into(), grid_orders).into(),
        Series::new(DATE_COL.into(), grid_dates).into(),
    ])?;

    let values: Vec<Expr> = frame
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != ENTITY_ORDER_COL)
        .map(|name| col(name.as_str()))
        .collect();

    let aligned = grid
        .lazy()
        .with_column(col(DATE_COL).cast(DataType::Date))
        .join(
            frame.clone().lazy().select(values),
            [col(NAME_COL), col(DATE_COL)],
            [col(NAME_COL), col(DATE_COL)],
            JoinArgs::new(JoinType::Left),
        )
        .sort([ENTITY_ORDER_COL, DATE_COL], SortMultipleOptions::default())
        .collect()?;

    Ok(aligned)
}
