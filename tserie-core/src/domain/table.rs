//! Several instruments on one shared date axis.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::series::{check_increasing, SeriesError, Transform};
use crate::stats::rolling;

/// The handful of table operations the analysis and presentation layers use.
///
/// Implemented by [`AlignedTable`] and by the analysis objects that own one,
/// so callers can index, peek and roll without reaching into internals.
pub trait TableView {
    /// The shared date axis, strictly increasing.
    fn dates(&self) -> &[NaiveDate];

    /// Values of one instrument, aligned to `dates()`.
    fn column(&self, name: &str) -> Option<&[f64]>;

    /// Instrument codes in request order.
    fn column_names(&self) -> Vec<&str>;

    fn len(&self) -> usize {
        self.dates().len()
    }

    fn is_empty(&self) -> bool {
        self.dates().is_empty()
    }

    /// First `n` rows.
    fn head(&self, n: usize) -> AlignedTable;

    /// Sample standard deviation over a trailing window, per column.
    /// Rows before the window fills are NaN.
    fn rolling_std(&self, window: usize) -> AlignedTable;
}

/// Date-aligned columns, one per instrument, in request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedTable {
    dates: Vec<NaiveDate>,
    columns: Vec<(String, Vec<f64>)>,
}

impl AlignedTable {
    pub fn new(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, SeriesError> {
        let mut seen = HashSet::new();
        for (name, values) in &columns {
            if !seen.insert(name.as_str()) {
                return Err(SeriesError::DuplicateColumn(name.clone()));
            }
            if values.len() != dates.len() {
                return Err(SeriesError::LengthMismatch {
                    instrument: name.clone(),
                    dates: dates.len(),
                    values: values.len(),
                });
            }
        }
        check_increasing("table", &dates)?;
        Ok(Self { dates, columns })
    }

    pub fn columns(&self) -> &[(String, Vec<f64>)] {
        &self.columns
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Row `i` as (date, one value per column).
    pub fn row(&self, i: usize) -> Option<(NaiveDate, Vec<f64>)> {
        let date = *self.dates.get(i)?;
        Some((date, self.columns.iter().map(|(_, v)| v[i]).collect()))
    }

    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, Vec<f64>)> + '_ {
        (0..self.dates.len()).filter_map(move |i| self.row(i))
    }

    /// Apply a one-step transform to every column. The first row is dropped.
    pub fn derive(&self, transform: Transform) -> AlignedTable {
        AlignedTable {
            dates: self.dates.iter().skip(1).copied().collect(),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), transform.apply(values)))
                .collect(),
        }
    }

    /// Drop every row where any column is NaN.
    pub fn drop_nan_rows(&self) -> AlignedTable {
        let keep: Vec<usize> = (0..self.dates.len())
            .filter(|&i| self.columns.iter().all(|(_, v)| !v[i].is_nan()))
            .collect();
        self.select_rows(&keep)
    }

    fn select_rows(&self, rows: &[usize]) -> AlignedTable {
        AlignedTable {
            dates: rows.iter().map(|&i| self.dates[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|(name, v)| (name.clone(), rows.iter().map(|&i| v[i]).collect()))
                .collect(),
        }
    }

    /// Convert to a Polars frame with a `Date` column followed by one
    /// `Float64` column per instrument.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut cols = Vec::with_capacity(self.columns.len() + 1);
        cols.push(date_column(DATE_COLUMN, &self.dates)?);
        for (name, values) in &self.columns {
            cols.push(Column::new(name.as_str().into(), values.clone()));
        }
        DataFrame::new(cols)
    }
}

/// Name of the date column in every frame this crate builds.
pub const DATE_COLUMN: &str = "Date";

/// Days between 0001-01-01 (CE day 1) and 1970-01-01.
const UNIX_EPOCH_CE_DAYS: i32 = 719_163;

/// A polars `Date` column (days since the Unix epoch).
pub(crate) fn date_column(name: &str, dates: &[NaiveDate]) -> PolarsResult<Column> {
    let days: Vec<i32> = dates
        .iter()
        .map(|d| d.num_days_from_ce() - UNIX_EPOCH_CE_DAYS)
        .collect();
    Column::new(name.into(), days).cast(&DataType::Date)
}

pub(crate) fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_CE_DAYS)?)
}

impl TableView for AlignedTable {
    fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn head(&self, n: usize) -> AlignedTable {
        let rows: Vec<usize> = (0..self.dates.len().min(n)).collect();
        self.select_rows(&rows)
    }

    fn rolling_std(&self, window: usize) -> AlignedTable {
        AlignedTable {
            dates: self.dates.clone(),
            columns: self
                .columns
                .iter()
                .map(|(name, v)| (name.clone(), rolling::rolling_std(v, window)))
                .collect(),
        }
    }
}
