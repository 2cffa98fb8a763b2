//! Date-indexed observations for one instrument, and their derived transforms.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stats::returns;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeriesError {
    #[error("series '{instrument}' is empty")]
    Empty { instrument: String },

    #[error("series '{instrument}' has {dates} dates but {values} values")]
    LengthMismatch {
        instrument: String,
        dates: usize,
        values: usize,
    },

    #[error("series '{instrument}' dates are not strictly increasing at {date}")]
    NotIncreasing { instrument: String, date: NaiveDate },

    #[error("duplicate column '{0}' in table")]
    DuplicateColumn(String),
}

/// Observations of one instrument over one requested range.
///
/// Dates are strictly increasing; `Series::new` refuses anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    instrument: String,
    column: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl Series {
    pub fn new(
        instrument: impl Into<String>,
        column: impl Into<String>,
        dates: Vec<NaiveDate>,
        values: Vec<f64>,
    ) -> Result<Self, SeriesError> {
        let instrument = instrument.into();
        if dates.len() != values.len() {
            return Err(SeriesError::LengthMismatch {
                instrument,
                dates: dates.len(),
                values: values.len(),
            });
        }
        if dates.is_empty() {
            return Err(SeriesError::Empty { instrument });
        }
        check_increasing(&instrument, &dates)?;
        Ok(Self {
            instrument,
            column: column.into(),
            dates,
            values,
        })
    }

    /// Instrument code this series belongs to.
    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// Vendor column the values were taken from (`Settle`, `Adj Close`, ...).
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn last_date(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Percent-change, log-difference or plain difference of this series.
    pub fn derive(&self, transform: Transform) -> DerivedSeries {
        DerivedSeries {
            source: self.instrument.clone(),
            transform,
            dates: self.dates.iter().skip(1).copied().collect(),
            values: transform.apply(&self.values),
        }
    }
}

pub(crate) fn check_increasing(instrument: &str, dates: &[NaiveDate]) -> Result<(), SeriesError> {
    match dates.windows(2).find(|w| w[0] >= w[1]) {
        Some(w) => Err(SeriesError::NotIncreasing {
            instrument: instrument.to_string(),
            date: w[1],
        }),
        None => Ok(()),
    }
}

/// One-step transforms used to turn prices into returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// `x[t] / x[t-1] - 1`
    #[default]
    PctChange,
    /// `ln(x[t]) - ln(x[t-1])`
    LogDiff,
    /// `x[t] - x[t-1]`
    Diff,
}

impl Transform {
    /// Apply to a slice. The output has one fewer element; the first
    /// observation has no predecessor and is dropped.
    pub fn apply(self, values: &[f64]) -> Vec<f64> {
        match self {
            Transform::PctChange => returns::pct_change(values),
            Transform::LogDiff => returns::log_diff(values),
            Transform::Diff => returns::diff(values),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Transform::PctChange => "pct_change",
            Transform::LogDiff => "log_diff",
            Transform::Diff => "diff",
        }
    }
}

/// A series after a [`Transform`]. Dated at the later observation of each
/// pair, so it is exactly one element shorter than its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedSeries {
    pub source: String,
    pub transform: Transform,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl DerivedSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
