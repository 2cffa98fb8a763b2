//! Date-based alignment of several series onto one table.
//!
//! Alignment is always by date, never by position. `Inner` keeps the dates
//! every series has and logs what each instrument lost; `Strict` refuses
//! series whose date sets differ.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

use crate::domain::{AlignedTable, Series, SeriesError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignPolicy {
    /// Keep the intersection of dates.
    #[default]
    Inner,
    /// Fail unless every series has exactly the same dates.
    Strict,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlignError {
    #[error("no series to align")]
    NoSeries,

    #[error("instrument '{0}' requested more than once")]
    DuplicateInstrument(String),

    #[error(
        "dates of '{instrument}' differ from '{reference}': \
         {extra} extra, {missing} missing"
    )]
    DateMismatch {
        reference: String,
        instrument: String,
        extra: usize,
        missing: usize,
    },

    #[error("series share no common dates")]
    NoCommonDates,

    #[error(transparent)]
    Table(#[from] SeriesError),
}

pub fn align(series: &[Series], policy: AlignPolicy) -> Result<AlignedTable, AlignError> {
    let first = series.first().ok_or(AlignError::NoSeries)?;

    let mut seen = HashSet::new();
    for s in series {
        if !seen.insert(s.instrument()) {
            return Err(AlignError::DuplicateInstrument(s.instrument().to_string()));
        }
    }

    let common: BTreeSet<NaiveDate> = match policy {
        AlignPolicy::Strict => {
            let reference: BTreeSet<NaiveDate> = first.dates().iter().copied().collect();
            for s in &series[1..] {
                let dates: BTreeSet<NaiveDate> = s.dates().iter().copied().collect();
                if dates != reference {
                    return Err(AlignError::DateMismatch {
                        reference: first.instrument().to_string(),
                        instrument: s.instrument().to_string(),
                        extra: dates.difference(&reference).count(),
                        missing: reference.difference(&dates).count(),
                    });
                }
            }
            reference
        }
        AlignPolicy::Inner => {
            let mut common: BTreeSet<NaiveDate> = first.dates().iter().copied().collect();
            for s in &series[1..] {
                let dates: HashSet<NaiveDate> = s.dates().iter().copied().collect();
                common.retain(|d| dates.contains(d));
            }
            common
        }
    };

    if common.is_empty() {
        return Err(AlignError::NoCommonDates);
    }

    let mut columns = Vec::with_capacity(series.len());
    for s in series {
        let values: Vec<f64> = s
            .iter()
            .filter(|(date, _)| common.contains(date))
            .map(|(_, v)| v)
            .collect();
        let dropped = s.len() - values.len();
        if dropped > 0 {
            tracing::warn!(
                instrument = s.instrument(),
                dropped,
                kept = values.len(),
                "observations without a match in every series were dropped"
            );
        }
        columns.push((s.instrument().to_string(), values));
    }

    Ok(AlignedTable::new(common.into_iter().collect(), columns)?)
}
