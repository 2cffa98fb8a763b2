//! Data provider trait, vendor tables and fetch errors.
//!
//! `DataProvider` is the seam between the fetcher and individual vendors, so
//! the vendor behind a code can be swapped (synthetic, in-memory) without the
//! rest of the pipeline noticing.

use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::domain::table::{date_column, date_from_days};
use crate::domain::{DateRange, Instrument, Series, Vendor, DATE_COLUMN};

/// A vendor call failed. Displayable as-is on the console.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{vendor}: network unreachable: {message}")]
    NetworkUnreachable { vendor: Vendor, message: String },

    #[error("{vendor}: HTTP {status} for '{code}'")]
    Http {
        vendor: Vendor,
        code: String,
        status: u16,
    },

    #[error("{vendor}: {message}")]
    Vendor { vendor: Vendor, message: String },

    #[error("{vendor}: authentication required: {message}")]
    AuthenticationRequired { vendor: Vendor, message: String },

    #[error("{vendor}: symbol not found: {code}")]
    SymbolNotFound { vendor: Vendor, code: String },

    #[error("{vendor}: response format changed: {message}")]
    ResponseFormatChanged { vendor: Vendor, message: String },

    #[error("{vendor}: no observations for '{code}' in the requested range")]
    Empty { vendor: Vendor, code: String },

    #[error("{vendor}: column '{column}' is missing from the table for '{code}'")]
    MissingColumn {
        vendor: Vendor,
        code: String,
        column: String,
    },

    #[error("cannot build HTTP client: {0}")]
    Client(String),

    #[error("table error: {0}")]
    Table(#[from] PolarsError),
}

/// One fetched vendor table: a `Date` column plus the vendor's own columns.
#[derive(Debug, Clone)]
pub struct VendorTable {
    code: String,
    vendor: Vendor,
    frame: DataFrame,
}

impl VendorTable {
    /// Wrap a frame that already has a `Date`-typed `Date` column.
    pub fn new(code: impl Into<String>, vendor: Vendor, frame: DataFrame) -> Result<Self, FetchError> {
        let code = code.into();
        let date_ok = frame
            .column(DATE_COLUMN)
            .is_ok_and(|c| c.dtype() == &DataType::Date);
        if !date_ok {
            return Err(FetchError::ResponseFormatChanged {
                vendor,
                message: format!("table for '{code}' has no {DATE_COLUMN} column"),
            });
        }
        Ok(Self {
            code,
            vendor,
            frame,
        })
    }

    /// Build from row-major vendor data. `columns` names the value columns
    /// (without the date); every row must have one entry per column.
    pub fn from_rows(
        code: impl Into<String>,
        vendor: Vendor,
        columns: &[String],
        dates: &[NaiveDate],
        rows: &[Vec<Option<f64>>],
    ) -> Result<Self, FetchError> {
        let code = code.into();
        if dates.len() != rows.len() {
            return Err(FetchError::ResponseFormatChanged {
                vendor,
                message: format!("{} dates for {} rows", dates.len(), rows.len()),
            });
        }
        let mut cols = Vec::with_capacity(columns.len() + 1);
        cols.push(date_column(DATE_COLUMN, dates)?);
        for (j, name) in columns.iter().enumerate() {
            let values: Vec<Option<f64>> = rows
                .iter()
                .map(|row| row.get(j).copied().flatten())
                .collect();
            cols.push(Column::new(name.as_str().into(), values));
        }
        let frame = DataFrame::new(cols)?;
        Self::new(code, vendor, frame)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Value column names in table order, without the date column.
    pub fn column_names(&self) -> Vec<&str> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str())
            .filter(|name| *name != DATE_COLUMN)
            .collect()
    }

    /// Extract one column as a [`Series`].
    ///
    /// Rows are sorted by date; for duplicate dates the last row wins. Rows
    /// with a null or NaN value are dropped. Both counts are logged.
    pub fn extract(&self, column: &str) -> Result<Series, FetchError> {
        let values = self
            .frame
            .column(column)
            .map_err(|_| FetchError::MissingColumn {
                vendor: self.vendor,
                code: self.code.clone(),
                column: column.to_string(),
            })?
            .cast(&DataType::Float64)?;
        let values = values.f64()?;
        let dates = self.frame.column(DATE_COLUMN)?.date()?;

        let mut by_date = BTreeMap::new();
        let mut null_rows = 0usize;
        let mut duplicates = 0usize;
        for i in 0..self.frame.height() {
            let date = dates.get(i).and_then(date_from_days);
            match (date, values.get(i)) {
                (Some(date), Some(v)) if !v.is_nan() => {
                    if by_date.insert(date, v).is_some() {
                        duplicates += 1;
                    }
                }
                _ => null_rows += 1,
            }
        }

        if null_rows > 0 || duplicates > 0 {
            tracing::warn!(
                instrument = %self.code,
                column,
                null_rows,
                duplicates,
                kept = by_date.len(),
                "dropped unusable rows from vendor table"
            );
        }
        if by_date.is_empty() {
            return Err(FetchError::Empty {
                vendor: self.vendor,
                code: self.code.clone(),
            });
        }

        let (dates, values): (Vec<NaiveDate>, Vec<f64>) = by_date.into_iter().unzip();
        Series::new(self.code.clone(), column, dates, values).map_err(|e| {
            FetchError::ResponseFormatChanged {
                vendor: self.vendor,
                message: e.to_string(),
            }
        })
    }
}

/// A source of vendor tables.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// The vendor whose tables this provider returns.
    fn vendor(&self) -> Vendor;

    /// One request for `instrument` over `range`.
    fn fetch(&self, instrument: &Instrument, range: &DateRange) -> Result<VendorTable, FetchError>;
}

/// Serves preloaded tables keyed by instrument code, clipped to the
/// requested range. Used for offline replays and tests.
#[derive(Debug, Default)]
pub struct StaticProvider {
    tables: HashMap<String, VendorTable>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: VendorTable) -> Self {
        self.tables.insert(table.code().to_string(), table);
        self
    }
}

impl DataProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn vendor(&self) -> Vendor {
        Vendor::Synthetic
    }

    fn fetch(&self, instrument: &Instrument, range: &DateRange) -> Result<VendorTable, FetchError> {
        let table = self
            .tables
            .get(&instrument.code)
            .ok_or_else(|| FetchError::SymbolNotFound {
                vendor: self.vendor(),
                code: instrument.code.clone(),
            })?;

        let dates = table.frame().column(DATE_COLUMN)?.date()?;
        let keep: BooleanChunked = (0..table.height())
            .map(|i| {
                dates
                    .get(i)
                    .and_then(date_from_days)
                    .is_some_and(|d| range.contains(d))
            })
            .collect();
        let frame = table.frame().filter(&keep)?;
        VendorTable::new(table.code(), table.vendor(), frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn table() -> VendorTable {
        VendorTable::from_rows(
            "GC",
            Vendor::Quandl,
            &["Last".to_string(), "Settle".to_string()],
            &[d(2024, 1, 4), d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 3)],
            &[
                vec![Some(4.0), Some(40.0)],
                vec![Some(2.0), Some(20.0)],
                vec![Some(3.0), None],
                vec![Some(3.5), Some(35.0)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn column_names_exclude_date() {
        assert_eq!(table().column_names(), vec!["Last", "Settle"]);
    }

    #[test]
    fn extract_sorts_and_keeps_last_duplicate() {
        let series = table().extract("Last").unwrap();
        assert_eq!(series.dates(), &[d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 4)]);
        assert_eq!(series.values(), &[2.0, 3.5, 4.0]);
        assert_eq!(series.column(), "Last");
    }

    #[test]
    fn extract_drops_null_prices() {
        let t = VendorTable::from_rows(
            "SI",
            Vendor::Quandl,
            &["Settle".to_string()],
            &[d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 4)],
            &[vec![Some(1.0)], vec![None], vec![Some(f64::NAN)]],
        )
        .unwrap();
        let series = t.extract("Settle").unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn extract_all_null_is_empty_error() {
        let t = VendorTable::from_rows(
            "SI",
            Vendor::Quandl,
            &["Settle".to_string()],
            &[d(2024, 1, 2)],
            &[vec![None]],
        )
        .unwrap();
        assert!(matches!(t.extract("Settle"), Err(FetchError::Empty { .. })));
    }

    #[test]
    fn missing_column_is_reported() {
        assert!(matches!(
            table().extract("Adj Close"),
            Err(FetchError::MissingColumn { .. })
        ));
    }

    #[test]
    fn static_provider_clips_to_range() {
        let provider = StaticProvider::new().with_table(table());
        let instrument = Instrument {
            code: "GC".into(),
            vendor: Vendor::Quandl,
            dataset: None,
        };
        let range = DateRange::new(d(2024, 1, 3), None).unwrap();
        let clipped = provider.fetch(&instrument, &range).unwrap();
        assert_eq!(clipped.height(), 3);

        let unknown = Instrument {
            code: "CL".into(),
            ..instrument
        };
        assert!(matches!(
            provider.fetch(&unknown, &range),
            Err(FetchError::SymbolNotFound { .. })
        ));
    }
}
