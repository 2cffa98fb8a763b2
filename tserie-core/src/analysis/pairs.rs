use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::batch::Batch;
use crate::data::{AlignPolicy, RemoteFetcher};
use crate::domain::{AlignedTable, DateRange, TableView, Transform};
use crate::error::AnalysisError;
use crate::stats::{self, Regression};

/// Name of the price table in [`Pairs::tables`].
pub const PRICE: &str = "price";
/// Name of the derived returns table in [`Pairs::tables`].
pub const RETURNS: &str = "returns";

/// Regression of the second instrument on the first, for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRegression {
    /// `price` or `returns`.
    pub table: String,
    pub x: String,
    pub y: String,
    pub regression: Regression,
}

/// Two instruments compared on prices and on derived returns.
///
/// The returns table is computed once from the aligned prices, so it is
/// always exactly one row shorter.
#[derive(Debug, Clone)]
pub struct Pairs {
    batch: Batch,
    transform: Transform,
    returns: AlignedTable,
}

impl Pairs {
    pub fn fetch<S: AsRef<str>>(
        fetcher: &RemoteFetcher,
        codes: &[S],
        range: DateRange,
        policy: AlignPolicy,
        transform: Transform,
    ) -> Result<Self, AnalysisError> {
        if codes.len() != 2 {
            return Err(AnalysisError::InstrumentCount {
                expected: 2,
                got: codes.len(),
            });
        }
        let batch = Batch::fetch(fetcher, codes, range, policy)?;
        Self::from_batch(batch, transform)
    }

    pub fn from_batch(batch: Batch, transform: Transform) -> Result<Self, AnalysisError> {
        if batch.table().width() != 2 {
            return Err(AnalysisError::InstrumentCount {
                expected: 2,
                got: batch.table().width(),
            });
        }
        let returns = batch.table().derive(transform);
        let pairs = Self {
            batch,
            transform,
            returns,
        };
        pairs.check_equal_lengths();
        Ok(pairs)
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn x(&self) -> &str {
        &self.batch.instruments()[0].code
    }

    pub fn y(&self) -> &str {
        &self.batch.instruments()[1].code
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn prices(&self) -> &AlignedTable {
        self.batch.table()
    }

    pub fn returns(&self) -> &AlignedTable {
        &self.returns
    }

    /// `(name, table)` for prices then returns.
    pub fn tables(&self) -> [(&'static str, &AlignedTable); 2] {
        [(PRICE, self.prices()), (RETURNS, &self.returns)]
    }

    /// Whether both instruments came back with the same number of
    /// observations before alignment. Logs a warning when they did not.
    pub fn check_equal_lengths(&self) -> bool {
        let lengths = self.batch.raw_lengths();
        let equal = lengths.windows(2).all(|w| w[0].1 == w[1].1);
        if !equal {
            tracing::warn!(
                x = %lengths[0].0,
                x_len = lengths[0].1,
                y = %lengths[1].0,
                y_len = lengths[1].1,
                aligned = self.batch.len(),
                "length mismatch between instruments"
            );
        }
        equal
    }

    /// Regress y on x for the price table and the returns table.
    pub fn correlate(&self) -> Result<Vec<PairRegression>, AnalysisError> {
        let (x, y) = (self.x(), self.y());
        self.tables()
            .into_iter()
            .map(|(name, table)| {
                let (Some(xs), Some(ys)) = (table.column(x), table.column(y)) else {
                    return Err(AnalysisError::InstrumentCount {
                        expected: 2,
                        got: table.width(),
                    });
                };
                let regression = stats::ols(xs, ys)?;
                tracing::info!(
                    table = name,
                    slope = regression.slope,
                    r = regression.r,
                    n = regression.n,
                    "pair regression"
                );
                Ok(PairRegression {
                    table: name.to_string(),
                    x: x.to_string(),
                    y: y.to_string(),
                    regression,
                })
            })
            .collect()
    }

    /// Rolling standard deviation of each table after dropping incomplete rows.
    pub fn volatility(&self, window: usize) -> Vec<(&'static str, AlignedTable)> {
        self.tables()
            .into_iter()
            .map(|(name, table)| (name, table.drop_nan_rows().rolling_std(window)))
            .collect()
    }
}

impl TableView for Pairs {
    fn dates(&self) -> &[NaiveDate] {
        self.batch.dates()
    }

    fn column(&self, name: &str) -> Option<&[f64]> {
        self.batch.column(name)
    }

    fn column_names(&self) -> Vec<&str> {
        self.batch.column_names()
    }

    fn head(&self, n: usize) -> AlignedTable {
        self.batch.head(n)
    }

    fn rolling_std(&self, window: usize) -> AlignedTable {
        self.batch.rolling_std(window)
    }
}
