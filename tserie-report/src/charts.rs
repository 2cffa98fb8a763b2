//! Chart descriptions.
//!
//! Each chart carries exactly the data a plotting front end needs to draw it,
//! already computed: no chart here re-runs a regression or a rolling window
//! when it is rendered.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use tserie_core::analysis::{Correlogram, PairRegression};
use tserie_core::domain::{AlignedTable, Series, TableView};
use tserie_core::stats::{histogram, ArModel, ArimaModel, Histogram, Regression, StatsError};

/// Scatter of y against x with the fitted line and both marginal histograms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointPlot {
    /// `price` or `returns`.
    pub title: String,
    pub x: String,
    pub y: String,
    /// Rows where both sides are finite.
    pub points: Vec<(NaiveDate, f64, f64)>,
    pub regression: Regression,
    /// Endpoints of the regression line over the observed x range.
    pub line: [(f64, f64); 2],
    pub x_marginal: Histogram,
    pub y_marginal: Histogram,
}

impl JointPlot {
    /// Build from one table of a pair and its already-fitted regression.
    pub fn new(
        table: &AlignedTable,
        fit: &PairRegression,
        bins: usize,
    ) -> Result<Self, StatsError> {
        let (Some(xs), Some(ys)) = (table.column(&fit.x), table.column(&fit.y)) else {
            return Err(StatsError::InvalidArgument(format!(
                "table {} has no {} / {} columns",
                fit.table, fit.x, fit.y
            )));
        };
        let points: Vec<(NaiveDate, f64, f64)> = table
            .dates()
            .iter()
            .zip(xs.iter().zip(ys))
            .filter(|(_, (x, y))| x.is_finite() && y.is_finite())
            .map(|(d, (x, y))| (*d, *x, *y))
            .collect();
        let (lo, hi) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, x, _)| {
                (lo.min(*x), hi.max(*x))
            });
        let reg = &fit.regression;
        Ok(Self {
            title: fit.table.clone(),
            x: fit.x.clone(),
            y: fit.y.clone(),
            line: [(lo, reg.predict(lo)), (hi, reg.predict(hi))],
            x_marginal: histogram(xs, bins)?,
            y_marginal: histogram(ys, bins)?,
            regression: reg.clone(),
            points,
        })
    }
}

/// Rolling standard deviation lines, one per instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityPlot {
    /// e.g. `250 window stdev - price`.
    pub title: String,
    pub window: usize,
    pub table: AlignedTable,
}

impl VolatilityPlot {
    pub fn new(name: &str, window: usize, table: AlignedTable) -> Self {
        Self {
            title: format!("{window} window stdev - {name}"),
            window,
            table,
        }
    }
}

/// ACF and PACF bars with the white-noise band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelogramPlot {
    pub title: String,
    pub correlogram: Correlogram,
}

impl CorrelogramPlot {
    pub fn new(code: &str, correlogram: Correlogram) -> Self {
        Self {
            title: format!("autocorrelation - {code}"),
            correlogram,
        }
    }

    /// `(lag, acf, pacf)` rows.
    pub fn bars(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        self.correlogram
            .acf
            .iter()
            .zip(&self.correlogram.pacf)
            .enumerate()
            .map(|(lag, (a, p))| (lag, *a, *p))
    }
}

/// Actual prices overlaid with in-sample fit and an out-of-sample forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPlot {
    pub title: String,
    pub dates: Vec<NaiveDate>,
    pub actual: Vec<f64>,
    /// `None` for the leading rows the model needs as lags.
    pub fitted: Vec<Option<f64>>,
    /// Forecasts on the business days following the last observation.
    pub forecast: Vec<(NaiveDate, f64)>,
    pub mse: f64,
}

impl FittedPlot {
    pub fn from_ar(series: &Series, model: &ArModel, horizon: usize) -> Self {
        let forecast = model.forecast(series.values(), horizon);
        Self::build(
            format!("AR({}) - {}", model.lag, series.instrument()),
            series,
            &model.fitted,
            &forecast,
            model.mse(),
        )
    }

    pub fn from_arima(series: &Series, model: &ArimaModel) -> Self {
        Self::build(
            format!("ARIMA({}, {}, 0) - {}", model.p, model.d, series.instrument()),
            series,
            &model.fitted,
            &model.forecast,
            model.mse(),
        )
    }

    fn build(title: String, series: &Series, fitted: &[f64], forecast: &[f64], mse: f64) -> Self {
        let offset = series.len().saturating_sub(fitted.len());
        let fitted = std::iter::repeat(None)
            .take(offset)
            .chain(fitted.iter().map(|v| Some(*v)))
            .collect();
        let forecast = business_days_after(series.last_date())
            .zip(forecast.iter().copied())
            .collect();
        Self {
            title,
            dates: series.dates().to_vec(),
            actual: series.values().to_vec(),
            fitted,
            forecast,
            mse,
        }
    }
}

/// Weekdays strictly after `date`.
fn business_days_after(date: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(date), |d| Some(*d + Duration::days(1)))
        .skip(1)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
}
