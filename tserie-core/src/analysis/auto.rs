use serde::{Deserialize, Serialize};

use crate::data::RemoteFetcher;
use crate::domain::{DateRange, Instrument, Series, Transform};
use crate::error::AnalysisError;
use crate::stats::{
    self, acf, confidence_band, default_maxlag, pacf, AdfResult, ArModel, ArimaModel,
    StationaryResult,
};

/// ACF and PACF of one series with the white-noise band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlogram {
    pub nobs: usize,
    /// Lags 0..=nlags.
    pub acf: Vec<f64>,
    pub pacf: Vec<f64>,
    /// Half-width of the 95% band around zero.
    pub band: f64,
}

/// Single-instrument autocorrelation and autoregressive analysis.
#[derive(Debug, Clone)]
pub struct AutoRegressions {
    instrument: Instrument,
    range: DateRange,
    series: Series,
}

impl AutoRegressions {
    pub fn fetch(
        fetcher: &RemoteFetcher,
        code: &str,
        range: DateRange,
    ) -> Result<Self, AnalysisError> {
        let fetched = fetcher.fetch(code, &range)?;
        Ok(Self::new(fetched.instrument, range, fetched.series))
    }

    pub fn new(instrument: Instrument, range: DateRange, series: Series) -> Self {
        Self {
            instrument,
            range,
            series,
        }
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    /// Correlogram up to `nlags`, capped below half the sample.
    pub fn autocorr(&self, nlags: usize) -> Result<Correlogram, AnalysisError> {
        let values = self.series.values();
        let n = values.len();
        let cap = (n / 2).saturating_sub(1).max(1);
        if nlags > cap {
            tracing::debug!(requested = nlags, used = cap, "capping correlogram lags");
        }
        let nlags = nlags.min(cap);
        Ok(Correlogram {
            nobs: n,
            acf: acf(values, nlags)?,
            pacf: pacf(values, nlags)?,
            band: confidence_band(n),
        })
    }

    /// AR fit on prices. Without `lag`, the order is chosen by AIC up to the
    /// usual rule-of-thumb bound.
    pub fn autoregress(&self, lag: Option<usize>) -> Result<ArModel, AnalysisError> {
        let values = self.series.values();
        let model = match lag {
            Some(lag) => stats::fit_ar(values, lag)?,
            None => {
                let bound = (values.len().saturating_sub(2) / 2).max(1);
                stats::select_ar(values, default_maxlag(values.len()).clamp(1, bound))?
            }
        };
        tracing::info!(
            code = %self.instrument.code,
            lag = model.lag,
            mse = model.mse(),
            aic = model.aic,
            "autoregression"
        );
        Ok(model)
    }

    pub fn arima(&self, p: usize, d: usize, horizon: usize) -> Result<ArimaModel, AnalysisError> {
        Ok(stats::fit_arima(self.series.values(), p, d, horizon)?)
    }

    pub fn dickey_fuller(&self) -> Result<AdfResult, AnalysisError> {
        Ok(stats::adfuller(self.series.values(), None)?)
    }

    /// Apply `transform`, or search for one when `None`.
    pub fn make_stationary(
        &self,
        transform: Option<Transform>,
    ) -> Result<StationaryResult, AnalysisError> {
        let values = self.series.values();
        let result = match transform {
            Some(t) => stats::make_stationary(values, t)?,
            None => stats::make_stationary_auto(values, 0.05, 2)?,
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TserieConfig;

    fn auto() -> AutoRegressions {
        let fetcher = RemoteFetcher::synthetic(&TserieConfig::default());
        let range = DateRange::parse("2020-01-01", Some("2021-12-31")).unwrap();
        AutoRegressions::fetch(&fetcher, "SPY", range).unwrap()
    }

    #[test]
    fn correlogram_of_random_walk_decays_slowly() {
        let c = auto().autocorr(10).unwrap();
        assert_eq!(c.acf.len(), 11);
        assert_eq!(c.pacf.len(), 11);
        assert!(c.acf[1] > 0.9);
        assert!(c.band > 0.0);
    }

    #[test]
    fn oversized_lag_request_is_capped() {
        let c = auto().autocorr(100_000).unwrap();
        assert!(c.acf.len() < c.nobs / 2 + 1);
    }

    #[test]
    fn ar1_on_prices_is_near_unit_root() {
        let model = auto().autoregress(Some(1)).unwrap();
        assert!(model.coefficients[0] > 0.9);
        assert!(auto().autoregress(None).unwrap().lag >= 1);
    }

    #[test]
    fn returns_are_stationary() {
        let result = auto().make_stationary(Some(Transform::LogDiff)).unwrap();
        assert!(result.adf.is_stationary(0.05));
        assert_eq!(result.values.len(), auto().series().len() - 1);
    }

    #[test]
    fn arima_forecasts_requested_horizon() {
        let model = auto().arima(1, 1, 5).unwrap();
        assert_eq!(model.forecast.len(), 5);
    }
}
