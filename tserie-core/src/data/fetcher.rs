//! Remote fetcher: resolve a code, make one vendor call, pick the price
//! column and return a `Series`.

use std::sync::Arc;

use super::column::select_price_column;
use super::products::ProductTable;
use super::provider::{DataProvider, FetchError, VendorTable};
use super::quandl::QuandlProvider;
use super::resolver::Resolver;
use super::synthetic::SyntheticProvider;
use super::yahoo::YahooProvider;
use crate::config::{Credentials, TserieConfig};
use crate::domain::{DateRange, Instrument, Series, Vendor};
use crate::error::AnalysisError;

/// A fetched price series together with the instrument it was resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedSeries {
    pub instrument: Instrument,
    pub series: Series,
}

pub struct RemoteFetcher {
    resolver: Resolver,
    primary: Arc<dyn DataProvider>,
    secondary: Arc<dyn DataProvider>,
    priority: Vec<String>,
}

impl std::fmt::Debug for RemoteFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteFetcher")
            .field("primary", &self.primary.name())
            .field("secondary", &self.secondary.name())
            .field("priority", &self.priority)
            .finish()
    }
}

impl RemoteFetcher {
    pub fn new(
        resolver: Resolver,
        primary: Arc<dyn DataProvider>,
        secondary: Arc<dyn DataProvider>,
        priority: Vec<String>,
    ) -> Self {
        Self {
            resolver,
            primary,
            secondary,
            priority,
        }
    }

    /// One provider for both routes.
    pub fn with_provider(
        resolver: Resolver,
        provider: Arc<dyn DataProvider>,
        priority: Vec<String>,
    ) -> Self {
        Self::new(resolver, provider.clone(), provider, priority)
    }

    /// Live vendors, with credentials resolved from `config`.
    pub fn from_config(config: &TserieConfig) -> Result<Self, AnalysisError> {
        let credentials = Credentials::resolve(&config.credentials)?;
        let primary = QuandlProvider::new(&credentials, &config.vendors)?;
        let secondary = YahooProvider::new(&config.vendors)?;
        Ok(Self::new(
            Self::resolver_for(config),
            Arc::new(primary),
            Arc::new(secondary),
            config.columns.priority.clone(),
        ))
    }

    /// Offline random walks for every code.
    pub fn synthetic(config: &TserieConfig) -> Self {
        Self::with_provider(
            Self::resolver_for(config),
            Arc::new(SyntheticProvider::default()),
            config.columns.priority.clone(),
        )
    }

    fn resolver_for(config: &TserieConfig) -> Resolver {
        Resolver::new(ProductTable::with_overrides(&config.products))
    }

    pub fn resolve(&self, code: &str) -> Instrument {
        self.resolver.resolve(code)
    }

    fn provider_for(&self, instrument: &Instrument) -> &dyn DataProvider {
        match instrument.vendor {
            Vendor::Quandl => self.primary.as_ref(),
            Vendor::Yahoo | Vendor::Synthetic => self.secondary.as_ref(),
        }
    }

    /// Resolve and fetch the raw vendor table. One provider call, no retry.
    pub fn fetch_table(
        &self,
        code: &str,
        range: &DateRange,
    ) -> Result<(Instrument, VendorTable), FetchError> {
        let instrument = self.resolve(code);
        let provider = self.provider_for(&instrument);
        tracing::debug!(
            code = %instrument.code,
            vendor = %instrument.vendor,
            provider = provider.name(),
            "routing fetch"
        );
        let table = provider.fetch(&instrument, range)?;
        Ok((instrument, table))
    }

    /// Fetch `code` and keep its price column.
    pub fn fetch(&self, code: &str, range: &DateRange) -> Result<FetchedSeries, AnalysisError> {
        let (instrument, table) = self.fetch_table(code, range)?;
        let columns = table.column_names();
        let column = select_price_column(&columns, &self.priority)?;
        let series = table.extract(column)?;
        tracing::info!(
            code = %instrument.code,
            vendor = %instrument.vendor,
            column,
            rows = series.len(),
            first = %series.first_date(),
            last = %series.last_date(),
            "fetched series"
        );
        Ok(FetchedSeries { instrument, series })
    }

    pub fn fetch_series(&self, code: &str, range: &DateRange) -> Result<Series, AnalysisError> {
        Ok(self.fetch(code, range)?.series)
    }

    /// Fetch every code in order, sequentially. Stops at the first failure.
    pub fn fetch_all<S: AsRef<str>>(
        &self,
        codes: &[S],
        range: &DateRange,
    ) -> Result<Vec<FetchedSeries>, AnalysisError> {
        codes
            .iter()
            .map(|code| self.fetch(code.as_ref(), range))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::data::column::DEFAULT_PRICE_COLUMNS;
    use crate::data::provider::StaticProvider;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn priority() -> Vec<String> {
        DEFAULT_PRICE_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn range() -> DateRange {
        DateRange::parse("2024-01-01", Some("2024-01-31")).unwrap()
    }

    /// Records which provider served each code.
    struct Recording {
        name: &'static str,
        inner: SyntheticProvider,
        calls: Mutex<Vec<String>>,
    }

    impl Recording {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                inner: SyntheticProvider::default(),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    impl DataProvider for Recording {
        fn name(&self) -> &str {
            self.name
        }

        fn vendor(&self) -> Vendor {
            Vendor::Synthetic
        }

        fn fetch(
            &self,
            instrument: &Instrument,
            range: &DateRange,
        ) -> Result<VendorTable, FetchError> {
            self.calls.lock().unwrap().push(instrument.code.clone());
            self.inner.fetch(instrument, range)
        }
    }

    #[test]
    fn routes_by_product_table() {
        let primary = Recording::new("primary");
        let secondary = Recording::new("secondary");
        let fetcher = RemoteFetcher::new(
            Resolver::default(),
            primary.clone(),
            secondary.clone(),
            priority(),
        );
        fetcher.fetch_series("GC", &range()).unwrap();
        fetcher.fetch_series("SPY", &range()).unwrap();
        assert_eq!(*primary.calls.lock().unwrap(), vec!["GC"]);
        assert_eq!(*secondary.calls.lock().unwrap(), vec!["SPY"]);
    }

    #[test]
    fn picks_column_by_priority() {
        let fetcher = RemoteFetcher::synthetic(&TserieConfig::default());
        assert_eq!(fetcher.fetch_series("GC", &range()).unwrap().column(), "Settle");
        assert_eq!(
            fetcher.fetch_series("SPY", &range()).unwrap().column(),
            "Adj Close"
        );
    }

    #[test]
    fn no_price_column_is_configuration_error() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let table = VendorTable::from_rows(
            "XYZ",
            Vendor::Yahoo,
            &["Open".to_string()],
            &[d],
            &[vec![Some(1.0)]],
        )
        .unwrap();
        let fetcher = RemoteFetcher::with_provider(
            Resolver::default(),
            Arc::new(StaticProvider::new().with_table(table)),
            priority(),
        );
        let err = fetcher.fetch_series("XYZ", &range()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Config(ConfigError::NoPriceColumn { .. })
        ));
    }

    #[test]
    fn fetch_errors_surface_unchanged() {
        let fetcher = RemoteFetcher::with_provider(
            Resolver::default(),
            Arc::new(StaticProvider::new()),
            priority(),
        );
        let err = fetcher.fetch_all(&["GC", "SI"], &range()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Fetch(FetchError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn product_overrides_reach_the_resolver() {
        let mut config = TserieConfig::default();
        config
            .products
            .insert("LBS".into(), "CHRIS/CME_LB1".into());
        let fetcher = RemoteFetcher::synthetic(&config);
        assert_eq!(fetcher.resolve("LBS").vendor, Vendor::Quandl);
    }
}
