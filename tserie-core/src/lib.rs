//! tserie core: fetch, align and analyse daily financial time series.
//!
//! This crate holds the whole data path:
//! - Domain types (instruments, date ranges, series, aligned tables)
//! - Vendor providers (Quandl for futures, Yahoo Finance for equities, synthetic)
//! - Instrument resolution and price-column selection
//! - Date-based alignment of several series into one table
//! - Statistics over aligned data (returns, rolling volatility, regression,
//!   autocorrelation, autoregressive fits, Dickey-Fuller)
//! - Analysis objects tying it together: `Batch`, `Pairs`, `AutoRegressions`

pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod stats;

pub use analysis::{AutoRegressions, Batch, Pairs};
pub use config::{ConfigError, Credentials, KeyPolicy, TserieConfig};
pub use data::{AlignPolicy, FetchError, RemoteFetcher};
pub use domain::{AlignedTable, DateRange, Instrument, Series, TableView, Transform, Vendor};
pub use error::AnalysisError;

#[cfg(test)]
mod tests {
    use super::*;

    /// Everything handed between the fetcher, the analysis objects and the
    /// presenter must be shareable across threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Series>();
        require_sync::<Series>();
        require_send::<AlignedTable>();
        require_sync::<AlignedTable>();
        require_send::<Instrument>();
        require_sync::<Instrument>();
        require_send::<RemoteFetcher>();
        require_sync::<RemoteFetcher>();
        require_send::<Batch>();
        require_sync::<Batch>();
        require_send::<Pairs>();
        require_sync::<Pairs>();
        require_send::<AutoRegressions>();
        require_sync::<AutoRegressions>();
        require_send::<TserieConfig>();
        require_sync::<TserieConfig>();
    }
}
