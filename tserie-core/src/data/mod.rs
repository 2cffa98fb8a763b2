//! Data acquisition: vendor providers, routing, column selection, alignment.

pub mod align;
pub mod column;
pub mod fetcher;
pub mod products;
pub mod provider;
pub mod quandl;
pub mod resolver;
pub mod synthetic;
pub mod yahoo;

pub use align::{align, AlignError, AlignPolicy};
pub use column::{select_price_column, DEFAULT_PRICE_COLUMNS};
pub use fetcher::{FetchedSeries, RemoteFetcher};
pub use products::ProductTable;
pub use provider::{DataProvider, FetchError, StaticProvider, VendorTable};
pub use quandl::QuandlProvider;
pub use resolver::Resolver;
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
