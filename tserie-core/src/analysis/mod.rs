//! Analysis objects built on fetched, aligned data.
//!
//! - [`Batch`]: N instruments on one date axis.
//! - [`Pairs`]: two instruments, prices plus derived returns.
//! - [`AutoRegressions`]: one instrument, correlogram and AR/ARIMA fits.

pub mod auto;
pub mod batch;
pub mod pairs;

pub use auto::{AutoRegressions, Correlogram};
pub use batch::Batch;
pub use pairs::{PairRegression, Pairs, PRICE, RETURNS};
