//! Offline provider: seeded random walks shaped like the real vendor tables.
//!
//! The seed is the BLAKE3 hash of the instrument code, so a code always yields
//! the same path. Weekends are skipped; no holiday calendar.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataProvider, FetchError, VendorTable};
use super::yahoo::YAHOO_COLUMNS;
use crate::domain::{DateRange, Instrument, Vendor};

/// Column names of a futures-shaped table.
const FUTURES_COLUMNS: [&str; 6] = ["Open", "High", "Low", "Last", "Settle", "Volume"];

/// Generates data for any code. Instruments that resolve to the primary
/// vendor get a futures-shaped table (`Settle`), the rest a Yahoo-shaped one
/// (`Adj Close`), so price-column selection behaves as it would live.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    /// Used when the range has no end.
    default_end: NaiveDate,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new(chrono::Utc::now().date_naive())
    }
}

impl SyntheticProvider {
    pub fn new(default_end: NaiveDate) -> Self {
        Self { default_end }
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn vendor(&self) -> Vendor {
        Vendor::Synthetic
    }

    fn fetch(&self, instrument: &Instrument, range: &DateRange) -> Result<VendorTable, FetchError> {
        let seed: [u8; 32] = *blake3::hash(instrument.code.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);
        let futures = instrument.vendor == Vendor::Quandl;

        let end = range.end.unwrap_or(self.default_end);
        let mut price = rng.gen_range(20.0..2000.0_f64);
        let mut dates = Vec::new();
        let mut rows = Vec::new();
        for date in range.start.iter_days().take_while(|d| *d <= end) {
            if is_weekend(date) {
                continue;
            }
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64) as f64;

            // The close lands in both Last/Settle and Close/Adj Close.
            let row = vec![open, high, low, close, close, volume];
            dates.push(date);
            rows.push(row.into_iter().map(Some).collect::<Vec<_>>());
            price = close;
        }

        tracing::debug!(
            vendor = "synthetic",
            code = %instrument.code,
            rows = dates.len(),
            "generated random walk"
        );
        if dates.is_empty() {
            return Err(FetchError::Empty {
                vendor: Vendor::Synthetic,
                code: instrument.code.clone(),
            });
        }

        let names = if futures { FUTURES_COLUMNS } else { YAHOO_COLUMNS };
        let columns: Vec<String> = names.iter().map(|c| c.to_string()).collect();
        VendorTable::from_rows(&instrument.code, Vendor::Synthetic, &columns, &dates, &rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Resolver;

    fn range() -> DateRange {
        DateRange::parse("2024-01-01", Some("2024-01-31")).unwrap()
    }

    #[test]
    fn same_code_same_path() {
        let provider = SyntheticProvider::default();
        let gc = Resolver::default().resolve("GC");
        let a = provider.fetch(&gc, &range()).unwrap().extract("Settle").unwrap();
        let b = provider.fetch(&gc, &range()).unwrap().extract("Settle").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn weekdays_only() {
        let provider = SyntheticProvider::default();
        let spy = Resolver::default().resolve("SPY");
        let series = provider.fetch(&spy, &range()).unwrap().extract("Adj Close").unwrap();
        // January 2024 has 23 weekdays.
        assert_eq!(series.len(), 23);
        assert!(series.dates().iter().all(|d| !is_weekend(*d)));
    }

    #[test]
    fn table_shape_follows_vendor() {
        let provider = SyntheticProvider::default();
        let gc = provider
            .fetch(&Resolver::default().resolve("GC"), &range())
            .unwrap();
        assert!(gc.column_names().contains(&"Settle"));
        let spy = provider
            .fetch(&Resolver::default().resolve("SPY"), &range())
            .unwrap();
        assert!(spy.column_names().contains(&"Adj Close"));
    }

    #[test]
    fn open_range_uses_default_end() {
        let provider = SyntheticProvider::new(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        let range = DateRange::from_year(2024).unwrap();
        let table = provider
            .fetch(&Resolver::default().resolve("SI"), &range)
            .unwrap();
        // Jan 1-5 2024 is Monday to Friday.
        assert_eq!(table.height(), 5);
    }
}
