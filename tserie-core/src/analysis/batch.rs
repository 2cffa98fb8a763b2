use chrono::NaiveDate;

use crate::data::{align, AlignPolicy, FetchedSeries, RemoteFetcher};
use crate::domain::{AlignedTable, DateRange, Instrument, TableView};
use crate::error::AnalysisError;

/// Several instruments fetched over one range and aligned by date.
#[derive(Debug, Clone)]
pub struct Batch {
    instruments: Vec<Instrument>,
    range: DateRange,
    /// Observations per instrument before alignment.
    raw_lengths: Vec<(String, usize)>,
    table: AlignedTable,
}

impl Batch {
    /// One fetch per code, in order, then alignment.
    pub fn fetch<S: AsRef<str>>(
        fetcher: &RemoteFetcher,
        codes: &[S],
        range: DateRange,
        policy: AlignPolicy,
    ) -> Result<Self, AnalysisError> {
        let fetched = fetcher.fetch_all(codes, &range)?;
        Self::from_fetched(fetched, range, policy)
    }

    pub fn from_fetched(
        fetched: Vec<FetchedSeries>,
        range: DateRange,
        policy: AlignPolicy,
    ) -> Result<Self, AnalysisError> {
        let raw_lengths = fetched
            .iter()
            .map(|f| (f.instrument.code.clone(), f.series.len()))
            .collect();
        let (instruments, series): (Vec<_>, Vec<_>) = fetched
            .into_iter()
            .map(|f| (f.instrument, f.series))
            .unzip();
        let table = align(&series, policy)?;
        Ok(Self {
            instruments,
            range,
            raw_lengths,
            table,
        })
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn codes(&self) -> Vec<&str> {
        self.instruments.iter().map(|i| i.code.as_str()).collect()
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }

    pub fn raw_lengths(&self) -> &[(String, usize)] {
        &self.raw_lengths
    }

    pub fn table(&self) -> &AlignedTable {
        &self.table
    }
}

impl TableView for Batch {
    fn dates(&self) -> &[NaiveDate] {
        self.table.dates()
    }

    fn column(&self, name: &str) -> Option<&[f64]> {
        self.table.column(name)
    }

    fn column_names(&self) -> Vec<&str> {
        self.table.column_names()
    }

    fn head(&self, n: usize) -> AlignedTable {
        self.table.head(n)
    }

    fn rolling_std(&self, window: usize) -> AlignedTable {
        self.table.rolling_std(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TserieConfig;
    use crate::domain::Vendor;

    #[test]
    fn fetches_and_aligns_in_request_order() {
        let fetcher = RemoteFetcher::synthetic(&TserieConfig::default());
        let range = DateRange::parse("2024-01-01", Some("2024-03-31")).unwrap();
        let batch = Batch::fetch(&fetcher, &["SI", "GC", "SPY"], range, AlignPolicy::Inner).unwrap();
        assert_eq!(batch.column_names(), vec!["SI", "GC", "SPY"]);
        assert_eq!(batch.instruments()[2].vendor, Vendor::Yahoo);
        assert!(batch.raw_lengths().iter().all(|(_, n)| *n == batch.len()));
        assert_eq!(batch.head(5).len(), 5);
    }

    #[test]
    fn empty_request_is_an_error() {
        let fetcher = RemoteFetcher::synthetic(&TserieConfig::default());
        let range = DateRange::from_year(2024).unwrap();
        let codes: [&str; 0] = [];
        assert!(Batch::fetch(&fetcher, &codes, range, AlignPolicy::Inner).is_err());
    }
}
