//! Domain types: instruments, ranges, series and aligned tables.

pub mod instrument;
pub mod series;
pub mod table;

pub use instrument::{parse_end, parse_start, DateRange, DateRangeError, Instrument, Vendor};
pub use series::{DerivedSeries, Series, SeriesError, Transform};
pub use table::{AlignedTable, TableView, DATE_COLUMN};
