//! Instruments, the vendors that serve them, and requested date ranges.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Where an instrument's observations come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    /// Primary vendor: exchange futures and commodities (Quandl / Nasdaq Data Link).
    Quandl,
    /// Secondary vendor: equities and indices (Yahoo Finance).
    Yahoo,
    /// Offline random walk, never routed to by the resolver.
    Synthetic,
}

impl Vendor {
    pub fn as_str(self) -> &'static str {
        match self {
            Vendor::Quandl => "quandl",
            Vendor::Yahoo => "yahoo",
            Vendor::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An instrument code resolved to exactly one vendor.
///
/// `dataset` carries the vendor-side dataset code for primary-vendor products
/// (e.g. `GC` → `CHRIS/CME_GC1`); secondary-vendor instruments are requested
/// by their own code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub code: String,
    pub vendor: Vendor,
    pub dataset: Option<String>,
}

impl Instrument {
    /// The identifier sent to the vendor.
    pub fn request_code(&self) -> &str {
        self.dataset.as_deref().unwrap_or(&self.code)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("invalid date '{0}': expected YYYY or YYYY-MM-DD")]
    Unparseable(String),

    #[error("start {start} is after end {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

/// Requested observation window. A missing end means "up to the latest
/// observation the vendor has".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Result<Self, DateRangeError> {
        if let Some(end) = end {
            if start > end {
                return Err(DateRangeError::Inverted { start, end });
            }
        }
        Ok(Self { start, end })
    }

    /// Open-ended range starting on January 1st of `year`.
    pub fn from_year(year: i32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, 1, 1).map(|start| Self { start, end: None })
    }

    /// Parse CLI-style bounds. `start` may be a bare year (`2012`, meaning
    /// `2012-01-01`) or a full date; `end` must be a full date or a bare year
    /// (meaning December 31st of that year).
    pub fn parse(start: &str, end: Option<&str>) -> Result<Self, DateRangeError> {
        let start = parse_start(start)?;
        let end = end.map(parse_end).transpose()?;
        Self::new(start, end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && self.end.map_or(true, |end| date <= end)
    }

    /// Start formatted the way the primary vendor expects (`YYYY-MM-DD`).
    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_param(&self) -> Option<String> {
        self.end.map(|d| d.format("%Y-%m-%d").to_string())
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{} to {}", self.start, end),
            None => write!(f, "{} onwards", self.start),
        }
    }
}

/// `YYYY` → January 1st, `YYYY-MM-DD` → that day.
pub fn parse_start(raw: &str) -> Result<NaiveDate, DateRangeError> {
    parse_bound(raw, |year| NaiveDate::from_ymd_opt(year, 1, 1))
}

/// `YYYY` → December 31st, `YYYY-MM-DD` → that day.
pub fn parse_end(raw: &str) -> Result<NaiveDate, DateRangeError> {
    parse_bound(raw, |year| NaiveDate::from_ymd_opt(year, 12, 31))
}

fn parse_bound(
    raw: &str,
    from_year: impl Fn(i32) -> Option<NaiveDate>,
) -> Result<NaiveDate, DateRangeError> {
    let trimmed = raw.trim();
    let unparseable = || DateRangeError::Unparseable(raw.to_string());

    if trimmed.len() == 4 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = trimmed.parse().map_err(|_| unparseable())?;
        return from_year(year).ok_or_else(unparseable);
    }

    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| unparseable())?;
    // Guard against chrono accepting five-digit years.
    if !(1000..=9999).contains(&date.year()) {
        return Err(unparseable());
    }
    Ok(date)
}
