//! Secondary vendor: Yahoo Finance v8 chart API.
//!
//! Yahoo has no official API and changes its format without notice, so every
//! structural surprise surfaces as `FetchError::ResponseFormatChanged`. One
//! request per instrument, no retry.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::time::Duration;

use super::provider::{DataProvider, FetchError, VendorTable};
use crate::config::VendorConfig;
use crate::domain::{DateRange, Instrument, Vendor};

/// Column names of a Yahoo-shaped table, in order.
pub const YAHOO_COLUMNS: [&str; 6] = ["Open", "High", "Low", "Close", "Adj Close", "Volume"];

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(vendors: &VendorConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(vendors.timeout_secs))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: vendors.yahoo_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{symbol}", self.base_url)
    }

    /// `period1`/`period2` cover whole days; an open end means today.
    fn query(range: &DateRange, today: NaiveDate) -> Vec<(&'static str, String)> {
        let start_ts = range.start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let end = range.end.unwrap_or(today);
        let end_ts = end.and_time(NaiveTime::MIN).and_utc().timestamp() + 86_399;
        vec![
            ("period1", start_ts.to_string()),
            ("period2", end_ts.to_string()),
            ("interval", "1d".into()),
            ("includeAdjustedClose", "true".into()),
        ]
    }

    /// Parse a chart API body into a Yahoo-shaped table for `code`.
    pub fn parse_response(code: &str, body: &str) -> Result<VendorTable, FetchError> {
        let format_changed = |message: String| FetchError::ResponseFormatChanged {
            vendor: Vendor::Yahoo,
            message,
        };

        let resp: ChartResponse = serde_json::from_str(body)
            .map_err(|e| format_changed(format!("failed to parse response for {code}: {e}")))?;

        let result = match (resp.chart.result, resp.chart.error) {
            (Some(result), _) => result,
            (None, Some(err)) if err.code == "Not Found" => {
                return Err(FetchError::SymbolNotFound {
                    vendor: Vendor::Yahoo,
                    code: code.to_string(),
                })
            }
            (None, Some(err)) => {
                return Err(FetchError::Vendor {
                    vendor: Vendor::Yahoo,
                    message: format!("{}: {}", err.code, err.description),
                })
            }
            (None, None) => return Err(format_changed("empty result with no error".into())),
        };

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| format_changed("result array is empty".into()))?;
        let Some(timestamps) = data.timestamp else {
            // Valid symbol, nothing traded in range.
            return Err(FetchError::Empty {
                vendor: Vendor::Yahoo,
                code: code.to_string(),
            });
        };
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| format_changed("no quote data".into()))?;
        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose)
            .unwrap_or_default();

        // Timestamps mark the session open in UTC; the trading date is the
        // exchange's local date.
        let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
        let at = |col: &[Option<f64>], i: usize| col.get(i).copied().flatten();
        let mut dates = Vec::with_capacity(timestamps.len());
        let mut rows = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| format_changed(format!("invalid timestamp: {ts}")))?;
            let row = vec![
                at(&quote.open, i),
                at(&quote.high, i),
                at(&quote.low, i),
                at(&quote.close, i),
                at(&adj_closes, i),
                at(&quote.volume, i),
            ];
            // Holidays come back as all-null rows.
            if row.iter().all(Option::is_none) {
                continue;
            }
            dates.push(date);
            rows.push(row);
        }

        if dates.is_empty() {
            return Err(FetchError::Empty {
                vendor: Vendor::Yahoo,
                code: code.to_string(),
            });
        }
        let columns: Vec<String> = YAHOO_COLUMNS.iter().map(|c| c.to_string()).collect();
        VendorTable::from_rows(code, Vendor::Yahoo, &columns, &dates, &rows)
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn vendor(&self) -> Vendor {
        Vendor::Yahoo
    }

    fn fetch(&self, instrument: &Instrument, range: &DateRange) -> Result<VendorTable, FetchError> {
        let symbol = instrument.request_code();
        tracing::debug!(
            vendor = "yahoo",
            code = symbol,
            start = %range.start,
            end = ?range.end,
            "requesting chart"
        );

        let today = chrono::Utc::now().date_naive();
        let resp = self
            .client
            .get(self.chart_url(symbol))
            .query(&Self::query(range, today))
            .send()
            .map_err(|e| FetchError::NetworkUnreachable {
                vendor: Vendor::Yahoo,
                message: e.to_string(),
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::AuthenticationRequired {
                vendor: Vendor::Yahoo,
                message: format!("HTTP {status}"),
            });
        }
        let body = resp.text().map_err(|e| FetchError::NetworkUnreachable {
            vendor: Vendor::Yahoo,
            message: e.to_string(),
        })?;
        // A 404 still carries the chart error payload.
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::Http {
                vendor: Vendor::Yahoo,
                code: instrument.code.clone(),
                status: status.as_u16(),
            });
        }
        Self::parse_response(&instrument.code, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"chart":{"result":[{
        "meta":{"symbol":"SPY"},
        "timestamp":[1704205800,1704292200,1704378600],
        "indicators":{
            "quote":[{"open":[472.16,470.43,null],"high":[473.67,471.19,null],
                      "low":[470.49,468.17,null],"close":[472.65,468.79,null],
                      "volume":[123623700,103585900,null]}],
            "adjclose":[{"adjclose":[466.72,462.91,null]}]}}],"error":null}}"#;

    #[test]
    fn parses_chart_and_skips_empty_rows() {
        let table = YahooProvider::parse_response("SPY", BODY).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.column_names(), YAHOO_COLUMNS.to_vec());
        let adj = table.extract("Adj Close").unwrap();
        assert_eq!(adj.values(), &[466.72, 462.91]);
        assert_eq!(adj.first_date(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn dates_follow_the_exchange_offset() {
        // ASX session for Tue 2024-01-02 opens at 23:00 UTC on Monday.
        let body = r#"{"chart":{"result":[{
            "meta":{"symbol":"BHP.AX","gmtoffset":39600},
            "timestamp":[1704150000],
            "indicators":{"quote":[{"close":[45.2]}],"adjclose":[{"adjclose":[44.9]}]}}],
            "error":null}}"#;
        let table = YahooProvider::parse_response("BHP.AX", body).unwrap();
        let adj = table.extract("Adj Close").unwrap();
        assert_eq!(adj.first_date(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn not_found_error_payload() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(matches!(
            YahooProvider::parse_response("NOPE", body),
            Err(FetchError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn missing_timestamps_means_empty() {
        let body = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(matches!(
            YahooProvider::parse_response("SPY", body),
            Err(FetchError::Empty { .. })
        ));
    }

    #[test]
    fn query_spans_whole_days() {
        let range = DateRange::parse("2024-01-02", Some("2024-01-02")).unwrap();
        let today = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let query = YahooProvider::query(&range, today);
        assert_eq!(query[0], ("period1", "1704153600".to_string()));
        assert_eq!(query[1], ("period2", "1704239999".to_string()));
    }
}
