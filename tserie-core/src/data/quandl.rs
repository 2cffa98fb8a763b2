//! Primary vendor: Quandl / Nasdaq Data Link time-series datasets.
//!
//! One blocking GET per instrument:
//! `{base}/api/v3/datasets/{DATABASE}/{DATASET}/data.json?start_date=…&order=asc`
//! with optional `end_date` and `api_key`. Column names come from the
//! response, so a futures dataset yields `Open, High, Low, Last, Settle, …`.

use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

use super::provider::{DataProvider, FetchError, VendorTable};
use crate::config::{Credentials, VendorConfig};
use crate::domain::{DateRange, Instrument, Vendor};

#[derive(Debug, Deserialize)]
struct DataResponse {
    dataset_data: DatasetData,
}

#[derive(Debug, Deserialize)]
struct DatasetData {
    column_names: Vec<String>,
    data: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    quandl_error: QuandlError,
}

#[derive(Debug, Deserialize)]
struct QuandlError {
    code: String,
    message: String,
}

pub struct QuandlProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
}

impl QuandlProvider {
    pub fn new(credentials: &Credentials, vendors: &VendorConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(vendors.timeout_secs))
            .user_agent(concat!("tserie/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: vendors.quandl_base_url.trim_end_matches('/').to_string(),
            api_key: credentials.api_key().map(str::to_string),
        })
    }

    fn data_url(&self, dataset: &str) -> String {
        format!("{}/api/v3/datasets/{dataset}/data.json", self.base_url)
    }

    fn query(&self, range: &DateRange) -> Vec<(&'static str, String)> {
        let mut query = vec![("start_date", range.start_param()), ("order", "asc".into())];
        if let Some(end) = range.end_param() {
            query.push(("end_date", end));
        }
        if let Some(key) = &self.api_key {
            query.push(("api_key", key.clone()));
        }
        query
    }

    /// Parse a `data.json` body into a table for instrument `code`.
    pub fn parse_response(code: &str, body: &str) -> Result<VendorTable, FetchError> {
        let resp: DataResponse = match serde_json::from_str(body) {
            Ok(resp) => resp,
            Err(e) => {
                return Err(match serde_json::from_str::<ErrorResponse>(body) {
                    Ok(err) => vendor_error(code, err.quandl_error),
                    Err(_) => FetchError::ResponseFormatChanged {
                        vendor: Vendor::Quandl,
                        message: format!("failed to parse response for {code}: {e}"),
                    },
                });
            }
        };

        let DatasetData { column_names, data } = resp.dataset_data;
        let Some((date_name, value_names)) = column_names.split_first() else {
            return Err(FetchError::ResponseFormatChanged {
                vendor: Vendor::Quandl,
                message: "column_names is empty".into(),
            });
        };
        if !date_name.eq_ignore_ascii_case("date") {
            return Err(FetchError::ResponseFormatChanged {
                vendor: Vendor::Quandl,
                message: format!("first column is '{date_name}', expected Date"),
            });
        }

        let mut dates = Vec::with_capacity(data.len());
        let mut rows: Vec<Vec<Option<f64>>> = Vec::with_capacity(data.len());
        for row in &data {
            let date = row
                .first()
                .and_then(|v| v.as_str())
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                .ok_or_else(|| FetchError::ResponseFormatChanged {
                    vendor: Vendor::Quandl,
                    message: format!("row without a date: {row:?}"),
                })?;
            dates.push(date);
            rows.push(
                (1..=value_names.len())
                    .map(|j| row.get(j).and_then(serde_json::Value::as_f64))
                    .collect(),
            );
        }

        if dates.is_empty() {
            return Err(FetchError::Empty {
                vendor: Vendor::Quandl,
                code: code.to_string(),
            });
        }
        VendorTable::from_rows(code, Vendor::Quandl, value_names, &dates, &rows)
    }

    /// Map a non-2xx response to an error, preferring the vendor's own payload.
    pub fn parse_error(code: &str, status: u16, body: &str) -> FetchError {
        if let Ok(err) = serde_json::from_str::<ErrorResponse>(body) {
            return vendor_error(code, err.quandl_error);
        }
        match status {
            401 | 403 => FetchError::AuthenticationRequired {
                vendor: Vendor::Quandl,
                message: format!("HTTP {status}"),
            },
            404 => FetchError::SymbolNotFound {
                vendor: Vendor::Quandl,
                code: code.to_string(),
            },
            _ => FetchError::Http {
                vendor: Vendor::Quandl,
                code: code.to_string(),
                status,
            },
        }
    }
}

fn vendor_error(code: &str, err: QuandlError) -> FetchError {
    // QECx01/QECx02: unknown database or dataset. QEAx..: key problems.
    if err.code.starts_with("QECx0") {
        FetchError::SymbolNotFound {
            vendor: Vendor::Quandl,
            code: code.to_string(),
        }
    } else if err.code.starts_with("QEA") {
        FetchError::AuthenticationRequired {
            vendor: Vendor::Quandl,
            message: format!("{}: {}", err.code, err.message),
        }
    } else {
        FetchError::Vendor {
            vendor: Vendor::Quandl,
            message: format!("{}: {}", err.code, err.message),
        }
    }
}

impl DataProvider for QuandlProvider {
    fn name(&self) -> &str {
        "quandl"
    }

    fn vendor(&self) -> Vendor {
        Vendor::Quandl
    }

    fn fetch(&self, instrument: &Instrument, range: &DateRange) -> Result<VendorTable, FetchError> {
        let dataset = instrument.request_code();
        tracing::debug!(
            vendor = "quandl",
            code = %instrument.code,
            dataset,
            start = %range.start,
            end = ?range.end,
            "requesting dataset"
        );

        let resp = self
            .client
            .get(self.data_url(dataset))
            .query(&self.query(range))
            .send()
            .map_err(|e| FetchError::NetworkUnreachable {
                vendor: Vendor::Quandl,
                message: e.to_string(),
            })?;
        let status = resp.status();
        let body = resp.text().map_err(|e| FetchError::NetworkUnreachable {
            vendor: Vendor::Quandl,
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(Self::parse_error(&instrument.code, status.as_u16(), &body));
        }
        Self::parse_response(&instrument.code, &body)
    }
}
