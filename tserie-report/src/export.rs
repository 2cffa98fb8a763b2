//! Artifact writers: chart CSVs, the aligned table as CSV or Parquet, and the
//! JSON manifest.
//!
//! Missing values (NaN, or no fitted value yet) are written as empty CSV
//! fields so spreadsheet tools and plotting libraries read them as gaps.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use polars::prelude::ParquetWriter;
use serde::{Deserialize, Serialize};

use tserie_core::analysis::PairRegression;
use tserie_core::domain::{AlignedTable, DateRange, TableView, Vendor};
use tserie_core::stats::{nan_from_null, AdfResult};

use crate::charts::{CorrelogramPlot, FittedPlot, JointPlot, VolatilityPlot};

pub const MANIFEST_FILE: &str = "manifest.json";

// ─── CSV ────────────────────────────────────────────────────────────

fn value(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.6}")
    } else {
        String::new()
    }
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// `date` followed by one column per instrument.
pub fn table_csv(table: &AlignedTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["date"];
    header.extend(table.column_names());
    wtr.write_record(&header)?;
    for (date, row) in table.rows() {
        let mut record = vec![date.to_string()];
        record.extend(row.into_iter().map(value));
        wtr.write_record(&record)?;
    }
    finish(wtr)
}

/// Scatter points plus the fitted value at each x.
///
/// Columns: date, x, y, fitted
pub fn joint_csv(plot: &JointPlot) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", plot.x.as_str(), plot.y.as_str(), "fitted"])?;
    for (date, x, y) in &plot.points {
        wtr.write_record([
            date.to_string(),
            value(*x),
            value(*y),
            value(plot.regression.predict(*x)),
        ])?;
    }
    finish(wtr)
}

/// Both marginal histograms of a joint plot.
///
/// Columns: axis, lower, upper, count
pub fn marginals_csv(plot: &JointPlot) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["axis", "lower", "upper", "count"])?;
    for (axis, hist) in [(&plot.x, &plot.x_marginal), (&plot.y, &plot.y_marginal)] {
        for (lo, hi, count) in hist.bins() {
            wtr.write_record([axis.clone(), value(lo), value(hi), count.to_string()])?;
        }
    }
    finish(wtr)
}

pub fn volatility_csv(plot: &VolatilityPlot) -> Result<String> {
    table_csv(&plot.table)
}

/// Columns: lag, acf, pacf, band
pub fn correlogram_csv(plot: &CorrelogramPlot) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["lag", "acf", "pacf", "band"])?;
    let band = value(plot.correlogram.band);
    for (lag, acf, pacf) in plot.bars() {
        wtr.write_record([lag.to_string(), value(acf), value(pacf), band.clone()])?;
    }
    finish(wtr)
}

/// In-sample rows first, then forecast rows with an empty `actual`.
///
/// Columns: date, actual, fitted, forecast
pub fn fitted_csv(plot: &FittedPlot) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "actual", "fitted", "forecast"])?;
    for ((date, actual), fitted) in plot.dates.iter().zip(&plot.actual).zip(&plot.fitted) {
        wtr.write_record([
            date.to_string(),
            value(*actual),
            fitted.map(value).unwrap_or_default(),
            String::new(),
        ])?;
    }
    for (date, forecast) in &plot.forecast {
        wtr.write_record([date.to_string(), String::new(), String::new(), value(*forecast)])?;
    }
    finish(wtr)
}

// ─── Parquet ────────────────────────────────────────────────────────

pub fn write_table_parquet(path: &Path, table: &AlignedTable) -> Result<()> {
    let mut df = table
        .to_dataframe()
        .context("failed to build aligned dataframe")?;
    let mut file = File::create(path)
        .with_context(|| format!("failed to create parquet file {}", path.display()))?;
    ParquetWriter::new(&mut file)
        .finish(&mut df)
        .context("failed to write aligned table parquet")?;
    Ok(())
}

// ─── Manifest ───────────────────────────────────────────────────────

/// BLAKE3 of the table's JSON form. Identical data hashes identically,
/// whatever the run directory or timestamp.
pub fn dataset_hash(table: &AlignedTable) -> Result<String> {
    let bytes = serde_json::to_vec(table).context("failed to serialize table for hashing")?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentEntry {
    pub code: String,
    pub vendor: Vendor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    /// Observations before alignment.
    pub raw_rows: usize,
}

/// Fit summary of a single-instrument run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub model: String,
    #[serde(deserialize_with = "nan_from_null")]
    pub mse: f64,
    pub nobs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dickey_fuller: Option<AdfResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub label: String,
    pub created_at: DateTime<Local>,
    pub range: DateRange,
    pub instruments: Vec<InstrumentEntry>,
    /// Rows in the aligned table.
    pub rows: usize,
    pub dataset_hash: String,
    /// Offline random-walk data rather than vendor data.
    pub synthetic: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regressions: Vec<PairRegression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit: Option<FitSummary>,
    /// Files written next to the manifest.
    pub files: Vec<String>,
}

pub fn write_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    let json =
        serde_json::to_string_pretty(manifest).context("failed to serialize run manifest")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write manifest to {}", path.display()))?;
    Ok(())
}

pub fn load_manifest(dir: &Path) -> Result<Manifest> {
    let path = dir.join(MANIFEST_FILE);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("failed to parse {}", path.display()))
}
