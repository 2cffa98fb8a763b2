//! Artifact directories written from offline data.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tempfile::TempDir;
use tserie_core::data::{AlignPolicy, Resolver, StaticProvider, VendorTable, DEFAULT_PRICE_COLUMNS};
use tserie_core::domain::{DateRange, TableView, Transform, Vendor};
use tserie_core::{AutoRegressions, Batch, Pairs, RemoteFetcher, TserieConfig};
use tserie_report::{load_manifest, Fit, Presenter};

fn fetcher() -> RemoteFetcher {
    RemoteFetcher::synthetic(&TserieConfig::default())
}

fn range() -> DateRange {
    DateRange::parse("2012", Some("2013")).unwrap()
}

#[test]
fn batch_writes_prices_and_manifest() {
    let tmp = TempDir::new().unwrap();
    let batch = Batch::fetch(&fetcher(), &["GC", "SI", "CL"], range(), AlignPolicy::Inner).unwrap();
    let report = Presenter::new(tmp.path())
        .with_synthetic(true)
        .present_batch(&batch)
        .unwrap();

    assert!(report.dir.starts_with(tmp.path()));
    assert!(report.dir.join("prices.csv").exists());
    assert!(report
        .dir
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("GC-SI-CL_"));

    let manifest = load_manifest(&report.dir).unwrap();
    assert_eq!(manifest, report.manifest);
    assert_eq!(manifest.instruments.len(), 3);
    assert_eq!(manifest.instruments[0].vendor, Vendor::Quandl);
    assert_eq!(manifest.rows, batch.table().dates().len());
    assert!(manifest.synthetic);

    let csv = std::fs::read_to_string(report.dir.join("prices.csv")).unwrap();
    assert_eq!(csv.lines().next().unwrap(), "date,GC,SI,CL");
    assert_eq!(csv.lines().count(), manifest.rows + 1);
}

#[test]
fn pair_run_has_joint_and_volatility_charts() {
    let tmp = TempDir::new().unwrap();
    let pairs = Pairs::fetch(
        &fetcher(),
        &["GC", "SPY"],
        range(),
        AlignPolicy::Inner,
        Transform::PctChange,
    )
    .unwrap();
    let report = Presenter::new(tmp.path())
        .with_parquet(true)
        .present_pairs(&pairs, 20)
        .unwrap();

    for file in [
        "prices.csv",
        "returns.csv",
        "joint_price.csv",
        "joint_price_marginals.csv",
        "joint_returns.csv",
        "joint_returns_marginals.csv",
        "volatility_price.csv",
        "volatility_returns.csv",
        "table.parquet",
    ] {
        assert!(report.dir.join(file).exists(), "missing {file}");
        assert!(report.manifest.files.iter().any(|f| f == file));
    }
    assert_eq!(report.manifest.regressions.len(), 2);
    assert_eq!(report.manifest.instruments[1].vendor, Vendor::Yahoo);

    let joint = std::fs::read_to_string(report.dir.join("joint_price.csv")).unwrap();
    assert_eq!(joint.lines().next().unwrap(), "date,GC,SPY,fitted");
}

#[test]
fn same_data_hashes_the_same_across_runs() {
    let batch = Batch::fetch(&fetcher(), &["GC", "SI"], range(), AlignPolicy::Inner).unwrap();
    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();
    let first = Presenter::new(a.path()).present_batch(&batch).unwrap();
    let second = Presenter::new(b.path()).present_batch(&batch).unwrap();
    assert_eq!(first.manifest.dataset_hash, second.manifest.dataset_hash);
}

#[test]
fn auto_run_writes_correlogram_and_fit() {
    let tmp = TempDir::new().unwrap();
    let auto = AutoRegressions::fetch(&fetcher(), "CL", range()).unwrap();
    let correlogram = auto.autocorr(20).unwrap();
    let fit = Fit::Arima(auto.arima(2, 1, 10).unwrap());
    let adf = auto.dickey_fuller().unwrap();

    let report = Presenter::new(tmp.path())
        .present_auto(&auto, correlogram, &fit, Some(adf))
        .unwrap();

    let summary = report.manifest.fit.as_ref().unwrap();
    assert_eq!(summary.model, "ARIMA(2, 1, 0)");
    assert!(summary.dickey_fuller.is_some());

    let fitted = std::fs::read_to_string(report.dir.join("fitted.csv")).unwrap();
    // Header, one row per observation, ten forecast rows.
    assert_eq!(fitted.lines().count(), 1 + auto.series().len() + 10);
    let correlogram = std::fs::read_to_string(report.dir.join("correlogram.csv")).unwrap();
    assert_eq!(correlogram.lines().count(), 1 + 21);
}

fn settle_table(code: &str, dates: &[NaiveDate], values: &[f64]) -> VendorTable {
    let rows: Vec<Vec<Option<f64>>> = values.iter().map(|v| vec![Some(*v)]).collect();
    VendorTable::from_rows(code, Vendor::Quandl, &["Settle".to_string()], dates, &rows).unwrap()
}

#[test]
fn exact_fit_manifest_loads_back() {
    let start = NaiveDate::from_ymd_opt(2012, 1, 2).unwrap();
    let dates: Vec<NaiveDate> = (0..40).map(|i| start + Duration::days(i)).collect();
    let gold: Vec<f64> = (0..40).map(|i| 1600.0 + (i as f64 * 0.9).sin() * 25.0).collect();
    let silver: Vec<f64> = gold.iter().map(|v| v * 2.0).collect();
    let provider = StaticProvider::new()
        .with_table(settle_table("GC", &dates, &gold))
        .with_table(settle_table("SI", &dates, &silver));
    let fetcher = RemoteFetcher::with_provider(
        Resolver::default(),
        Arc::new(provider),
        DEFAULT_PRICE_COLUMNS.iter().map(|c| c.to_string()).collect(),
    );
    let pairs = Pairs::fetch(
        &fetcher,
        &["GC", "SI"],
        range(),
        AlignPolicy::Inner,
        Transform::PctChange,
    )
    .unwrap();

    let tmp = TempDir::new().unwrap();
    let report = Presenter::new(tmp.path()).present_pairs(&pairs, 5).unwrap();
    assert!(report
        .manifest
        .regressions
        .iter()
        .all(|fit| fit.regression.t_stat.is_infinite()));

    let manifest = load_manifest(&report.dir).unwrap();
    assert_eq!(manifest.regressions.len(), 2);
    for fit in &manifest.regressions {
        assert!(fit.regression.t_stat.is_nan());
        let slope = if fit.table == "price" { 2.0 } else { 1.0 };
        assert_eq!(fit.regression.slope, slope);
    }
    assert_eq!(manifest.dataset_hash, report.manifest.dataset_hash);
}
