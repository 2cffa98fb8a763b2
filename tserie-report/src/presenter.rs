//! The presenter: turns analysis objects into chart descriptions and
//! writes them out as one artifact directory per run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use tserie_core::analysis::{Correlogram, PairRegression};
use tserie_core::domain::{AlignedTable, DateRange, Instrument, TableView};
use tserie_core::stats::{AdfResult, ArModel, ArimaModel};
use tserie_core::{AutoRegressions, Batch, Pairs};

use crate::charts::{CorrelogramPlot, FittedPlot, JointPlot, VolatilityPlot};
use crate::export::{self, FitSummary, InstrumentEntry, Manifest, MANIFEST_FILE};

/// Default bucket count for joint-plot marginals.
pub const DEFAULT_BINS: usize = 30;

/// The model fitted in a single-instrument run.
#[derive(Debug, Clone)]
pub enum Fit {
    Ar { model: ArModel, horizon: usize },
    Arima(ArimaModel),
}

impl Fit {
    pub fn name(&self) -> String {
        match self {
            Fit::Ar { model, .. } => format!("AR({})", model.lag),
            Fit::Arima(m) => format!("ARIMA({}, {}, 0)", m.p, m.d),
        }
    }

    pub fn mse(&self) -> f64 {
        match self {
            Fit::Ar { model, .. } => model.mse(),
            Fit::Arima(m) => m.mse(),
        }
    }

    fn nobs(&self) -> usize {
        match self {
            Fit::Ar { model, .. } => model.nobs,
            Fit::Arima(m) => m.ar.nobs,
        }
    }

    pub fn plot(&self, auto: &AutoRegressions) -> FittedPlot {
        match self {
            Fit::Ar { model, horizon } => FittedPlot::from_ar(auto.series(), model, *horizon),
            Fit::Arima(m) => FittedPlot::from_arima(auto.series(), m),
        }
    }
}

/// Where a run's artifacts went and what the manifest says about them.
#[derive(Debug, Clone)]
pub struct Report {
    pub dir: PathBuf,
    pub manifest: Manifest,
}

/// Files collected under one run directory.
struct Bundle {
    dir: PathBuf,
    files: Vec<String>,
}

impl Bundle {
    fn write(&mut self, name: &str, contents: String) -> Result<()> {
        let path = self.dir.join(name);
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        self.files.push(name.to_string());
        Ok(())
    }

    fn parquet(&mut self, name: &str, table: &AlignedTable) -> Result<()> {
        export::write_table_parquet(&self.dir.join(name), table)?;
        self.files.push(name.to_string());
        Ok(())
    }
}

/// Writes chart-ready artifacts for `Batch`, `Pairs` and `AutoRegressions`.
///
/// Each run creates `{label}_{timestamp}/` under the output directory with
/// one CSV per chart and a `manifest.json`.
#[derive(Debug, Clone)]
pub struct Presenter {
    output_dir: PathBuf,
    parquet: bool,
    synthetic: bool,
    bins: usize,
}

impl Presenter {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            parquet: false,
            synthetic: false,
            bins: DEFAULT_BINS,
        }
    }

    /// Also write the aligned table as `table.parquet`.
    pub fn with_parquet(mut self, parquet: bool) -> Self {
        self.parquet = parquet;
        self
    }

    /// Flag the data as synthetic in every manifest.
    pub fn with_synthetic(mut self, synthetic: bool) -> Self {
        self.synthetic = synthetic;
        self
    }

    pub fn with_histogram_bins(mut self, bins: usize) -> Self {
        self.bins = bins.max(1);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Price table of a batch.
    pub fn present_batch(&self, batch: &Batch) -> Result<Report> {
        let mut bundle = self.open(&batch.codes().join("-"))?;
        bundle.write("prices.csv", export::table_csv(batch.table())?)?;
        self.close(bundle, batch, Vec::new(), None)
    }

    /// Joint plots and rolling volatility for both tables of a pair.
    pub fn present_pairs(&self, pairs: &Pairs, window: usize) -> Result<Report> {
        let regressions = pairs.correlate().context("pair regression failed")?;
        let mut bundle = self.open(&format!("{}-{}", pairs.x(), pairs.y()))?;
        bundle.write("prices.csv", export::table_csv(pairs.prices())?)?;
        bundle.write("returns.csv", export::table_csv(pairs.returns())?)?;

        for (fit, (name, table)) in regressions.iter().zip(pairs.tables()) {
            let plot = JointPlot::new(table, fit, self.bins)
                .with_context(|| format!("failed to build {name} joint plot"))?;
            bundle.write(&format!("joint_{name}.csv"), export::joint_csv(&plot)?)?;
            bundle.write(
                &format!("joint_{name}_marginals.csv"),
                export::marginals_csv(&plot)?,
            )?;
        }
        for (name, table) in pairs.volatility(window) {
            let plot = VolatilityPlot::new(name, window, table);
            bundle.write(
                &format!("volatility_{name}.csv"),
                export::volatility_csv(&plot)?,
            )?;
        }

        self.close(bundle, pairs.batch(), regressions, None)
    }

    /// Correlogram and fitted-versus-actual overlay for one instrument.
    pub fn present_auto(
        &self,
        auto: &AutoRegressions,
        correlogram: Correlogram,
        fit: &Fit,
        dickey_fuller: Option<AdfResult>,
    ) -> Result<Report> {
        let code = auto.instrument().code.as_str();
        let series = auto.series();
        let table = AlignedTable::new(
            series.dates().to_vec(),
            vec![(code.to_string(), series.values().to_vec())],
        )
        .context("failed to tabulate series")?;

        let mut bundle = self.open(code)?;
        bundle.write("prices.csv", export::table_csv(&table)?)?;
        let correlogram = CorrelogramPlot::new(code, correlogram);
        bundle.write("correlogram.csv", export::correlogram_csv(&correlogram)?)?;
        bundle.write("fitted.csv", export::fitted_csv(&fit.plot(auto))?)?;

        let summary = FitSummary {
            model: fit.name(),
            mse: fit.mse(),
            nobs: fit.nobs(),
            dickey_fuller,
        };
        let raw_lengths = [(code.to_string(), series.len())];
        let source = Source {
            instruments: std::slice::from_ref(auto.instrument()),
            raw_lengths: &raw_lengths,
            range: *auto.range(),
            table: &table,
        };
        self.finish(bundle, source, Vec::new(), Some(summary))
    }

    /// A fresh run directory. Runs that land on the same millisecond get a
    /// numeric suffix instead of sharing a bundle.
    fn open(&self, label: &str) -> Result<Bundle> {
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("failed to create output dir: {}", self.output_dir.display())
        })?;
        let stem = format!(
            "{}_{}",
            sanitize(label),
            Local::now().format("%Y%m%d_%H%M%S_%3f")
        );
        let mut dir = self.output_dir.join(&stem);
        let mut attempt = 1;
        loop {
            match std::fs::create_dir(&dir) {
                Ok(()) => break,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    dir = self.output_dir.join(format!("{stem}_{attempt}"));
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("failed to create artifact dir: {}", dir.display())
                    })
                }
            }
        }
        Ok(Bundle {
            dir,
            files: Vec::new(),
        })
    }

    fn close(
        &self,
        bundle: Bundle,
        batch: &Batch,
        regressions: Vec<PairRegression>,
        fit: Option<FitSummary>,
    ) -> Result<Report> {
        let source = Source {
            instruments: batch.instruments(),
            raw_lengths: batch.raw_lengths(),
            range: *batch.range(),
            table: batch.table(),
        };
        self.finish(bundle, source, regressions, fit)
    }

    fn finish(
        &self,
        mut bundle: Bundle,
        source: Source<'_>,
        regressions: Vec<PairRegression>,
        fit: Option<FitSummary>,
    ) -> Result<Report> {
        if self.parquet {
            bundle.parquet("table.parquet", source.table)?;
        }
        let label = bundle
            .dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let manifest = Manifest {
            label,
            created_at: Local::now(),
            range: source.range,
            instruments: source
                .instruments
                .iter()
                .zip(source.raw_lengths)
                .map(|(inst, (_, raw_rows))| InstrumentEntry {
                    code: inst.code.clone(),
                    vendor: inst.vendor,
                    dataset: inst.dataset.clone(),
                    raw_rows: *raw_rows,
                })
                .collect(),
            rows: source.table.len(),
            dataset_hash: export::dataset_hash(source.table)?,
            synthetic: self.synthetic,
            regressions,
            fit,
            files: bundle.files.clone(),
        };
        export::write_manifest(&bundle.dir.join(MANIFEST_FILE), &manifest)?;
        Ok(Report {
            dir: bundle.dir,
            manifest,
        })
    }
}

struct Source<'a> {
    instruments: &'a [Instrument],
    raw_lengths: &'a [(String, usize)],
    range: DateRange,
    table: &'a AlignedTable,
}

/// Instrument codes may carry `^`, `=` or `/`; keep directory names plain.
fn sanitize(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
