//! tserie CLI: fetch, align and compare daily financial time series.
//!
//! Commands:
//! - `plot`: align several instruments and show the head of the table
//! - `corr`: regress one instrument on another, prices and returns
//! - `auto`: correlogram, AR/ARIMA fit and Dickey-Fuller for one instrument
//! - `connect`: `corr` with the older positional `X Y YEAR` arguments

mod error;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tserie_core::analysis::PairRegression;
use tserie_core::domain::{AlignedTable, DateRange, TableView};
use tserie_core::{AlignPolicy, AutoRegressions, Batch, Pairs, RemoteFetcher, TserieConfig};
use tserie_report::{Fit, Presenter, Report};

use crate::error::CliError;

/// Rows shown by `plot`.
const HEAD_ROWS: usize = 5;

#[derive(Parser)]
#[command(
    name = "tserie",
    about = "Futures and equity time series, aligned by date"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file. Defaults to ./tserie.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for artifact bundles.
    #[arg(long, global = true, default_value = "results")]
    output_dir: PathBuf,

    /// Fail when instruments do not share exactly the same dates.
    #[arg(long, global = true, default_value_t = false)]
    strict: bool,

    /// Offline random-walk data instead of the vendors.
    #[arg(long, global = true, default_value_t = false)]
    synthetic: bool,

    /// Also write the aligned table as Parquet.
    #[arg(long, global = true, default_value_t = false)]
    parquet: bool,

    /// -v for info, -vv for debug. RUST_LOG applies when absent.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Align several instruments on one date axis.
    Plot {
        /// Whitespace-separated codes, e.g. "GC SI CL".
        #[arg(short, long)]
        instruments: String,

        /// Start date, YYYY or YYYY-MM-DD.
        #[arg(short, long)]
        start: String,

        /// End date, YYYY or YYYY-MM-DD. Defaults to the latest available.
        #[arg(short, long)]
        end: Option<String>,
    },
    /// Regress Y on X for prices and returns, plus rolling volatility.
    Corr {
        x: String,
        y: String,

        #[arg(short, long)]
        start: String,

        #[arg(short, long)]
        end: Option<String>,

        /// Rolling volatility window. Defaults to the configured window.
        #[arg(short, long)]
        window: Option<usize>,
    },
    /// Autocorrelation and autoregression of one instrument.
    Auto {
        instrument: String,

        #[arg(short, long)]
        start: String,

        #[arg(short, long)]
        end: Option<String>,

        /// AR order. Chosen by AIC when absent.
        #[arg(short, long)]
        lag: Option<usize>,

        /// Forecast steps past the last observation.
        #[arg(long, default_value_t = 10)]
        horizon: usize,

        /// Difference order; fits ARIMA(lag, diff, 0) when given.
        #[arg(long)]
        diff: Option<usize>,
    },
    /// Positional form of `corr`: X Y START_YEAR.
    Connect { x: String, y: String, year: String },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(error.exit_code());
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Shared state every command needs.
struct Context {
    config: TserieConfig,
    fetcher: RemoteFetcher,
    presenter: Presenter,
    policy: AlignPolicy,
}

impl Context {
    fn new(cli: &Cli) -> Result<Self, CliError> {
        let config = TserieConfig::load(cli.config.as_deref())
            .map_err(tserie_core::AnalysisError::from)?;
        let fetcher = if cli.synthetic {
            RemoteFetcher::synthetic(&config)
        } else {
            RemoteFetcher::from_config(&config)?
        };
        let presenter = Presenter::new(&cli.output_dir)
            .with_parquet(cli.parquet)
            .with_synthetic(cli.synthetic)
            .with_histogram_bins(config.analysis.histogram_bins);
        let policy = if cli.strict {
            AlignPolicy::Strict
        } else {
            config.analysis.align
        };
        tracing::debug!(synthetic = cli.synthetic, policy = ?policy, "cli context ready");
        Ok(Self {
            config,
            fetcher,
            presenter,
            policy,
        })
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = Context::new(&cli)?;
    match cli.command {
        Commands::Plot {
            instruments,
            start,
            end,
        } => {
            let codes: Vec<&str> = instruments.split_whitespace().collect();
            if codes.is_empty() {
                return Err(CliError::Usage("--instruments needs at least one code".into()));
            }
            let range = DateRange::parse(&start, end.as_deref())?;
            run_plot(&ctx, &codes, range)
        }
        Commands::Corr {
            x,
            y,
            start,
            end,
            window,
        } => {
            let range = DateRange::parse(&start, end.as_deref())?;
            run_corr(&ctx, &x, &y, range, window)
        }
        Commands::Connect { x, y, year } => {
            let range = DateRange::parse(&year, None)?;
            run_corr(&ctx, &x, &y, range, None)
        }
        Commands::Auto {
            instrument,
            start,
            end,
            lag,
            horizon,
            diff,
        } => {
            let range = DateRange::parse(&start, end.as_deref())?;
            run_auto(&ctx, &instrument, range, lag, horizon, diff)
        }
    }
}

fn run_plot(ctx: &Context, codes: &[&str], range: DateRange) -> Result<(), CliError> {
    let batch = Batch::fetch(&ctx.fetcher, codes, range, ctx.policy)?;
    println!();
    println!("=== {} ({range}) ===", batch.codes().join(" "));
    print_table(&batch.head(HEAD_ROWS));
    println!("{} aligned rows", batch.len());

    let report = ctx.presenter.present_batch(&batch)?;
    print_report(&report);
    Ok(())
}

fn run_corr(
    ctx: &Context,
    x: &str,
    y: &str,
    range: DateRange,
    window: Option<usize>,
) -> Result<(), CliError> {
    if x == y {
        return Err(CliError::Usage(format!("cannot compare {x} with itself")));
    }
    let window = window.unwrap_or(ctx.config.analysis.rolling_window);
    if window < 2 {
        return Err(CliError::Usage("--window must be at least 2".into()));
    }
    let pairs = Pairs::fetch(
        &ctx.fetcher,
        &[x, y],
        range,
        ctx.policy,
        ctx.config.analysis.returns,
    )?;

    println!();
    println!("=== {y} on {x} ({range}) ===");
    println!(
        "Rows:           {} prices, {} {}",
        pairs.prices().len(),
        pairs.returns().len(),
        pairs.transform().label()
    );
    if !pairs.check_equal_lengths() {
        for (code, n) in pairs.batch().raw_lengths() {
            println!("  {code}: {n} observations before alignment");
        }
    }

    let report = ctx.presenter.present_pairs(&pairs, window)?;
    for fit in &report.manifest.regressions {
        print_regression(fit);
    }
    print_report(&report);
    Ok(())
}

fn run_auto(
    ctx: &Context,
    code: &str,
    range: DateRange,
    lag: Option<usize>,
    horizon: usize,
    diff: Option<usize>,
) -> Result<(), CliError> {
    let auto = AutoRegressions::fetch(&ctx.fetcher, code, range)?;
    let correlogram = auto.autocorr(ctx.config.analysis.nlags)?;
    let fit = match diff {
        Some(d) => Fit::Arima(auto.arima(lag.unwrap_or(1), d, horizon)?),
        None => Fit::Ar {
            model: auto.autoregress(lag)?,
            horizon,
        },
    };
    let adf = auto.dickey_fuller()?;
    let stationary = auto.make_stationary(None)?;

    println!();
    println!("=== {code} ({range}) ===");
    println!("Observations:   {}", auto.series().len());
    println!("Column:         {}", auto.series().column());
    println!();
    println!("--- Correlogram ---");
    println!("Band (95%):     ±{:.4}", correlogram.band);
    for (lag, (a, p)) in correlogram
        .acf
        .iter()
        .zip(&correlogram.pacf)
        .enumerate()
        .skip(1)
        .take(5)
    {
        println!("  lag {lag:<3}      acf {a:>7.4}   pacf {p:>7.4}");
    }
    println!();
    println!("--- {} ---", fit.name());
    println!("MSE:            {:.6}", fit.mse());
    println!();
    println!("--- Dickey-Fuller ---");
    println!("Statistic:      {:.4}", adf.statistic);
    println!("p-value:        {:.4}", adf.p_value);
    println!(
        "Critical:       1% {:.3}  5% {:.3}  10% {:.3}",
        adf.critical_values.one_pct, adf.critical_values.five_pct, adf.critical_values.ten_pct
    );
    let steps: Vec<&str> = stationary.steps.iter().map(|t| t.label()).collect();
    println!(
        "Stationary via: {} (p = {:.4})",
        if steps.is_empty() {
            "levels".to_string()
        } else {
            steps.join(" → ")
        },
        stationary.adf.p_value
    );

    let report = ctx
        .presenter
        .present_auto(&auto, correlogram, &fit, Some(adf))?;
    print_report(&report);
    Ok(())
}

fn print_table(table: &AlignedTable) {
    let names = table.column_names();
    print!("{:<12}", "Date");
    for name in &names {
        print!("{name:>14}");
    }
    println!();
    for (date, row) in table.rows() {
        print!("{:<12}", date.to_string());
        for v in row {
            print!("{v:>14.4}");
        }
        println!();
    }
}

fn print_regression(fit: &PairRegression) {
    let r = &fit.regression;
    println!();
    println!("--- {} ---", fit.table);
    println!("n:              {}", r.n);
    println!("Slope:          {:.6} (se {:.6})", r.slope, r.slope_stderr);
    println!("Intercept:      {:.6}", r.intercept);
    println!("r:              {:.4}", r.r);
    println!("R²:             {:.4}", r.r_squared);
    println!("p-value:        {:.4}", r.p_value);
}

fn print_report(report: &Report) {
    println!();
    println!("Dataset hash:   {}", report.manifest.dataset_hash);
    println!("Artifacts saved to: {}", report.dir.display());
}
