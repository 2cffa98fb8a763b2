//! tserie report: chart-ready artifacts for aligned series.
//!
//! Rendering is left to whatever plotting tool reads the output. This crate
//! decides which series feed which chart and writes them down:
//! - `charts`: joint regression plots, rolling volatility, correlograms,
//!   fitted-versus-actual overlays
//! - `export`: CSV, Parquet and manifest writers
//! - `presenter`: one artifact directory per run

pub mod charts;
pub mod export;
pub mod presenter;

pub use charts::{CorrelogramPlot, FittedPlot, JointPlot, VolatilityPlot};
pub use export::{load_manifest, Manifest};
pub use presenter::{Fit, Presenter, Report};
