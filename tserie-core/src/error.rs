//! Crate-level error aggregating every failure the analysis path can hit.

use thiserror::Error;

use crate::config::ConfigError;
use crate::data::align::AlignError;
use crate::data::provider::FetchError;
use crate::domain::series::SeriesError;
use crate::stats::StatsError;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Align(#[from] AlignError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error("expected {expected} instruments, got {got}")]
    InstrumentCount { expected: usize, got: usize },
}
