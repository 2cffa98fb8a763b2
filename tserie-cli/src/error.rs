use thiserror::Error;
use tserie_core::domain::DateRangeError;
use tserie_core::AnalysisError;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    /// Arguments clap accepted but that make no sense together.
    #[error("usage: {0}")]
    Usage(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<DateRangeError> for CliError {
    fn from(err: DateRangeError) -> Self {
        Self::Usage(err.to_string())
    }
}

impl CliError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            Self::Analysis(_) | Self::Other(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tserie_core::domain::DateRange;

    #[test]
    fn bad_dates_are_usage_errors() {
        let err: CliError = DateRange::parse("2017", Some("2012")).unwrap_err().into();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn analysis_failures_exit_one() {
        let err: CliError = AnalysisError::InstrumentCount {
            expected: 2,
            got: 3,
        }
        .into();
        assert_eq!(err.exit_code(), 1);
    }
}
