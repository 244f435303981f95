//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for smacross.
#[derive(Debug, thiserror::Error)]
pub enum SmacrossError {
    #[error("failed to fetch {ticker}: {reason}")]
    DataFetch { ticker: String, reason: String },

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error("insufficient history for {ticker}: have {bars} bars, need {minimum}")]
    InsufficientHistory {
        ticker: String,
        bars: usize,
        minimum: usize,
    },

    #[error("invalid bar for {ticker} on {date}: {reason}")]
    InvalidBar {
        ticker: String,
        date: NaiveDate,
        reason: String,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("failed to render chart for {ticker}: {reason}")]
    Render { ticker: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SmacrossError> for std::process::ExitCode {
    fn from(err: &SmacrossError) -> Self {
        let code: u8 = match err {
            SmacrossError::Io(_) | SmacrossError::Render { .. } => 1,
            SmacrossError::ConfigParse { .. }
            | SmacrossError::ConfigMissing { .. }
            | SmacrossError::ConfigInvalid { .. } => 2,
            SmacrossError::DataFetch { .. }
            | SmacrossError::NoData { .. }
            | SmacrossError::InsufficientHistory { .. }
            | SmacrossError::InvalidBar { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_ticker() {
        let err = SmacrossError::DataFetch {
            ticker: "MSFT".into(),
            reason: "connection refused".into(),
        };
        assert_eq!(err.to_string(), "failed to fetch MSFT: connection refused");
    }

    #[test]
    fn display_insufficient_history() {
        let err = SmacrossError::InsufficientHistory {
            ticker: "DFEN".into(),
            bars: 12,
            minimum: 50,
        };
        assert_eq!(
            err.to_string(),
            "insufficient history for DFEN: have 12 bars, need 50"
        );
    }
}
