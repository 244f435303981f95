//! Ticker universe: parsing the configured list and tracking skipped tickers.

use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty ticker list")]
    Empty,

    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

/// Parse a comma-separated ticker list. Tickers are upper-cased; blanks and
/// duplicates are rejected.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    if input.trim().is_empty() {
        return Err(UniverseError::Empty);
    }

    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    FetchFailed(String),
    NoData,
    InvalidData(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FetchFailed(reason) => write!(f, "fetch failed: {}", reason),
            SkipReason::NoData => write!(f, "no data"),
            SkipReason::InvalidData(reason) => write!(f, "invalid data: {}", reason),
        }
    }
}
