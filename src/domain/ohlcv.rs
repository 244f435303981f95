//! Daily OHLCV bar representation.

use chrono::NaiveDate;

use super::error::SmacrossError;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Reject series the simulator cannot consume: non-positive or non-finite
/// closes, and dates that are not strictly ascending.
pub fn validate_series(ticker: &str, bars: &[OhlcvBar]) -> Result<(), SmacrossError> {
    for (i, bar) in bars.iter().enumerate() {
        if !bar.close.is_finite() || bar.close <= 0.0 {
            return Err(SmacrossError::InvalidBar {
                ticker: ticker.to_string(),
                date: bar.date,
                reason: format!("close must be positive, got {}", bar.close),
            });
        }
        if i > 0 && bars[i - 1].date >= bar.date {
            return Err(SmacrossError::InvalidBar {
                ticker: ticker.to_string(),
                date: bar.date,
                reason: format!("date not after previous bar {}", bars[i - 1].date),
            });
        }
    }
    Ok(())
}
