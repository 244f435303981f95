//! Open position and completed round-trip trades.

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub size: f64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
}

impl Position {
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.size * (price - self.entry_price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Signal,
    StopLoss,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Signal => write!(f, "signal"),
            ExitReason::StopLoss => write!(f, "stop-loss"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub ticker: String,
    pub size: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub pnl: f64,
    pub reason: ExitReason,
}
