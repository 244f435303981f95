//! Per-ticker result export port trait.

use std::path::PathBuf;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SmacrossError;

/// Port for persisting a computed backtest, e.g. as a frame table.
pub trait ReportPort {
    /// Write one ticker's result, returning the path written.
    fn write(&self, result: &BacktestResult) -> Result<PathBuf, SmacrossError>;
}
